//! Domain model for projects, filesystem nodes and runtime events.
//!
//! # Responsibility
//! - Define the shapes exchanged with the Runtime.
//! - Keep tree lookups pure so they never cross the Runtime boundary.
//!
//! # Invariants
//! - Node ids are unique within one project; project ids are unique per registry.
//! - Sibling names are unique within one directory.

pub mod event;
pub mod node;
pub mod project;
