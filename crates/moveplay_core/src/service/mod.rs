//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate Runtime calls into project-level APIs.
//! - Keep host layers decoupled from Runtime storage details.

pub mod project;
pub mod registry;
pub mod vfs;
