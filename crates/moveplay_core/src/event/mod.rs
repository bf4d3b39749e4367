//! Runtime event relay.

pub mod bridge;
