//! CLI command implementations.

pub mod plan;
pub mod status;
pub mod sync;
