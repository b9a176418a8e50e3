//! Subcommand implementations.

pub mod batch;
pub mod solve;
