//! # sextant-base
//!
//! Core types and utilities for the sextant SAT solver.
//!
//! This crate provides the foundational building blocks used across all other
//! sextant crates, including:
//!
//! - **Types**: variables, literals and the validated input [`Formula`]
//! - **Error Types**: unified error handling across the solver
//! - **Utilities**: a seeded PRNG for reproducible randomized decisions

pub mod error;
pub mod formula;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use formula::Formula;
pub use types::{Lit, Var};
