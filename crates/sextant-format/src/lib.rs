//! # sextant-format
//!
//! File format parsing and serialization for sextant.
//!
//! Supports:
//! - **DIMACS CNF**: Standard SAT competition format, including the SATLIB
//!   `%` end marker

pub mod dimacs;

pub use dimacs::DimacsCnf;
