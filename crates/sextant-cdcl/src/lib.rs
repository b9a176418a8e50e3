//! # sextant-cdcl
//!
//! Conflict-Driven Clause Learning (CDCL) core algorithm.
//!
//! Implements:
//! - Assignment trail doubling as the implication graph
//! - Boolean Constraint Propagation (BCP) over two watched literals
//! - Conflict analysis with 1-UIP resolution
//! - Clause database management
//! - Decision phase with a random baseline or VSIDS

pub mod bcp;
pub mod clause_db;
pub mod conflict;
pub mod decision;
pub mod heuristics;
pub mod result;
pub mod solver;
pub mod trail;

pub use decision::HeuristicKind;
pub use heuristics::{Phase, VsidsConfig};
pub use result::{Model, SolveResult, SolveStatus};
pub use solver::{solve, CdclConfig, CdclSolver, SolverStats};
