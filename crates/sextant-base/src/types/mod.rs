//! Type system for sextant variables and literals.
//!
//! Variables are 1-based as in DIMACS. Literals are signed variable ids;
//! both expose a dense 0-based `index()` for table lookups.

mod literal;

pub use literal::{Lit, Var};
