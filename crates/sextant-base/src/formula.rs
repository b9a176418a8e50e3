//! The immutable solver input.

use crate::error::{Error, Result};
use crate::types::{Lit, Var};

/// A CNF formula: a variable count and an ordered list of clauses.
///
/// A `Formula` can only be built through [`Formula::new`], which checks that
/// every clause is non-empty and every literal is in `1..=num_vars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    num_vars: usize,
    clauses: Vec<Vec<Lit>>,
}

impl Formula {
    /// Builds a formula from DIMACS-style clauses.
    pub fn new(num_vars: usize, clauses: Vec<Vec<i64>>) -> Result<Self> {
        if num_vars == 0 {
            return Err(Error::ZeroVariables);
        }
        if num_vars > i32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "variable count {num_vars} exceeds the supported maximum"
            )));
        }

        let clauses = clauses
            .into_iter()
            .enumerate()
            .map(|(index, clause)| {
                if clause.is_empty() {
                    return Err(Error::EmptyClause { index });
                }
                clause
                    .into_iter()
                    .map(|raw| {
                        Lit::from_dimacs(raw)
                            .filter(|lit| lit.var().index() < num_vars)
                            .ok_or(Error::InvalidLiteral {
                                literal: raw,
                                num_vars,
                            })
                    })
                    .collect()
            })
            .collect::<Result<Vec<Vec<Lit>>>>()?;

        Ok(Self { num_vars, clauses })
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Returns the clauses in input order.
    #[must_use]
    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// Iterates over all variables `1..=num_vars`.
    pub fn vars(&self) -> impl Iterator<Item = Var> {
        (0..self.num_vars).map(Var::from_index)
    }

    /// Returns whether every clause holds under the given valuation.
    pub fn evaluate<F>(&self, value: F) -> bool
    where
        F: Fn(Var) -> bool,
    {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|&lit| lit.eval(value(lit.var()))))
    }
}
