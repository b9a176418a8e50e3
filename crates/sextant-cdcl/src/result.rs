//! Solve outcomes and model extraction.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sextant_base::{Formula, Var};
use std::fmt;

use crate::solver::SolverStats;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    /// A satisfying assignment was found.
    Sat,
    /// A conflict occurred at decision level 0.
    Unsat,
    /// The time budget ran out first.
    Timeout,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sat => "SAT",
            Self::Unsat => "UNSAT",
            Self::Timeout => "TIMEOUT",
        })
    }
}

/// A satisfying model: one value per variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Values indexed by variable index.
    values: Vec<bool>,
}

impl Model {
    /// Creates a model from values indexed by variable index.
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Gets the value of a variable.
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values.get(var.index()).copied()
    }

    /// Iterates over `(variable, value)` pairs in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &value)| (Var::from_index(i), value))
    }

    /// Returns the model as DIMACS literals (`v` line body without the 0).
    pub fn to_dimacs(&self) -> Vec<i64> {
        self.iter().map(|(var, value)| var.lit(value).to_dimacs()).collect()
    }

    /// Returns whether the model satisfies every clause of `formula`.
    pub fn satisfies(&self, formula: &Formula) -> bool {
        formula.evaluate(|var| self.value(var).unwrap_or(false))
    }

    /// Returns the number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the model is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (var, value) in self.iter() {
            map.serialize_entry(&var.id(), &value)?;
        }
        map.end()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (var, value) in self.iter() {
            writeln!(f, "  {var} = {value}")?;
        }
        Ok(())
    }
}

/// Everything a caller learns from one solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    /// Terminal state.
    pub status: SolveStatus,
    /// Wall-clock time spent in the solve.
    pub runtime_sec: f64,
    /// The model, present iff `status` is SAT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Model>,
    /// Search statistics.
    pub stats: SolverStats,
}
