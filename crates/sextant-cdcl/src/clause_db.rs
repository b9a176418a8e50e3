//! Clause database management.

use sextant_base::Lit;
use std::ops::Index;

/// Stable index of a clause in the database.
pub type ClauseId = usize;

/// A clause stored in the database.
#[derive(Debug, Clone)]
pub struct StoredClause {
    /// Literals in the clause. Positions 0 and 1 are the watched literals.
    pub literals: Vec<Lit>,
    /// Whether this is a learned clause.
    pub learned: bool,
}

/// Append-only database of original and learned clauses.
///
/// Clause ids are never reused or invalidated during a solve.
#[derive(Debug, Clone, Default)]
pub struct ClauseDatabase {
    /// All clauses.
    clauses: Vec<StoredClause>,
    /// Number of original clauses.
    num_original: usize,
}

impl ClauseDatabase {
    /// Creates a new empty clause database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an original clause.
    pub fn add_original(&mut self, literals: Vec<Lit>) -> ClauseId {
        self.num_original += 1;
        self.push(literals, false)
    }

    /// Adds a learned clause. The asserting literal must be at position 0 and
    /// the literal with the highest remaining decision level at position 1.
    pub fn add_learned(&mut self, literals: Vec<Lit>) -> ClauseId {
        self.push(literals, true)
    }

    fn push(&mut self, literals: Vec<Lit>, learned: bool) -> ClauseId {
        debug_assert!(!literals.is_empty());
        self.clauses.push(StoredClause { literals, learned });
        self.clauses.len() - 1
    }

    /// Gets a clause by ID.
    pub fn get(&self, id: ClauseId) -> Option<&StoredClause> {
        self.clauses.get(id)
    }

    /// Gets the literals of a clause for reordering its watches.
    pub(crate) fn literals_mut(&mut self, id: ClauseId) -> &mut [Lit] {
        &mut self.clauses[id].literals
    }

    /// Iterates over learned clauses in the order they were learned.
    pub fn learned(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses[self.num_original..]
            .iter()
            .map(|c| c.literals.as_slice())
    }

    /// Returns the number of original clauses.
    pub fn num_original(&self) -> usize {
        self.num_original
    }

    /// Returns the number of learned clauses.
    pub fn num_learned(&self) -> usize {
        self.clauses.len() - self.num_original
    }

    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl Index<ClauseId> for ClauseDatabase {
    type Output = [Lit];

    fn index(&self, id: ClauseId) -> &[Lit] {
        &self.clauses[id].literals
    }
}
