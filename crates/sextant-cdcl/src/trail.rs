//! Assignment trail and implication graph bookkeeping.
//!
//! The trail is append-only between backjumps. Together with the per-variable
//! antecedent clause ids it *is* the implication graph: walking the trail
//! backwards visits implied literals after everything that implied them.

use sextant_base::{Lit, Var};

use crate::clause_db::ClauseId;

/// One assignment on the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailEntry {
    /// The literal made true.
    pub lit: Lit,
    /// Decision level the literal was assigned at.
    pub level: usize,
    /// The clause that forced the literal, `None` for a decision.
    pub reason: Option<ClauseId>,
}

/// Chronological record of all current assignments.
#[derive(Debug, Clone)]
pub struct Trail {
    /// Value of each variable (None = unassigned).
    values: Vec<Option<bool>>,
    /// For each variable, the decision level it was assigned at.
    levels: Vec<usize>,
    /// For each variable, the reason clause that implied it.
    reasons: Vec<Option<ClauseId>>,
    /// Assignments in order.
    entries: Vec<TrailEntry>,
    /// Trail position at the start of each decision level above 0.
    level_starts: Vec<usize>,
}

impl Trail {
    /// Creates an empty trail for `num_vars` variables.
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![None; num_vars],
            levels: vec![0; num_vars],
            reasons: vec![None; num_vars],
            entries: Vec::with_capacity(num_vars),
            level_starts: Vec::new(),
        }
    }

    /// Returns the number of variables.
    pub fn num_vars(&self) -> usize {
        self.values.len()
    }

    /// Returns the current decision level.
    pub fn decision_level(&self) -> usize {
        self.level_starts.len()
    }

    /// Opens a new decision level.
    pub fn new_decision_level(&mut self) {
        self.level_starts.push(self.entries.len());
    }

    /// Records an assignment at the current decision level.
    ///
    /// The variable must be unassigned.
    pub fn assign(&mut self, lit: Lit, reason: Option<ClauseId>) {
        let var = lit.var().index();
        debug_assert!(self.values[var].is_none(), "{lit} assigned twice");
        let level = self.decision_level();
        self.values[var] = Some(lit.is_positive());
        self.levels[var] = level;
        self.reasons[var] = reason;
        self.entries.push(TrailEntry { lit, level, reason });
    }

    /// Gets the value of a variable.
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Gets the value of a literal under the current assignment.
    #[inline]
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.var().index()].map(|v| lit.eval(v))
    }

    /// Gets the level of an assigned variable.
    pub fn level(&self, var: Var) -> usize {
        self.levels[var.index()]
    }

    /// Gets the reason for an assigned variable.
    pub fn reason(&self, var: Var) -> Option<ClauseId> {
        self.reasons[var.index()]
    }

    /// Returns the assignments in chronological order.
    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }

    /// Returns the number of assigned variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing is assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether every variable is assigned.
    pub fn is_complete(&self) -> bool {
        self.entries.len() == self.values.len()
    }

    /// Iterates over the unassigned variables in id order.
    pub fn unassigned(&self) -> impl Iterator<Item = Var> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| value.is_none())
            .map(|(i, _)| Var::from_index(i))
    }

    /// Undoes every assignment above `level` and returns the variables that
    /// became unassigned, most recent first. Assignments at or below `level`
    /// are untouched.
    pub fn backjump(&mut self, level: usize) -> Vec<Var> {
        if level >= self.decision_level() {
            return Vec::new();
        }
        let keep = self.level_starts[level];
        let mut undone = Vec::with_capacity(self.entries.len() - keep);
        while self.entries.len() > keep {
            if let Some(entry) = self.entries.pop() {
                let var = entry.lit.var();
                self.values[var.index()] = None;
                self.reasons[var.index()] = None;
                undone.push(var);
            }
        }
        self.level_starts.truncate(level);
        undone
    }

    /// Current values of all variables, unassigned ones as `false`.
    pub fn values(&self) -> Vec<bool> {
        self.values.iter().map(|v| v.unwrap_or(false)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i64) -> Lit {
        Lit::from_dimacs(x).unwrap()
    }

    #[test]
    fn test_assign_records_level_and_reason() {
        let mut trail = Trail::new(4);
        trail.assign(lit(1), Some(0));
        trail.new_decision_level();
        trail.assign(lit(-2), None);
        trail.assign(lit(3), Some(5));

        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.level(lit(1).var()), 0);
        assert_eq!(trail.level(lit(3).var()), 1);
        assert_eq!(trail.reason(lit(2).var()), None);
        assert_eq!(trail.reason(lit(3).var()), Some(5));
        assert_eq!(trail.lit_value(lit(2)), Some(false));
        assert_eq!(trail.lit_value(lit(-2)), Some(true));
        assert_eq!(trail.lit_value(lit(4)), None);
        assert!(!trail.is_complete());
    }

    #[test]
    fn test_backjump_undoes_only_higher_levels() {
        let mut trail = Trail::new(5);
        trail.assign(lit(1), Some(0));
        trail.new_decision_level();
        trail.assign(lit(2), None);
        trail.assign(lit(-3), Some(1));
        trail.new_decision_level();
        trail.assign(lit(4), None);
        trail.assign(lit(5), Some(2));

        let undone = trail.backjump(1);
        assert_eq!(undone.len(), 2);
        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.value(lit(4).var()), None);
        assert_eq!(trail.value(lit(5).var()), None);
        assert_eq!(trail.value(lit(3).var()), Some(false));
        assert_eq!(trail.reason(lit(3).var()), Some(1));
        assert_eq!(trail.len(), 3);

        let undone = trail.backjump(0);
        assert_eq!(undone, vec![lit(3).var(), lit(2).var()]);
        assert_eq!(trail.entries(), &[TrailEntry { lit: lit(1), level: 0, reason: Some(0) }]);
    }

    #[test]
    fn test_backjump_to_current_level_is_noop() {
        let mut trail = Trail::new(2);
        trail.new_decision_level();
        trail.assign(lit(1), None);
        assert!(trail.backjump(1).is_empty());
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_unassigned_in_id_order() {
        let mut trail = Trail::new(4);
        trail.assign(lit(2), None);
        let free: Vec<u32> = trail.unassigned().map(Var::id).collect();
        assert_eq!(free, vec![1, 3, 4]);
    }
}
