//! Conflict analysis with 1-UIP resolution.

use sextant_base::{Error, Lit, Result, Var};

use crate::clause_db::{ClauseDatabase, ClauseId};
use crate::trail::Trail;

/// Outcome of analyzing one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// The learned clause. Position 0 holds the asserting literal (the
    /// negated 1-UIP); position 1 holds a literal of the backjump level.
    pub learned: Vec<Lit>,
    /// Decision level to backjump to.
    pub backjump_level: usize,
    /// Every variable met during the resolution walk.
    pub involved: Vec<Var>,
}

/// Conflict analyzer.
#[derive(Debug, Clone)]
pub struct ConflictAnalyzer {
    /// Seen flags for variables.
    seen: Vec<bool>,
}

impl ConflictAnalyzer {
    /// Creates a new conflict analyzer.
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: vec![false; num_vars],
        }
    }

    /// Derives the 1-UIP learned clause for a falsified clause.
    ///
    /// Starting from the conflicting clause, the literal of the current level
    /// assigned last is resolved away against its antecedent until a single
    /// current-level literal remains. Level-0 literals are dropped since they
    /// are false in every model of the formula.
    ///
    /// Must not be called at decision level 0: a conflict there means UNSAT.
    pub fn analyze(
        &mut self,
        conflict: ClauseId,
        clauses: &ClauseDatabase,
        trail: &Trail,
    ) -> Result<Analysis> {
        let current_level = trail.decision_level();
        if current_level == 0 {
            return Err(Error::InvariantViolation(
                "conflict analysis requested at decision level 0".into(),
            ));
        }

        // Literals of lower levels; the asserting literal is prepended at the end
        let mut lower: Vec<Lit> = Vec::new();
        let mut involved = Vec::new();
        let mut pending = 0usize;
        let mut clause = conflict;
        let mut resolved: Option<Lit> = None;
        let mut index = trail.len();

        let uip = loop {
            for &lit in &clauses[clause] {
                if Some(lit) == resolved {
                    continue;
                }
                let var = lit.var();
                if trail.value(var).is_none() {
                    self.clear(&involved);
                    return Err(Error::InvariantViolation(format!(
                        "clause {clause} in the resolution walk has unassigned literal {lit}"
                    )));
                }
                if self.seen[var.index()] || trail.level(var) == 0 {
                    continue;
                }
                self.seen[var.index()] = true;
                involved.push(var);
                if trail.level(var) == current_level {
                    pending += 1;
                } else {
                    lower.push(lit);
                }
            }

            if pending == 0 {
                self.clear(&involved);
                return Err(Error::InvariantViolation(format!(
                    "clause {clause} has no literal at the conflict level"
                )));
            }

            // Next marked literal of the current level, walking back
            let entry = loop {
                if index == 0 {
                    self.clear(&involved);
                    return Err(Error::InvariantViolation(
                        "trail exhausted before reaching the first UIP".into(),
                    ));
                }
                index -= 1;
                let entry = trail.entries()[index];
                if self.seen[entry.lit.var().index()] {
                    break entry;
                }
            };

            self.seen[entry.lit.var().index()] = false;
            pending -= 1;
            if pending == 0 {
                break entry.lit;
            }
            clause = match entry.reason {
                Some(reason) => reason,
                None => {
                    self.clear(&involved);
                    return Err(Error::InvariantViolation(format!(
                        "decision {} reached with {} current-level literals left",
                        entry.lit, pending
                    )));
                }
            };
            resolved = Some(entry.lit);
        };
        self.clear(&involved);

        let mut learned = Vec::with_capacity(lower.len() + 1);
        learned.push(!uip);
        learned.extend(lower);

        // Move the literal with the highest remaining level to position 1
        let backjump_level = match (1..learned.len()).max_by_key(|&i| trail.level(learned[i].var())) {
            Some(i) => {
                learned.swap(1, i);
                trail.level(learned[1].var())
            }
            None => 0,
        };

        Ok(Analysis {
            learned,
            backjump_level,
            involved,
        })
    }

    /// Resets the seen flags of every variable marked during a walk.
    fn clear(&mut self, involved: &[Var]) {
        for var in involved {
            self.seen[var.index()] = false;
        }
    }
}
