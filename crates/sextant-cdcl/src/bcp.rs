//! Boolean Constraint Propagation (BCP).
//!
//! Uses watched literals for efficient propagation.

use sextant_base::Lit;

use crate::clause_db::{ClauseDatabase, ClauseId};
use crate::solver::SolverStats;
use crate::trail::Trail;

/// Result of BCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcpResult {
    /// No conflict, propagation complete.
    Ok,
    /// Conflict detected in the given clause.
    Conflict(ClauseId),
}

/// A watched literal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    /// The clause being watched.
    pub clause_id: ClauseId,
    /// Another literal of the clause; if it is true the clause is satisfied.
    pub blocker: Lit,
}

/// Watched literal data structure.
#[derive(Debug, Clone)]
pub struct WatchedLiterals {
    /// For each literal, the clauses to inspect when it becomes false.
    watches: Vec<Vec<Watch>>,
}

impl WatchedLiterals {
    /// Creates a new watched literals structure.
    pub fn new(num_vars: usize) -> Self {
        // 2 * num_vars for positive and negative literals
        Self {
            watches: vec![Vec::new(); num_vars * 2],
        }
    }

    /// Adds a watch for a literal.
    pub fn add_watch(&mut self, lit: Lit, clause_id: ClauseId, blocker: Lit) {
        self.watches[lit.index()].push(Watch { clause_id, blocker });
    }

    /// Gets watches for a literal.
    pub fn get_watches(&self, lit: Lit) -> &[Watch] {
        &self.watches[lit.index()]
    }

    /// Gets mutable watches for a literal.
    pub fn get_watches_mut(&mut self, lit: Lit) -> &mut Vec<Watch> {
        &mut self.watches[lit.index()]
    }
}

/// Propagation queue.
#[derive(Debug, Clone, Default)]
pub struct PropagationQueue {
    queue: Vec<Lit>,
    head: usize,
}

impl PropagationQueue {
    /// Creates a new propagation queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a literal for propagation.
    pub fn enqueue(&mut self, lit: Lit) {
        self.queue.push(lit);
    }

    /// Dequeues the next literal.
    pub fn dequeue(&mut self) -> Option<Lit> {
        let lit = self.queue.get(self.head).copied()?;
        self.head += 1;
        Some(lit)
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.head >= self.queue.len()
    }

    /// Clears the queue.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.head = 0;
    }
}

/// Unit propagation over the watch index.
#[derive(Debug, Clone)]
pub struct Propagator {
    watches: WatchedLiterals,
    queue: PropagationQueue,
    /// A root-level conflict found while asserting a unit clause.
    pending_conflict: Option<ClauseId>,
}

impl Propagator {
    /// Creates a propagator for `num_vars` variables.
    pub fn new(num_vars: usize) -> Self {
        Self {
            watches: WatchedLiterals::new(num_vars),
            queue: PropagationQueue::new(),
            pending_conflict: None,
        }
    }

    /// Returns the watch index.
    pub fn watches(&self) -> &WatchedLiterals {
        &self.watches
    }

    /// Registers the watches of a clause: its first two literals, or its
    /// single literal for a unit clause.
    pub fn watch_clause(&mut self, clause_id: ClauseId, literals: &[Lit]) {
        match *literals {
            [] => {}
            [only] => self.watches.add_watch(only, clause_id, only),
            [first, second, ..] => {
                self.watches.add_watch(first, clause_id, second);
                self.watches.add_watch(second, clause_id, first);
            }
        }
    }

    /// Assigns `lit` with the given reason and queues it for propagation.
    pub fn enqueue(&mut self, trail: &mut Trail, lit: Lit, reason: Option<ClauseId>) {
        trail.assign(lit, reason);
        self.queue.enqueue(lit);
    }

    /// Asserts an original unit clause at level 0.
    ///
    /// A unit that is already satisfied is ignored; one that is already
    /// falsified is reported as a conflict by the next [`Self::propagate`].
    /// Returns whether a new assignment was made.
    pub fn assert_unit(&mut self, trail: &mut Trail, clause_id: ClauseId, lit: Lit) -> bool {
        match trail.lit_value(lit) {
            None => {
                self.enqueue(trail, lit, Some(clause_id));
                true
            }
            Some(true) => false,
            Some(false) => {
                self.pending_conflict.get_or_insert(clause_id);
                false
            }
        }
    }

    /// Drops queued literals. Called after a backjump, when the remaining
    /// queue refers to assignments that no longer exist.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Propagates every queued literal until fixpoint or conflict.
    pub fn propagate(
        &mut self,
        clauses: &mut ClauseDatabase,
        trail: &mut Trail,
        stats: &mut SolverStats,
    ) -> BcpResult {
        if let Some(conflict) = self.pending_conflict.take() {
            self.queue.clear();
            return BcpResult::Conflict(conflict);
        }

        while let Some(p) = self.queue.dequeue() {
            if let Some(conflict) = self.propagate_literal(!p, clauses, trail, stats) {
                self.queue.clear();
                return BcpResult::Conflict(conflict);
            }
        }
        self.queue.clear();
        BcpResult::Ok
    }

    /// Visits the clauses watching `false_lit`, which has just become false.
    fn propagate_literal(
        &mut self,
        false_lit: Lit,
        clauses: &mut ClauseDatabase,
        trail: &mut Trail,
        stats: &mut SolverStats,
    ) -> Option<ClauseId> {
        let mut ws = std::mem::take(self.watches.get_watches_mut(false_lit));
        let mut conflict = None;
        let mut i = 0;
        let mut j = 0;

        while i < ws.len() {
            let watch = ws[i];
            i += 1;

            if trail.lit_value(watch.blocker) == Some(true) {
                ws[j] = watch;
                j += 1;
                continue;
            }

            let clause_id = watch.clause_id;
            let lits = clauses.literals_mut(clause_id);

            if lits.len() == 1 {
                ws[j] = watch;
                j += 1;
                conflict = Some(clause_id);
                break;
            }

            // Keep the false literal at position 1
            if lits[0] == false_lit {
                lits.swap(0, 1);
            }
            let first = lits[0];
            let kept = Watch {
                clause_id,
                blocker: first,
            };
            if first != watch.blocker && trail.lit_value(first) == Some(true) {
                ws[j] = kept;
                j += 1;
                continue;
            }

            // Look for a new literal to watch
            let replacement = (2..lits.len()).find(|&k| trail.lit_value(lits[k]) != Some(false));
            if let Some(k) = replacement {
                lits.swap(1, k);
                let new_watch = lits[1];
                self.watches.add_watch(new_watch, clause_id, first);
                continue;
            }

            ws[j] = kept;
            j += 1;
            match trail.lit_value(first) {
                Some(false) => {
                    conflict = Some(clause_id);
                    break;
                }
                Some(true) => {}
                None => {
                    self.enqueue(trail, first, Some(clause_id));
                    stats.propagations += 1;
                }
            }
        }

        // Keep the watches not yet visited when a conflict cut the scan short
        while i < ws.len() {
            ws[j] = ws[i];
            i += 1;
            j += 1;
        }
        ws.truncate(j);
        *self.watches.get_watches_mut(false_lit) = ws;
        conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(x: i64) -> Lit {
        Lit::from_dimacs(x).unwrap()
    }

    fn lits(xs: &[i64]) -> Vec<Lit> {
        xs.iter().map(|&x| lit(x)).collect()
    }

    fn setup(num_vars: usize, clauses: &[&[i64]]) -> (Propagator, ClauseDatabase, Trail) {
        let mut db = ClauseDatabase::new();
        let mut prop = Propagator::new(num_vars);
        for clause in clauses {
            let id = db.add_original(lits(clause));
            prop.watch_clause(id, &db[id]);
        }
        (prop, db, Trail::new(num_vars))
    }

    /// Every clause of length >= 2 is watched exactly on its first two literals.
    fn assert_watch_invariant(prop: &Propagator, db: &ClauseDatabase, num_vars: usize) {
        for id in 0..db.len() {
            let clause = &db[id];
            let mut watched = Vec::new();
            for v in 1..=num_vars as i64 {
                for l in [lit(v), lit(-v)] {
                    let n = prop
                        .watches()
                        .get_watches(l)
                        .iter()
                        .filter(|w| w.clause_id == id)
                        .count();
                    for _ in 0..n {
                        watched.push(l);
                    }
                }
            }
            watched.sort();
            let mut expected: Vec<Lit> = clause.iter().take(2).copied().collect();
            expected.sort();
            assert_eq!(watched, expected, "clause {id} watches");
        }
    }

    #[test]
    fn test_prop_queue_basic() {
        let mut queue = PropagationQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(lit(1));
        queue.enqueue(lit(-2));

        assert!(!queue.is_empty());
        assert_eq!(queue.dequeue(), Some(lit(1)));
        assert_eq!(queue.dequeue(), Some(lit(-2)));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());

        queue.enqueue(lit(3));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_watched_literals_add_and_get() {
        let mut watches = WatchedLiterals::new(10);

        watches.add_watch(lit(1), 0, lit(2));
        watches.add_watch(lit(1), 1, lit(-3));
        watches.add_watch(lit(-1), 2, lit(4));

        let pos_watches = watches.get_watches(lit(1));
        assert_eq!(pos_watches.len(), 2);
        assert_eq!(pos_watches[0].clause_id, 0);
        assert_eq!(pos_watches[0].blocker, lit(2));

        let neg_watches = watches.get_watches(lit(-1));
        assert_eq!(neg_watches.len(), 1);
        assert_eq!(neg_watches[0].clause_id, 2);
        assert!(watches.get_watches(lit(-5)).is_empty());
    }

    #[test]
    fn test_propagate_chain_to_fixpoint() {
        let (mut prop, mut db, mut trail) = setup(4, &[&[-1, 2], &[-2, 3], &[-3, 4]]);
        let mut stats = SolverStats::default();

        trail.new_decision_level();
        prop.enqueue(&mut trail, lit(1), None);
        assert_eq!(prop.propagate(&mut db, &mut trail, &mut stats), BcpResult::Ok);

        assert_eq!(trail.value(lit(4).var()), Some(true));
        assert_eq!(trail.reason(lit(3).var()), Some(1));
        assert_eq!(trail.level(lit(4).var()), 1);
        assert_eq!(stats.propagations, 3);
        assert_watch_invariant(&prop, &db, 4);
    }

    #[test]
    fn test_propagate_detects_conflict() {
        let (mut prop, mut db, mut trail) = setup(3, &[&[-1, 2], &[-1, 3], &[-2, -3]]);
        let mut stats = SolverStats::default();

        trail.new_decision_level();
        prop.enqueue(&mut trail, lit(1), None);
        match prop.propagate(&mut db, &mut trail, &mut stats) {
            BcpResult::Conflict(id) => {
                assert!(db[id].iter().all(|&l| trail.lit_value(l) == Some(false)));
            }
            BcpResult::Ok => panic!("expected a conflict"),
        }
        assert_watch_invariant(&prop, &db, 3);
    }

    #[test]
    fn test_watch_moves_to_unassigned_literal() {
        let (mut prop, mut db, mut trail) = setup(4, &[&[1, 2, 3, 4]]);
        let mut stats = SolverStats::default();

        trail.new_decision_level();
        prop.enqueue(&mut trail, lit(-1), None);
        assert_eq!(prop.propagate(&mut db, &mut trail, &mut stats), BcpResult::Ok);
        assert_eq!(stats.propagations, 0);
        assert!(prop.watches().get_watches(lit(1)).is_empty());
        assert_watch_invariant(&prop, &db, 4);

        prop.enqueue(&mut trail, lit(-2), None);
        prop.enqueue(&mut trail, lit(-3), None);
        assert_eq!(prop.propagate(&mut db, &mut trail, &mut stats), BcpResult::Ok);
        assert_eq!(trail.value(lit(4).var()), Some(true));
        assert_watch_invariant(&prop, &db, 4);
    }

    #[test]
    fn test_satisfied_clause_is_skipped() {
        let (mut prop, mut db, mut trail) = setup(3, &[&[1, 2, 3]]);
        let mut stats = SolverStats::default();

        trail.new_decision_level();
        prop.enqueue(&mut trail, lit(3), None);
        prop.enqueue(&mut trail, lit(-1), None);
        prop.enqueue(&mut trail, lit(-2), None);
        assert_eq!(prop.propagate(&mut db, &mut trail, &mut stats), BcpResult::Ok);
        assert_eq!(stats.propagations, 0);
    }

    #[test]
    fn test_falsified_unit_is_a_pending_conflict() {
        let (mut prop, mut db, mut trail) = setup(1, &[&[1], &[-1]]);
        let mut stats = SolverStats::default();

        assert!(prop.assert_unit(&mut trail, 0, lit(1)));
        assert!(!prop.assert_unit(&mut trail, 1, lit(-1)));
        assert_eq!(
            prop.propagate(&mut db, &mut trail, &mut stats),
            BcpResult::Conflict(1)
        );
    }

    #[test]
    fn test_unit_clause_watch_fires_on_falsification() {
        let (mut prop, mut db, mut trail) = setup(2, &[&[2]]);
        let mut stats = SolverStats::default();

        prop.enqueue(&mut trail, lit(-2), None);
        assert_eq!(
            prop.propagate(&mut db, &mut trail, &mut stats),
            BcpResult::Conflict(0)
        );
        assert_eq!(prop.watches().get_watches(lit(2)).len(), 1);
    }
}
