//! Decision heuristics (random baseline, VSIDS).

use serde::{Deserialize, Serialize};
use sextant_base::utils::XorShift64;
use sextant_base::{Error, Lit, Result, Var};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use crate::trail::Trail;

/// The capability the driver needs from a decision heuristic.
pub trait BranchingHeuristic {
    /// Picks the next decision literal. Returns `None` iff every variable is
    /// assigned.
    fn decide(&mut self, trail: &Trail) -> Option<Lit>;

    /// Called once per conflict with the variables of the resolution trace.
    fn on_conflict(&mut self, involved: &[Var]);

    /// Called after a backjump with the variables that became unassigned.
    fn on_backjump(&mut self, _unassigned: &[Var]) {}
}

/// Polarity policy for VSIDS decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Always try `true` first.
    #[default]
    Positive,
    /// Always try `false` first.
    Negative,
    /// Draw the polarity from the seeded PRNG.
    Random,
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "true" => Ok(Self::Positive),
            "negative" | "false" => Ok(Self::Negative),
            "random" => Ok(Self::Random),
            other => Err(Error::InvalidConfig(format!("unknown phase: {other}"))),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Random => "random",
        })
    }
}

/// Baseline: an unassigned variable and a polarity, both uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomBaseline {
    rng: XorShift64,
    /// Scratch buffer of candidate variables.
    candidates: Vec<Var>,
}

impl RandomBaseline {
    /// Creates the baseline heuristic with its own seeded generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShift64::new(seed),
            candidates: Vec::new(),
        }
    }
}

impl BranchingHeuristic for RandomBaseline {
    fn decide(&mut self, trail: &Trail) -> Option<Lit> {
        self.candidates.clear();
        self.candidates.extend(trail.unassigned());
        if self.candidates.is_empty() {
            return None;
        }
        let var = self.candidates[self.rng.next_index(self.candidates.len())];
        Some(var.lit(self.rng.next_bool()))
    }

    fn on_conflict(&mut self, _involved: &[Var]) {}
}

/// Configuration for VSIDS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VsidsConfig {
    /// Additive increment per conflict involvement.
    pub bump: f64,
    /// Multiplicative decay in (0, 1).
    pub decay_factor: f64,
    /// Conflicts between decays; 0 disables decay.
    pub decay_period: u64,
    /// Polarity policy.
    pub phase: Phase,
}

impl Default for VsidsConfig {
    fn default() -> Self {
        Self {
            bump: 1.0,
            decay_factor: 0.95,
            decay_period: 50,
            phase: Phase::Positive,
        }
    }
}

impl VsidsConfig {
    /// Checks the knobs are in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.bump.is_finite() && self.bump >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "vsids bump must be a finite non-negative number, got {}",
                self.bump
            )));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "vsids decay factor must be in (0, 1), got {}",
                self.decay_factor
            )));
        }
        Ok(())
    }
}

/// VSIDS (Variable State Independent Decaying Sum) scores.
#[derive(Debug, Clone)]
pub struct VsidsScores {
    /// Activity score for each variable.
    scores: Vec<f64>,
    /// Increment added per bump.
    bump: f64,
    /// Decay factor.
    decay_factor: f64,
}

impl VsidsScores {
    /// Creates new VSIDS scores, all zero.
    pub fn new(num_vars: usize, bump: f64, decay_factor: f64) -> Self {
        Self {
            scores: vec![0.0; num_vars],
            bump,
            decay_factor,
        }
    }

    /// Bumps the activity of a variable.
    pub fn bump(&mut self, var: Var) {
        self.scores[var.index()] += self.bump;
    }

    /// Decays all activities.
    pub fn decay(&mut self) {
        for score in &mut self.scores {
            *score *= self.decay_factor;
        }
    }

    /// Gets the score for a variable.
    pub fn score(&self, var: Var) -> f64 {
        self.scores[var.index()]
    }
}

/// A variable with its score for the priority queue.
#[derive(Debug, Clone, Copy)]
struct VarScore {
    var: Var,
    score: f64,
}

impl PartialEq for VarScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VarScore {}

impl Ord for VarScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on score, ties go to the lowest variable id
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.var.cmp(&self.var))
    }
}

impl PartialOrd for VarScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// VSIDS decision heuristic.
///
/// The priority queue is lazy: bumps push fresh entries, and entries whose
/// score no longer matches the activity table or whose variable is assigned
/// are discarded when they reach the top.
#[derive(Debug, Clone)]
pub struct Vsids {
    scores: VsidsScores,
    queue: BinaryHeap<VarScore>,
    decay_period: u64,
    conflicts: u64,
    phase: Phase,
    rng: XorShift64,
}

impl Vsids {
    /// Creates the heuristic with every activity at zero.
    pub fn new(num_vars: usize, config: &VsidsConfig, seed: u64) -> Self {
        let mut vsids = Self {
            scores: VsidsScores::new(num_vars, config.bump, config.decay_factor),
            queue: BinaryHeap::with_capacity(num_vars),
            decay_period: config.decay_period,
            conflicts: 0,
            phase: config.phase,
            rng: XorShift64::new(seed),
        };
        vsids.rebuild_queue((0..num_vars).map(Var::from_index));
        vsids
    }

    /// Returns the activity table.
    pub fn scores(&self) -> &VsidsScores {
        &self.scores
    }

    fn push(&mut self, var: Var) {
        self.queue.push(VarScore {
            var,
            score: self.scores.score(var),
        });
    }

    /// Replaces the queue with one fresh entry per distinct variable.
    fn rebuild_queue(&mut self, vars: impl Iterator<Item = Var>) {
        let mut vars: Vec<Var> = vars.collect();
        vars.sort_unstable();
        vars.dedup();
        let entries: Vec<VarScore> = vars
            .into_iter()
            .map(|var| VarScore {
                var,
                score: self.scores.score(var),
            })
            .collect();
        self.queue = BinaryHeap::from(entries);
    }

    fn polarity(&mut self) -> bool {
        match self.phase {
            Phase::Positive => true,
            Phase::Negative => false,
            Phase::Random => self.rng.next_bool(),
        }
    }
}

impl BranchingHeuristic for Vsids {
    fn decide(&mut self, trail: &Trail) -> Option<Lit> {
        while let Some(top) = self.queue.pop() {
            if trail.value(top.var).is_some() || top.score != self.scores.score(top.var) {
                continue;
            }
            let positive = self.polarity();
            return Some(top.var.lit(positive));
        }
        // Every unassigned variable always has a live entry, so an empty
        // queue means a complete assignment.
        debug_assert!(trail.is_complete());
        None
    }

    fn on_conflict(&mut self, involved: &[Var]) {
        for &var in involved {
            self.scores.bump(var);
            self.push(var);
        }
        self.conflicts += 1;
        let decay_due = self.decay_period > 0 && self.conflicts % self.decay_period == 0;
        if decay_due {
            self.scores.decay();
        }
        // Decay invalidates every queued score; without decay, stale entries
        // still pile up and are compacted away
        if decay_due || self.queue.len() > 4 * self.scores.scores.len().max(16) {
            let queued: Vec<Var> = self.queue.iter().map(|e| e.var).collect();
            self.rebuild_queue(queued.into_iter());
        }
    }

    fn on_backjump(&mut self, unassigned: &[Var]) {
        for &var in unassigned {
            self.push(var);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> Var {
        Var::new(id).unwrap()
    }

    #[test]
    fn test_vsids_bump_and_decay() {
        let mut vsids = VsidsScores::new(10, 1.0, 0.5);

        assert_eq!(vsids.score(var(1)), 0.0);
        vsids.bump(var(3));
        vsids.bump(var(3));
        vsids.bump(var(4));
        assert_eq!(vsids.score(var(3)), 2.0);

        vsids.decay();
        assert_eq!(vsids.score(var(3)), 1.0);
        assert_eq!(vsids.score(var(4)), 0.5);
        assert!(vsids.score(var(3)) > vsids.score(var(4)));
        assert_eq!(vsids.score(var(1)), 0.0);
    }

    #[test]
    fn test_vsids_picks_highest_then_lowest_id() {
        let trail = Trail::new(4);
        let mut vsids = Vsids::new(4, &VsidsConfig::default(), 0);

        // All zero: lowest id wins
        assert_eq!(vsids.decide(&trail), Some(var(1).pos()));

        let mut vsids = Vsids::new(4, &VsidsConfig::default(), 0);
        vsids.on_conflict(&[var(3), var(2)]);
        vsids.on_conflict(&[var(3)]);
        assert_eq!(vsids.decide(&trail), Some(var(3).pos()));
        assert_eq!(vsids.decide(&trail), Some(var(2).pos()));
    }

    #[test]
    fn test_vsids_skips_assigned_and_reinserts_after_backjump() {
        let mut trail = Trail::new(3);
        let mut vsids = Vsids::new(3, &VsidsConfig::default(), 0);
        vsids.on_conflict(&[var(2)]);

        trail.new_decision_level();
        let first = vsids.decide(&trail).unwrap();
        assert_eq!(first, var(2).pos());
        trail.assign(first, None);
        trail.assign(var(1).neg(), Some(0));

        assert_eq!(vsids.decide(&trail), Some(var(3).pos()));
        trail.assign(var(3).pos(), None);
        assert_eq!(vsids.decide(&trail), None);

        let undone = trail.backjump(0);
        vsids.on_backjump(&undone);
        assert_eq!(vsids.decide(&trail), Some(var(2).pos()));
    }

    #[test]
    fn test_vsids_decay_period() {
        let config = VsidsConfig {
            bump: 1.0,
            decay_factor: 0.5,
            decay_period: 2,
            phase: Phase::Positive,
        };
        let mut vsids = Vsids::new(2, &config, 0);
        vsids.on_conflict(&[var(1)]);
        assert_eq!(vsids.scores().score(var(1)), 1.0);
        vsids.on_conflict(&[var(1)]);
        assert_eq!(vsids.scores().score(var(1)), 1.0);
        vsids.on_conflict(&[var(2)]);
        assert_eq!(vsids.scores().score(var(2)), 1.0);

        let trail = Trail::new(2);
        assert_eq!(vsids.decide(&trail), Some(var(1).pos()));
    }

    #[test]
    fn test_vsids_negative_phase() {
        let config = VsidsConfig {
            phase: Phase::Negative,
            ..VsidsConfig::default()
        };
        let mut vsids = Vsids::new(2, &config, 0);
        assert_eq!(vsids.decide(&Trail::new(2)), Some(var(1).neg()));
    }

    #[test]
    fn test_baseline_only_picks_unassigned() {
        let mut trail = Trail::new(5);
        trail.assign(var(1).pos(), None);
        trail.assign(var(2).neg(), None);
        trail.assign(var(4).pos(), None);

        let mut baseline = RandomBaseline::new(42);
        for _ in 0..50 {
            let lit = baseline.decide(&trail).unwrap();
            assert!(lit.var() == var(3) || lit.var() == var(5));
        }
        trail.assign(var(3).pos(), None);
        trail.assign(var(5).pos(), None);
        assert_eq!(baseline.decide(&trail), None);
    }

    #[test]
    fn test_baseline_is_seeded() {
        let trail = Trail::new(20);
        let mut a = RandomBaseline::new(9);
        let mut b = RandomBaseline::new(9);
        for _ in 0..20 {
            assert_eq!(a.decide(&trail), b.decide(&trail));
        }
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("Positive".parse::<Phase>().unwrap(), Phase::Positive);
        assert_eq!("random".parse::<Phase>().unwrap(), Phase::Random);
        assert!("sideways".parse::<Phase>().is_err());
    }

    #[test]
    fn test_vsids_config_validation() {
        assert!(VsidsConfig::default().validate().is_ok());
        let bad = VsidsConfig {
            decay_factor: 1.5,
            ..VsidsConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = VsidsConfig {
            bump: -1.0,
            ..VsidsConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
