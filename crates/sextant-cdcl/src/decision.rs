//! Decision engine: the heuristic selected for a solve.

use serde::{Deserialize, Serialize};
use sextant_base::{Error, Lit, Result, Var};
use std::fmt;
use std::str::FromStr;

use crate::heuristics::{BranchingHeuristic, RandomBaseline, Vsids, VsidsConfig};
use crate::trail::Trail;

/// Which decision heuristic to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    /// Uniformly random variable and polarity.
    #[default]
    Baseline,
    /// Activity-based VSIDS.
    Vsids,
}

impl HeuristicKind {
    /// All heuristics, in the order the batch harness runs them.
    pub const ALL: [HeuristicKind; 2] = [HeuristicKind::Baseline, HeuristicKind::Vsids];
}

impl FromStr for HeuristicKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" | "random" => Ok(Self::Baseline),
            "vsids" => Ok(Self::Vsids),
            other => Err(Error::InvalidConfig(format!("unknown heuristic: {other}"))),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Baseline => "baseline",
            Self::Vsids => "vsids",
        })
    }
}

/// The heuristic owned by one solve. The driver only talks to it through
/// [`BranchingHeuristic`].
#[derive(Debug, Clone)]
pub enum Heuristic {
    /// Random baseline.
    Baseline(RandomBaseline),
    /// VSIDS.
    Vsids(Vsids),
}

impl Heuristic {
    /// Builds the heuristic of the given kind.
    pub fn new(kind: HeuristicKind, num_vars: usize, seed: u64, vsids: &VsidsConfig) -> Self {
        match kind {
            HeuristicKind::Baseline => Self::Baseline(RandomBaseline::new(seed)),
            HeuristicKind::Vsids => Self::Vsids(Vsids::new(num_vars, vsids, seed)),
        }
    }

    /// Returns which heuristic this is.
    pub fn kind(&self) -> HeuristicKind {
        match self {
            Self::Baseline(_) => HeuristicKind::Baseline,
            Self::Vsids(_) => HeuristicKind::Vsids,
        }
    }
}

impl BranchingHeuristic for Heuristic {
    fn decide(&mut self, trail: &Trail) -> Option<Lit> {
        match self {
            Self::Baseline(h) => h.decide(trail),
            Self::Vsids(h) => h.decide(trail),
        }
    }

    fn on_conflict(&mut self, involved: &[Var]) {
        match self {
            Self::Baseline(h) => h.on_conflict(involved),
            Self::Vsids(h) => h.on_conflict(involved),
        }
    }

    fn on_backjump(&mut self, unassigned: &[Var]) {
        match self {
            Self::Baseline(h) => h.on_backjump(unassigned),
            Self::Vsids(h) => h.on_backjump(unassigned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_accepts_aliases() {
        assert_eq!("baseline".parse::<HeuristicKind>().unwrap(), HeuristicKind::Baseline);
        assert_eq!(" Random ".parse::<HeuristicKind>().unwrap(), HeuristicKind::Baseline);
        assert_eq!("VSIDS".parse::<HeuristicKind>().unwrap(), HeuristicKind::Vsids);
        assert!("lrb".parse::<HeuristicKind>().is_err());
    }

    #[test]
    fn test_heuristic_totality() {
        for kind in HeuristicKind::ALL {
            let mut heuristic = Heuristic::new(kind, 3, 0, &VsidsConfig::default());
            assert_eq!(heuristic.kind(), kind);
            let mut trail = Trail::new(3);
            while let Some(lit) = heuristic.decide(&trail) {
                assert_eq!(trail.value(lit.var()), None);
                trail.new_decision_level();
                trail.assign(lit, None);
            }
            assert!(trail.is_complete(), "{kind} stopped early");
        }
    }
}
