//! Search settings shared by `solve` and `batch`.

use anyhow::Context;
use clap::Args;
use sextant_cdcl::{CdclConfig, HeuristicKind, Phase, VsidsConfig};
use std::time::Duration;

/// Flags that map onto [`CdclConfig`].
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Timeout in seconds per solve
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub timeout: f64,

    /// Seed for randomized decisions
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// VSIDS activity increment per conflict
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub vsids_bump: f64,

    /// VSIDS multiplicative decay, in (0, 1)
    #[arg(long, default_value_t = 0.95)]
    pub vsids_decay: f64,

    /// Conflicts between VSIDS decays
    #[arg(long, default_value_t = 50)]
    pub vsids_decay_period: u64,

    /// Polarity VSIDS tries first (positive, negative, random)
    #[arg(long, default_value_t = Phase::Positive)]
    pub vsids_phase: Phase,
}

impl SearchArgs {
    /// Builds the solver configuration for one heuristic.
    pub fn to_cdcl_config(&self, heuristic: HeuristicKind) -> anyhow::Result<CdclConfig> {
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("invalid timeout {}", self.timeout))?;
        let config = CdclConfig {
            heuristic,
            timeout: Some(timeout),
            seed: self.seed,
            vsids: VsidsConfig {
                bump: self.vsids_bump,
                decay_factor: self.vsids_decay,
                decay_period: self.vsids_decay_period,
                phase: self.vsids_phase,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
