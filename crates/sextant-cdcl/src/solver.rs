//! Core CDCL solver implementation.

use serde::Serialize;
use sextant_base::{Error, Formula, Lit, Result};
use std::time::{Duration, Instant};

use crate::bcp::{BcpResult, Propagator};
use crate::clause_db::{ClauseDatabase, ClauseId};
use crate::conflict::ConflictAnalyzer;
use crate::decision::{Heuristic, HeuristicKind};
use crate::heuristics::{BranchingHeuristic, VsidsConfig};
use crate::result::{Model, SolveResult, SolveStatus};
use crate::trail::Trail;

/// Configuration for the CDCL solver.
#[derive(Debug, Clone, Default)]
pub struct CdclConfig {
    /// Decision heuristic.
    pub heuristic: HeuristicKind,
    /// Wall-clock budget, checked between driver iterations (None = no limit).
    pub timeout: Option<Duration>,
    /// Seed for every randomized choice.
    pub seed: u64,
    /// VSIDS knobs, ignored by the baseline heuristic.
    pub vsids: VsidsConfig,
}

impl CdclConfig {
    /// Checks every setting is in range.
    pub fn validate(&self) -> Result<()> {
        self.vsids.validate()
    }
}

/// Solver statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverStats {
    /// Number of decisions made.
    pub decisions: u64,
    /// Number of conflicts encountered.
    pub conflicts: u64,
    /// Number of learned clauses.
    pub learned_clauses: u64,
    /// Number of literals forced by unit propagation.
    pub propagations: u64,
}

/// The main CDCL solver.
///
/// One instance performs one solve: the trail, watches, clause database and
/// heuristic state all belong to it and are dropped with it.
#[derive(Debug, Clone)]
pub struct CdclSolver {
    /// Clause database.
    clauses: ClauseDatabase,
    /// Current assignments and their antecedents.
    trail: Trail,
    /// Watch index and propagation queue.
    propagator: Propagator,
    /// 1-UIP analysis state.
    analyzer: ConflictAnalyzer,
    /// Decision heuristic.
    heuristic: Heuristic,
    /// Configuration.
    config: CdclConfig,
    /// Statistics.
    stats: SolverStats,
    /// Original unit clauses, asserted when the search starts.
    root_units: Vec<(ClauseId, Lit)>,
    started: bool,
    /// Terminal status reached by `step`.
    status: Option<SolveStatus>,
    /// Result of the first `solve` call.
    outcome: Option<SolveResult>,
}

impl CdclSolver {
    /// Creates a new solver with the default configuration.
    pub fn new(formula: &Formula) -> Self {
        Self::build(formula, CdclConfig::default())
    }

    /// Creates a new solver with custom configuration.
    pub fn with_config(formula: &Formula, config: CdclConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(formula, config))
    }

    fn build(formula: &Formula, config: CdclConfig) -> Self {
        let num_vars = formula.num_vars();
        let mut clauses = ClauseDatabase::new();
        let mut propagator = Propagator::new(num_vars);
        let mut root_units = Vec::new();
        let mut marks = vec![false; num_vars * 2];

        for clause in formula.clauses() {
            // Two watches need two distinct literals
            let mut literals = Vec::with_capacity(clause.len());
            for &lit in clause {
                if !marks[lit.index()] {
                    marks[lit.index()] = true;
                    literals.push(lit);
                }
            }
            for lit in &literals {
                marks[lit.index()] = false;
            }

            let unit = (literals.len() == 1).then(|| literals[0]);
            let id = clauses.add_original(literals);
            propagator.watch_clause(id, &clauses[id]);
            if let Some(lit) = unit {
                root_units.push((id, lit));
            }
        }

        let heuristic = Heuristic::new(config.heuristic, num_vars, config.seed, &config.vsids);

        Self {
            clauses,
            trail: Trail::new(num_vars),
            propagator,
            analyzer: ConflictAnalyzer::new(num_vars),
            heuristic,
            config,
            stats: SolverStats::default(),
            root_units,
            started: false,
            status: None,
            outcome: None,
        }
    }

    /// Solves the formula, checking the time budget before every iteration.
    ///
    /// A solver is single-use: calling this again returns the first result.
    pub fn solve(&mut self) -> Result<SolveResult> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        let start = Instant::now();
        tracing::debug!(
            vars = self.trail.num_vars(),
            clauses = self.clauses.len(),
            heuristic = %self.heuristic.kind(),
            seed = self.config.seed,
            "starting CDCL search"
        );

        let status = loop {
            if self.budget_exhausted(start) {
                break SolveStatus::Timeout;
            }
            if let Some(status) = self.step()? {
                break status;
            }
        };

        let result = SolveResult {
            status,
            runtime_sec: start.elapsed().as_secs_f64(),
            assignment: (status == SolveStatus::Sat).then(|| self.model()),
            stats: self.stats,
        };
        tracing::debug!(
            status = %status,
            runtime_sec = result.runtime_sec,
            decisions = self.stats.decisions,
            conflicts = self.stats.conflicts,
            propagations = self.stats.propagations,
            "search finished"
        );
        self.outcome = Some(result.clone());
        Ok(result)
    }

    /// Runs one driver iteration: propagate, then either handle the conflict
    /// or make a decision. Returns the terminal status once one is reached.
    pub fn step(&mut self) -> Result<Option<SolveStatus>> {
        if self.status.is_some() {
            return Ok(self.status);
        }
        if !self.started {
            self.started = true;
            self.assert_root_units();
        }

        match self
            .propagator
            .propagate(&mut self.clauses, &mut self.trail, &mut self.stats)
        {
            BcpResult::Conflict(conflict) => {
                self.stats.conflicts += 1;
                if self.trail.decision_level() == 0 {
                    tracing::debug!(clause = conflict, "conflict at level 0");
                    self.status = Some(SolveStatus::Unsat);
                } else {
                    self.handle_conflict(conflict)?;
                }
            }
            BcpResult::Ok => {
                if self.trail.is_complete() {
                    self.status = Some(SolveStatus::Sat);
                } else {
                    self.decide()?;
                }
            }
        }
        Ok(self.status)
    }

    fn assert_root_units(&mut self) {
        for (clause_id, lit) in std::mem::take(&mut self.root_units) {
            if self.propagator.assert_unit(&mut self.trail, clause_id, lit) {
                self.stats.propagations += 1;
            }
        }
    }

    /// Learns from a conflict above level 0 and asserts the learned clause.
    fn handle_conflict(&mut self, conflict: ClauseId) -> Result<()> {
        let level = self.trail.decision_level();
        let analysis = self.analyzer.analyze(conflict, &self.clauses, &self.trail)?;
        self.heuristic.on_conflict(&analysis.involved);

        tracing::debug!(
            conflicts = self.stats.conflicts,
            level,
            backjump = analysis.backjump_level,
            size = analysis.learned.len(),
            "learned clause"
        );

        let undone = self.trail.backjump(analysis.backjump_level);
        self.propagator.clear_queue();
        self.heuristic.on_backjump(&undone);

        let asserting = analysis.learned[0];
        let id = self.clauses.add_learned(analysis.learned);
        self.propagator.watch_clause(id, &self.clauses[id]);
        self.propagator.enqueue(&mut self.trail, asserting, Some(id));
        self.stats.learned_clauses += 1;
        self.stats.propagations += 1;
        Ok(())
    }

    /// Opens a new decision level with the heuristic's choice.
    fn decide(&mut self) -> Result<()> {
        let lit = self.heuristic.decide(&self.trail).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "{} heuristic made no decision with {} variables unassigned",
                self.heuristic.kind(),
                self.trail.num_vars() - self.trail.len()
            ))
        })?;
        if self.trail.value(lit.var()).is_some() {
            return Err(Error::InvariantViolation(format!(
                "{} heuristic chose assigned literal {lit}",
                self.heuristic.kind()
            )));
        }

        self.trail.new_decision_level();
        tracing::trace!(level = self.trail.decision_level(), %lit, "decision");
        self.propagator.enqueue(&mut self.trail, lit, None);
        self.stats.decisions += 1;
        Ok(())
    }

    fn budget_exhausted(&self, start: Instant) -> bool {
        self.config
            .timeout
            .is_some_and(|limit| start.elapsed() > limit)
    }

    fn model(&self) -> Model {
        Model::new(self.trail.values())
    }

    /// Returns solver statistics.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Returns the assignment trail.
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Returns the current decision level.
    pub fn decision_level(&self) -> usize {
        self.trail.decision_level()
    }

    /// Iterates over the clauses learned so far.
    pub fn learned_clauses(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses.learned()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CdclConfig {
        &self.config
    }
}

/// Solves `formula` with a fresh solver.
pub fn solve(formula: &Formula, config: &CdclConfig) -> Result<SolveResult> {
    CdclSolver::with_config(formula, config.clone())?.solve()
}
