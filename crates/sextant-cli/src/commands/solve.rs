//! Solve command.

use anyhow::Context;
use clap::Args;
use sextant_cdcl::{solve, HeuristicKind, SolveResult, SolveStatus};
use sextant_format::DimacsCnf;
use std::fs;
use std::path::PathBuf;

use crate::config::SearchArgs;

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Input DIMACS CNF file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Decision heuristic (baseline, vsids)
    #[arg(long, default_value_t = HeuristicKind::Baseline)]
    pub heuristic: HeuristicKind,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Output file for the model (`v ... 0` line)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: SolveArgs) -> anyhow::Result<()> {
    tracing::info!("Loading problem from {:?}", args.input);

    let dimacs = DimacsCnf::from_path(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    tracing::info!(
        "Loaded DIMACS: {} vars, {} clauses",
        dimacs.num_vars,
        dimacs.clauses.len()
    );
    let formula = dimacs.into_formula()?;

    let config = args.search.to_cdcl_config(args.heuristic)?;
    let result = solve(&formula, &config)?;
    tracing::info!(
        "{} heuristic finished with {} in {:.6}s",
        args.heuristic,
        result.status,
        result.runtime_sec
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_text(&result));
    }

    if let Some(output) = &args.output {
        match &result.assignment {
            Some(model) => {
                fs::write(output, model_line(&model.to_dimacs()))
                    .with_context(|| format!("failed to write {}", output.display()))?;
            }
            None => tracing::warn!("No model to write ({}), skipping {:?}", result.status, output),
        }
    }

    Ok(())
}

/// Human-readable summary, with the assignment when SAT.
fn render_text(result: &SolveResult) -> String {
    let mut out = format!(
        "Status: {}\nRuntime (sec): {:.6}\nDecisions: {}\nConflicts: {}\nLearned clauses: {}\nPropagations: {}\n",
        result.status,
        result.runtime_sec,
        result.stats.decisions,
        result.stats.conflicts,
        result.stats.learned_clauses,
        result.stats.propagations,
    );
    if let (SolveStatus::Sat, Some(model)) = (result.status, &result.assignment) {
        out.push_str("Assignment:\n");
        out.push_str(&model.to_string());
    }
    out
}

fn model_line(literals: &[i64]) -> String {
    let body: Vec<String> = literals.iter().map(|l| l.to_string()).collect();
    if body.is_empty() {
        "v 0\n".to_string()
    } else {
        format!("v {} 0\n", body.join(" "))
    }
}
