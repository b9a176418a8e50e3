//! Batch command: every (file, heuristic) pair, one CSV row each.

use anyhow::Context;
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use sextant_base::Formula;
use sextant_cdcl::{solve, HeuristicKind, SolveResult, SolveStatus};
use sextant_format::DimacsCnf;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SearchArgs;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// A .cnf file or a directory searched recursively for .cnf files
    #[arg(required = true)]
    pub path: PathBuf,

    /// Output CSV file
    #[arg(long, default_value = "results.csv")]
    pub out: PathBuf,

    /// Skip the random baseline heuristic
    #[arg(long)]
    pub no_baseline: bool,

    /// Skip the VSIDS heuristic
    #[arg(long)]
    pub no_vsids: bool,

    /// Number of parallel workers (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct BatchRow {
    file: String,
    heuristic: HeuristicKind,
    status: SolveStatus,
    runtime_sec: f64,
    decisions: u64,
    conflicts: u64,
    learned_clauses: u64,
    propagations: u64,
}

impl BatchRow {
    fn new(path: &Path, heuristic: HeuristicKind, result: &SolveResult) -> Self {
        Self {
            file: file_name(path),
            heuristic,
            status: result.status,
            runtime_sec: (result.runtime_sec * 1e6).round() / 1e6,
            decisions: result.stats.decisions,
            conflicts: result.stats.conflicts,
            learned_clauses: result.stats.learned_clauses,
            propagations: result.stats.propagations,
        }
    }
}

pub fn run(args: BatchArgs) -> anyhow::Result<()> {
    let heuristics = selected_heuristics(&args);
    if heuristics.is_empty() {
        anyhow::bail!("--no-baseline and --no-vsids leave nothing to run");
    }

    let files = find_cnf_files(&args.path)?;
    tracing::info!("Found {} files to process", files.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build()?;
    let rows = pool.install(|| run_jobs(&files, &heuristics, &args.search))?;

    write_csv(&args.out, &rows)?;
    println!("\nSaved results to: {}", args.out.display());
    Ok(())
}

fn selected_heuristics(args: &BatchArgs) -> Vec<HeuristicKind> {
    HeuristicKind::ALL
        .into_iter()
        .filter(|kind| match kind {
            HeuristicKind::Baseline => !args.no_baseline,
            HeuristicKind::Vsids => !args.no_vsids,
        })
        .collect()
}

/// Collects `.cnf` files under `path`, sorted. A file path is returned as is.
fn find_cnf_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_owned()]);
    }
    if !path.is_dir() {
        anyhow::bail!("{} is neither a file nor a directory", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "cnf") {
            files.push(path.to_owned());
        }
    }
    files.sort();
    Ok(files)
}

/// Solves every loadable file with every heuristic, rows in (file, heuristic) order.
fn run_jobs(
    files: &[PathBuf],
    heuristics: &[HeuristicKind],
    search: &SearchArgs,
) -> anyhow::Result<Vec<BatchRow>> {
    let formulas: Vec<(&PathBuf, Formula)> = files
        .par_iter()
        .filter_map(|path| match load(path) {
            Ok(formula) => Some((path, formula)),
            Err(e) => {
                tracing::error!("Failed to parse {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    let jobs: Vec<(&Path, &Formula, HeuristicKind)> = formulas
        .iter()
        .flat_map(|(path, formula)| {
            heuristics
                .iter()
                .map(move |&kind| (path.as_path(), formula, kind))
        })
        .collect();

    jobs.par_iter()
        .map(|&(path, formula, kind)| -> anyhow::Result<BatchRow> {
            let config = search.to_cdcl_config(kind)?;
            let result = solve(formula, &config)
                .with_context(|| format!("{kind} solve of {} failed", path.display()))?;
            let row = BatchRow::new(path, kind, &result);
            println!(
                "[{kind}] {} -> {} ({}s, decisions={}, conflicts={})",
                file_name(path),
                row.status,
                row.runtime_sec,
                row.decisions,
                row.conflicts
            );
            Ok(row)
        })
        .collect()
}

fn load(path: &Path) -> anyhow::Result<Formula> {
    Ok(DimacsCnf::from_path(path)?.into_formula()?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn write_csv(out: &Path, rows: &[BatchRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
