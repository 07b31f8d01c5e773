use std::fmt::Write as _;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::{style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use tile_puzzle_solver::config::{Config, DEFAULT_CONFIG};
use tile_puzzle_solver::solve::{self, SearchReport, Status, Strategy, VisitPolicy};
use tile_puzzle_solver::Board;

/// Update the spinner every this many expansions.
const SPINNER_INTERVAL: usize = 1 << 12;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board file: one line of whitespace-separated tiles
    input: Option<PathBuf>,

    /// TOML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Search strategy to run, may be repeated
    #[clap(short, long = "strategy", value_enum)]
    strategies: Vec<Strategy>,

    /// When a board is marked as visited
    #[clap(long, value_enum)]
    policy: Option<VisitPolicy>,

    /// Token standing for the blank cell
    #[clap(long)]
    blank: Option<String>,

    /// Directory receiving one solution file per strategy
    #[clap(short, long)]
    output_dir: Option<PathBuf>,

    /// Stop each search after this many expansions
    #[clap(long)]
    max_nodes: Option<usize>,

    /// Run the strategies concurrently
    #[clap(long)]
    parallel: bool,

    /// Print each solution step by step
    #[clap(long)]
    show: bool,

    /// Pause between steps with --show
    #[clap(long)]
    delay_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => Config::load(DEFAULT_CONFIG)?,
            None => Config::default(),
        };
        if let Some(input) = self.input {
            config.input = input;
        }
        if !self.strategies.is_empty() {
            config.strategies = self.strategies;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(blank) = self.blank {
            config.blank = blank;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if self.max_nodes.is_some() {
            config.max_nodes = self.max_nodes;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        config.parallel |= self.parallel;
        config.show |= self.show;
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_one(
    strategy: Strategy,
    initial: &Board,
    goal: &Board,
    config: &Config,
    bars: &MultiProgress,
) -> Result<SearchReport> {
    let bar = bars.add(ProgressBar::new_spinner());
    bar.set_style(
        ProgressStyle::with_template("{spinner} {prefix:>5} [{elapsed_precise}] {msg}")
            .context("Invalid progress template")?,
    );
    bar.set_prefix(strategy.name());

    let report = solve::solve(strategy, initial, goal, config.policy, |progress| {
        if progress.nodes_visited % SPINNER_INTERVAL == 0 {
            bar.set_message(format!(
                "{} nodes, depth {}, frontier {}",
                progress.nodes_visited, progress.depth, progress.frontier_len,
            ));
            bar.tick();
        }
        match config.max_nodes {
            Some(max) if progress.nodes_visited >= max => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;

    bar.finish_and_clear();
    Ok(report)
}

fn write_solution(report: &SearchReport, config: &Config) -> Result<Option<PathBuf>> {
    let Some(solution) = &report.solution else {
        return Ok(None);
    };
    let mut out = String::new();
    for board in &solution.boards {
        writeln!(out, "{}", board.tokens(&config.blank))?;
    }
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create {}", config.output_dir.display())
    })?;
    let path = config
        .output_dir
        .join(format!("{}.txt", report.strategy.name()));
    std::fs::write(&path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(Some(path))
}

fn show_solution(term: &Term, report: &SearchReport, config: &Config) -> Result<()> {
    let Some(solution) = &report.solution else {
        return Ok(());
    };
    let delay = Duration::from_millis(config.delay_ms);
    let dirs = std::iter::once(None).chain(solution.moves.iter().map(Some));
    for (board, dir) in solution.boards.iter().zip(dirs) {
        match dir {
            Some(dir) => term.write_line(&style(dir).cyan().to_string())?,
            None => term.write_line(&style("Start").cyan().to_string())?,
        }
        term.write_str(&board.grid(&config.blank).to_string())?;
        term.write_line(&"-".repeat(board.size() * 2))?;
        std::thread::sleep(delay);
    }
    Ok(())
}

fn print_report(term: &Term, report: &SearchReport) -> Result<()> {
    let header = style(format!("[{}]", report.strategy)).bold();
    let stats = &report.stats;
    match report.status {
        Status::Solved => {
            let moves = report.solution.as_ref().map_or(0, |solution| solution.len());
            term.write_line(&format!(
                "{header} {} in {moves} moves",
                style("Solution found").green(),
            ))?;
        }
        Status::Exhausted => {
            term.write_line(&format!("{header} {}", style("No solution found").red()))?;
        }
        Status::Interrupted => {
            term.write_line(&format!(
                "{header} {}",
                style("Stopped at node limit").yellow(),
            ))?;
        }
    }
    term.write_line(&format!("  Nodes visited: {}", stats.nodes_visited))?;
    term.write_line(&format!("  Elapsed time: {:.4}s", stats.elapsed_secs()))?;
    term.write_line(&format!(
        "  Peak memory: {:.2} KB",
        stats.peak_bytes as f64 / 1024.0,
    ))?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let config = Args::parse().into_config()?;

    let content = std::fs::read_to_string(&config.input)
        .with_context(|| format!("Failed to read {}", config.input.display()))?;
    let initial = Board::parse_with_marker(&content, &config.blank)
        .with_context(|| format!("Invalid board in {}", config.input.display()))?;
    let goal = Board::goal(initial.size() as u8)?;
    if !initial.is_solvable() {
        warn!(
            board = %initial.tokens(&config.blank),
            "board has the wrong parity, every search will run to exhaustion"
        );
    }

    let bars = MultiProgress::new();
    let reports = if config.parallel {
        config
            .strategies
            .par_iter()
            .map(|&strategy| run_one(strategy, &initial, &goal, &config, &bars))
            .collect::<Result<Vec<_>>>()?
    } else {
        config
            .strategies
            .iter()
            .map(|&strategy| run_one(strategy, &initial, &goal, &config, &bars))
            .collect::<Result<Vec<_>>>()?
    };

    let term = Term::stdout();
    for report in &reports {
        if config.show {
            show_solution(&term, report, &config)?;
        }
        print_report(&term, report)?;
        if let Some(path) = write_solution(report, &config)? {
            info!(strategy = %report.strategy, path = %path.display(), "solution written");
        }
    }

    Ok(())
}
