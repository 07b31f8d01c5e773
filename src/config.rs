//! Run configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::solve::{Strategy, VisitPolicy};
use crate::BLANK_MARKER;

/// Looked up in the working directory when no file is given.
pub const DEFAULT_CONFIG: &str = "puzzle.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Board file: one line of whitespace-separated tiles.
    pub input: PathBuf,
    /// Solutions are written to `<output-dir>/<strategy>.txt`.
    pub output_dir: PathBuf,
    /// Token standing for the blank, in input and output.
    pub blank: String,
    pub strategies: Vec<Strategy>,
    pub policy: VisitPolicy,
    /// Stop a search after this many expansions.
    pub max_nodes: Option<usize>,
    /// Run the strategies concurrently.
    pub parallel: bool,
    /// Print every board of each solution.
    pub show: bool,
    /// Pause between boards when showing a solution.
    pub delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.txt"),
            output_dir: PathBuf::from("output"),
            blank: BLANK_MARKER.to_owned(),
            strategies: Strategy::ALL.to_vec(),
            policy: VisitPolicy::default(),
            max_nodes: None,
            parallel: false,
            show: false,
            delay_ms: 500,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.strategies.is_empty(), "No strategy selected");
        ensure!(!self.blank.is_empty(), "Empty blank marker");
        ensure!(
            !self.blank.chars().any(char::is_whitespace),
            "Blank marker {:?} contains whitespace",
            self.blank,
        );
        ensure!(
            !matches!(self.blank.parse::<u16>(), Ok(n) if n != 0),
            "Blank marker {:?} is a tile number",
            self.blank,
        );
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config = toml::from_str::<Config>(s)?;
        config.validate()?;
        Ok(config)
    }
}
