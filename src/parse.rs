use std::str::FromStr;

use anyhow::{ensure, Context, Result};

use crate::{Board, Direction, Tile};

/// Token for the blank cell, used unless another marker is configured.
pub const BLANK_MARKER: &str = "X";

impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::parse_with_marker(s, BLANK_MARKER)
    }
}

impl Board {
    /// Parses a single line of whitespace-separated tiles, where `marker`
    /// stands for the blank and every other token is a tile number.
    pub fn parse_with_marker(s: &str, marker: &str) -> Result<Self> {
        ensure!(!marker.is_empty(), "Empty blank marker");

        let mut lines = s.lines().map(|line| line.trim()).filter(|line| !line.is_empty());
        let line = lines.next().context("Missing board line")?;
        ensure!(lines.next().is_none(), "Board must be on a single line");

        let tiles = line
            .split_whitespace()
            .enumerate()
            .map(|(i, token)| -> Result<Tile> {
                if token == marker {
                    return Ok(Tile::Blank);
                }
                let n = token
                    .parse::<u16>()
                    .with_context(|| format!("Invalid tile {token:?} at position {}", i + 1))?;
                Ok(Tile::Number(n))
            })
            .collect::<Result<Vec<_>>>()?;

        Board::new(tiles)
    }
}

impl TryFrom<char> for Direction {
    type Error = anyhow::Error;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        Direction::ALL
            .into_iter()
            .find(|dir| dir.letter() == ch.to_ascii_uppercase())
            .with_context(|| format!("Invalid direction: {ch:?}"))
    }
}
