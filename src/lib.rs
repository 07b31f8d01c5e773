//! Sliding-tile puzzle solver.
//!
//! A [`Board`] is a flattened `N x N` grid holding the tiles `1..N*N` and a
//! single blank. [`solve`] explores the configurations reachable by sliding the
//! blank, using breadth-first, depth-first or best-first (A*) search.

use std::mem;

use anyhow::{ensure, Context, Result};
use arrayvec::ArrayVec;

pub mod config;
mod fmt;
pub mod frontier;
pub mod heuristic;
mod parse;
pub mod solve;

pub use crate::fmt::{Grid, Tokens};
pub use crate::parse::BLANK_MARKER;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tile {
    #[default]
    Blank,
    Number(u16),
}

/// An immutable puzzle configuration. Every move produces a new board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: u8,
    blank: u16,
    tiles: Box<[Tile]>,
}

/// The direction the blank slides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order of the search.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

fn isqrt(n: usize) -> usize {
    let mut root = 0;
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

impl Board {
    /// Builds a board from tiles in reading order.
    ///
    /// The tile count must be a perfect square `N*N`, with exactly one blank
    /// and each of `1..N*N` present once.
    pub fn new(tiles: Vec<Tile>) -> Result<Self> {
        let len = tiles.len();
        ensure!(len != 0, "Empty board");
        let size = isqrt(len);
        ensure!(
            size * size == len,
            "Tile count {len} is not a perfect square"
        );
        let size = u8::try_from(size)
            .ok()
            .with_context(|| format!("Grid size {size} is too large"))?;

        let mut blank = None;
        let mut seen = vec![false; len];
        for (idx, &tile) in tiles.iter().enumerate() {
            match tile {
                Tile::Blank => {
                    ensure!(blank.is_none(), "Multiple blanks");
                    blank = Some(idx);
                }
                Tile::Number(n) => {
                    let n = n as usize;
                    ensure!(
                        (1..len).contains(&n),
                        "Tile {n} out of range 1..={}",
                        len - 1,
                    );
                    ensure!(!mem::replace(&mut seen[n], true), "Duplicate tile {n}");
                }
            }
        }
        let blank = blank.context("Missing blank")?;

        Ok(Self {
            size,
            blank: blank as u16,
            tiles: tiles.into(),
        })
    }

    /// The solved configuration: `1..N*N` in reading order, blank last.
    pub fn goal(size: u8) -> Result<Self> {
        ensure!(size != 0, "Grid size must be positive");
        let len = size as usize * size as usize;
        let tiles = (1..len)
            .map(|n| Tile::Number(n as u16))
            .chain([Tile::Blank])
            .collect::<Vec<_>>();
        Ok(Self {
            size,
            blank: (len - 1) as u16,
            tiles: tiles.into(),
        })
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn blank_index(&self) -> usize {
        self.blank as usize
    }

    /// Bytes owned on the heap by this board.
    pub fn heap_bytes(&self) -> usize {
        self.tiles.len() * mem::size_of::<Tile>()
    }

    /// Slides the blank one cell, or `None` if that leaves the grid.
    pub fn go(&self, dir: Direction) -> Option<Self> {
        let size = self.size();
        let blank = self.blank_index();
        let col = blank % size;
        let target = match dir {
            Direction::Up => blank.checked_sub(size)?,
            Direction::Down => blank + size,
            Direction::Left if col == 0 => return None,
            Direction::Left => blank - 1,
            Direction::Right if col + 1 == size => return None,
            Direction::Right => blank + 1,
        };
        if target >= self.tiles.len() {
            return None;
        }

        let mut tiles = self.tiles.clone();
        tiles.swap(blank, target);
        Some(Self {
            size: self.size,
            blank: target as u16,
            tiles,
        })
    }

    /// All boards one slide away, in [`Direction::ALL`] order.
    pub fn moves(&self) -> ArrayVec<(Board, Direction), 4> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| Some((self.go(dir)?, dir)))
            .collect()
    }

    /// Whether the board can reach [`Board::goal`] of its size, by inversion
    /// parity.
    pub fn is_solvable(&self) -> bool {
        let numbers = self
            .tiles
            .iter()
            .filter_map(|tile| match tile {
                Tile::Number(n) => Some(*n),
                Tile::Blank => None,
            })
            .collect::<Vec<_>>();
        let inversions = numbers
            .iter()
            .enumerate()
            .map(|(i, &n)| numbers[i + 1..].iter().filter(|&&m| m < n).count())
            .sum::<usize>();

        if self.size % 2 == 1 {
            inversions % 2 == 0
        } else {
            let blank_row = self.blank_index() / self.size();
            (inversions + blank_row) % 2 == 1
        }
    }
}
