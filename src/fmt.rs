use std::fmt;

use crate::solve::{Strategy, VisitPolicy};
use crate::{Board, Direction, Tile, BLANK_MARKER};

/// A board as one line of tokens with a custom blank marker.
pub struct Tokens<'a> {
    board: &'a Board,
    blank: &'a str,
}

/// A board laid out as rows, for step-by-step display.
pub struct Grid<'a> {
    board: &'a Board,
    blank: &'a str,
}

impl Board {
    pub fn tokens<'a>(&'a self, blank: &'a str) -> Tokens<'a> {
        Tokens { board: self, blank }
    }

    pub fn grid<'a>(&'a self, blank: &'a str) -> Grid<'a> {
        Grid { board: self, blank }
    }
}

fn write_tile(f: &mut fmt::Formatter<'_>, tile: Tile, blank: &str) -> fmt::Result {
    match tile {
        Tile::Blank => f.pad(blank),
        Tile::Number(n) => f.pad(&n.to_string()),
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tokens(BLANK_MARKER).fmt(f)
    }
}

impl fmt::Display for Tokens<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &tile) in self.board.tiles().iter().enumerate() {
            if i != 0 {
                " ".fmt(f)?;
            }
            write_tile(f, tile, self.blank)?;
        }
        Ok(())
    }
}

impl fmt::Display for Grid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.board.size();
        let width = (size * size - 1)
            .to_string()
            .len()
            .max(self.blank.chars().count());
        for row in self.board.tiles().chunks(size) {
            for (j, &tile) in row.iter().enumerate() {
                if j != 0 {
                    " ".fmt(f)?;
                }
                write!(f, "{:>width$}", TilePad(tile, self.blank))?;
            }
            "\n".fmt(f)?;
        }
        Ok(())
    }
}

struct TilePad<'a>(Tile, &'a str);

impl fmt::Display for TilePad<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tile(f, self.0, self.1)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tile(f, *self, BLANK_MARKER)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => "Up".fmt(f),
            Direction::Down => "Down".fmt(f),
            Direction::Left => "Left".fmt(f),
            Direction::Right => "Right".fmt(f),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl fmt::Display for VisitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitPolicy::OnExpand => "expand".fmt(f),
            VisitPolicy::OnDiscover => "discover".fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Board;

    #[test]
    fn token_line() {
        let board = "2 X 3 1 4 5 6 7 8".parse::<Board>().unwrap();
        assert_eq!(board.to_string(), "2 X 3 1 4 5 6 7 8");
        assert_eq!(board.tokens("0").to_string(), "2 0 3 1 4 5 6 7 8");
    }

    #[test]
    fn grid_rows() {
        let board = Board::goal(4).unwrap();
        let grid = board.grid("X").to_string();
        assert_eq!(grid.lines().count(), 4);
        assert_eq!(grid.lines().next(), Some(" 1  2  3  4"));
        assert_eq!(grid.lines().last(), Some("13 14 15  X"));
    }
}
