//! Immutable occupancy grid and integer positions.
//!
//! The map is built once (from cells or from the textual map format) and
//! never mutated afterwards. Exactly one [`GridMap`] is owned by the game
//! state; every component that needs terrain queries borrows it.

use serde::{Deserialize, Serialize};

use crate::actions::Direction;
use crate::error::{GameError, Result};

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Traversable cell.
    #[default]
    Open,
    /// Impassable cell.
    Wall,
}

impl Cell {
    /// Returns true if agents and items may occupy this cell.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A grid coordinate pair.
///
/// Equality, hashing and ordering are by value; the total order (x-major)
/// keeps ordered collections of positions deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Position {
    /// Column, 0-based from the left edge.
    pub x: i32,
    /// Row, 0-based from the bottom edge.
    pub y: i32,
}

impl Position {
    /// Create a position from coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position reached by applying a coordinate delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Immutable 2-D occupancy grid.
///
/// Cells are stored x-major (column index outer), matching the native
/// indexing of the map format this engine consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell data, index = x * height + y.
    cells: Vec<Cell>,
}

impl GridMap {
    /// Build a map from a flat x-major cell vector.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptyMap`] for a zero dimension and
    /// [`GameError::NonRectangularMap`] when the cell count does not match
    /// `width * height`.
    pub fn from_cells(width: u32, height: u32, cells: Vec<Cell>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::EmptyMap);
        }
        let expected = (width as usize) * (height as usize);
        if cells.len() % (height as usize) != 0 || cells.len() != expected {
            return Err(GameError::NonRectangularMap {
                row: cells.len() / (height as usize),
                found: cells.len() % (height as usize),
                expected: height as usize,
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a map from per-column cell vectors (`columns[x][y]`).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptyMap`] or [`GameError::NonRectangularMap`]
    /// for degenerate input.
    pub fn from_columns(columns: Vec<Vec<Cell>>) -> Result<Self> {
        if columns.is_empty() || columns[0].is_empty() {
            return Err(GameError::EmptyMap);
        }
        let height = columns[0].len();
        for (x, column) in columns.iter().enumerate() {
            if column.len() != height {
                return Err(GameError::NonRectangularMap {
                    row: x,
                    found: column.len(),
                    expected: height,
                });
            }
        }
        let width = columns.len() as u32;
        let cells = columns.into_iter().flatten().collect();
        Self::from_cells(width, height as u32, cells)
    }

    /// Parse the textual map format.
    ///
    /// First line is `"<width> <height>"`; the following `height` lines are
    /// rows read from the top of the map downward, `~` for open and `#` for
    /// wall. Every row must supply at least `width` cells; extra trailing
    /// cells are ignored.
    ///
    /// This consumes a string only. File loading belongs to callers outside
    /// the engine.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MapParse`] for malformed text and
    /// [`GameError::EmptyMap`] for zero dimensions.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| GameError::MapParse("missing dimension line".into()))?;
        let mut tokens = header.split_whitespace();
        let width: u32 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| GameError::MapParse(format!("bad width in '{header}'")))?;
        let height: u32 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| GameError::MapParse(format!("bad height in '{header}'")))?;
        if width == 0 || height == 0 {
            return Err(GameError::EmptyMap);
        }

        let mut cells = vec![Cell::Open; (width as usize) * (height as usize)];
        // Rows arrive top-down, so the first data row is y = height - 1.
        for row in 0..height {
            let line = lines
                .next()
                .ok_or_else(|| GameError::MapParse(format!("missing row {row}")))?;
            let y = height - 1 - row;
            let mut x = 0u32;
            for ch in line.chars() {
                if x == width {
                    break;
                }
                let cell = match ch {
                    '~' => Cell::Open,
                    '#' => Cell::Wall,
                    _ => {
                        return Err(GameError::MapParse(format!(
                            "unexpected character '{ch}' in row {row}"
                        )))
                    }
                };
                cells[(x as usize) * (height as usize) + (y as usize)] = cell;
                x += 1;
            }
            if x < width {
                return Err(GameError::MapParse(format!(
                    "row {row} has {x} cells, expected at least {width}"
                )));
            }
        }
        Self::from_cells(width, height, cells)
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a position lies within the grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Cell at a position, or `None` out of bounds.
    #[must_use]
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if self.in_bounds(pos) {
            Some(self.cells[(pos.x as usize) * (self.height as usize) + (pos.y as usize)])
        } else {
            None
        }
    }

    /// Check if a position is in-bounds and open.
    #[must_use]
    pub fn is_open(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(Cell::is_open)
    }

    /// In-bounds open cells adjacent to `pos`, with the direction that
    /// reaches each.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::ALL.iter().filter_map(move |&dir| {
            let (dx, dy) = dir.delta();
            let dest = pos.offset(dx, dy);
            self.is_open(dest).then_some((dir, dest))
        })
    }

    /// All positions in native enumeration order (x outer, y inner).
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width as i32)
            .flat_map(move |x| (0..self.height as i32).map(move |y| Position::new(x, y)))
    }

    /// Open positions in native enumeration order.
    pub fn open_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(|&p| self.is_open(p))
    }

    /// Wall positions in native enumeration order.
    pub fn wall_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(|&p| !self.is_open(p))
    }
}
