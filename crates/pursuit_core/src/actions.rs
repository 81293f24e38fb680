//! Action vocabulary and per-turn legal-move resolution.
//!
//! Legality depends only on the grid and the acting agent's current cell, so
//! results are memoized per agent for the duration of one turn. The turn
//! engine clears the cache explicitly as the first step of turn resolution;
//! invalidation is never an incidental side effect.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agents::{AgentId, Role};
use crate::grid::{GridMap, Position};

/// The four movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Positive y.
    Up,
    /// Positive x.
    Right,
    /// Negative y.
    Down,
    /// Negative x.
    Left,
}

impl Direction {
    /// All directions, in the order candidate sets are enumerated.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Coordinate delta applied by moving one cell this way.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }
}

/// One agent's choice for one turn.
///
/// `Hold` is available to evaders only; pursuers must move every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Stay on the current cell.
    Hold,
    /// Step one cell in a direction.
    Move(Direction),
}

impl Action {
    /// Coordinate delta applied by this action.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Hold => (0, 0),
            Self::Move(dir) => dir.delta(),
        }
    }

    /// Candidate actions for a role, before legality filtering.
    #[must_use]
    pub fn candidates(role: Role) -> &'static [Self] {
        const MOVES: [Action; 4] = [
            Action::Move(Direction::Up),
            Action::Move(Direction::Right),
            Action::Move(Direction::Down),
            Action::Move(Direction::Left),
        ];
        const WITH_HOLD: [Action; 5] = [
            Action::Hold,
            MOVES[0],
            MOVES[1],
            MOVES[2],
            MOVES[3],
        ];
        match role {
            Role::Evader => &WITH_HOLD,
            Role::Pursuer => &MOVES,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Hold => "hold",
            Self::Move(Direction::Up) => "up",
            Self::Move(Direction::Right) => "right",
            Self::Move(Direction::Down) => "down",
            Self::Move(Direction::Left) => "left",
        };
        f.write_str(token)
    }
}

/// Compute the legal actions for an agent standing at `pos`.
///
/// An action is legal iff its destination cell is in-bounds and open. `Hold`
/// targets the current cell, which is open by construction, so it is always
/// legal for evaders.
#[must_use]
pub fn legal_actions(grid: &GridMap, pos: Position, role: Role) -> Vec<Action> {
    Action::candidates(role)
        .iter()
        .copied()
        .filter(|action| {
            let (dx, dy) = action.delta();
            grid.is_open(pos.offset(dx, dy))
        })
        .collect()
}

/// Per-turn memo of legal action sets.
///
/// Positions only change at turn resolution, so a computed set stays valid
/// until the next [`clear`](Self::clear).
#[derive(Debug, Clone, Default)]
pub struct LegalActionCache {
    sets: HashMap<AgentId, Vec<Action>>,
}

impl LegalActionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized legal set for an agent, computing it on first use.
    pub fn get_or_compute(
        &mut self,
        grid: &GridMap,
        id: &AgentId,
        pos: Position,
        role: Role,
    ) -> &[Action] {
        self.sets
            .entry(id.clone())
            .or_insert_with(|| legal_actions(grid, pos, role))
    }

    /// Drop all memoized sets. Called at the start of turn resolution.
    pub fn clear(&mut self) {
        self.sets.clear();
    }
}
