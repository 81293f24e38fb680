//! Pills and fruit.
//!
//! The item manager owns the pill set and the at-most-one active fruit.
//! Pill placement happens once per reset with one of three mutually
//! exclusive strategies; fruit spawning is attempted every turn. Both draw
//! from the game's seeded [`GameRng`]. Pills live in a `BTreeSet` so the
//! initial pill records and all later iteration are deterministic.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{GridMap, Position};
use crate::rng::GameRng;

/// How initial pills are distributed over eligible cells.
///
/// Eligible cells are open cells that no agent spawns on. The strategy is
/// chosen once at game start and fixed thereafter. An unrecognized strategy
/// name fails at configuration deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PillStrategy {
    /// Each eligible cell independently receives a pill with probability
    /// equal to the density; a zero-pill outcome falls back to one pill on
    /// a uniformly random eligible cell.
    #[default]
    Stochastic,
    /// Every k-th eligible cell in native enumeration order,
    /// k = round(1/density) clamped to >= 1.
    Linear,
    /// As linear, after a stable sort by ascending coordinate sum.
    Manhattan,
}

/// Owner of the pill set and the active fruit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemManager {
    pills: BTreeSet<Position>,
    fruit: Option<Position>,
}

impl ItemManager {
    /// Create an empty item manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the initial pills, replacing any previous contents.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoEligiblePillCell`] when no open, unoccupied
    /// cell exists: every strategy must yield at least one pill or the game
    /// would be unwinnable.
    pub fn place_pills(
        &mut self,
        grid: &GridMap,
        forbidden: &[Position],
        strategy: PillStrategy,
        density: f64,
        rng: &mut GameRng,
    ) -> Result<()> {
        self.pills.clear();
        self.fruit = None;

        let mut eligible: Vec<Position> = grid
            .open_positions()
            .filter(|pos| !forbidden.contains(pos))
            .collect();
        if eligible.is_empty() {
            return Err(GameError::NoEligiblePillCell);
        }

        match strategy {
            PillStrategy::Stochastic => {
                for &pos in &eligible {
                    if rng.chance(density) {
                        self.pills.insert(pos);
                    }
                }
                if self.pills.is_empty() {
                    // Forced fallback: a game without pills cannot be won.
                    let pos = rng
                        .pick(&eligible)
                        .copied()
                        .ok_or(GameError::NoEligiblePillCell)?;
                    self.pills.insert(pos);
                }
            }
            PillStrategy::Linear | PillStrategy::Manhattan => {
                if strategy == PillStrategy::Manhattan {
                    // Stable sort keeps the native order among equal sums.
                    eligible.sort_by_key(|pos| pos.x + pos.y);
                }
                // Ties round away from zero: density 0.4 gives k = 3.
                let k = ((1.0 / density).round() as usize).max(1);
                for pos in eligible.into_iter().step_by(k) {
                    self.pills.insert(pos);
                }
            }
        }
        Ok(())
    }

    /// Attempt a fruit spawn for this turn.
    ///
    /// At most one fruit is alive at a time. If none is present, a fruit
    /// appears with the given probability on a uniformly random open cell
    /// holding no pill and no evader. Returns the spawn position so the
    /// caller can log it.
    pub fn maybe_spawn_fruit(
        &mut self,
        grid: &GridMap,
        evader_positions: &[Position],
        probability: f64,
        rng: &mut GameRng,
    ) -> Option<Position> {
        if self.fruit.is_some() || !rng.chance(probability) {
            return None;
        }
        let available: Vec<Position> = grid
            .open_positions()
            .filter(|pos| !self.pills.contains(pos) && !evader_positions.contains(pos))
            .collect();
        let pos = rng.pick(&available).copied()?;
        self.fruit = Some(pos);
        Some(pos)
    }

    /// Remove a pill if one sits at `pos`. Returns whether one was removed.
    pub fn take_pill(&mut self, pos: Position) -> bool {
        self.pills.remove(&pos)
    }

    /// Clear and return the active fruit.
    pub fn take_fruit(&mut self) -> Option<Position> {
        self.fruit.take()
    }

    /// Check whether a pill sits at `pos`.
    #[must_use]
    pub fn has_pill(&self, pos: Position) -> bool {
        self.pills.contains(&pos)
    }

    /// Remaining pills in ascending position order.
    pub fn pills(&self) -> impl Iterator<Item = Position> + '_ {
        self.pills.iter().copied()
    }

    /// Number of remaining pills.
    #[must_use]
    pub fn pills_remaining(&self) -> usize {
        self.pills.len()
    }

    /// Position of the active fruit, if any.
    #[must_use]
    pub fn fruit(&self) -> Option<Position> {
        self.fruit
    }
}
