//! Test fixtures and helpers.
//!
//! Pre-built maps and game configurations for consistent testing, plus
//! proptest strategies for randomized inputs.

use proptest::prelude::*;
use pursuit_core::prelude::*;

/// Fully open rectangular map.
///
/// # Panics
///
/// Panics on zero dimensions; fixtures take valid sizes.
#[must_use]
pub fn open_map(width: u32, height: u32) -> GridMap {
    GridMap::from_cells(width, height, vec![Cell::Open; (width * height) as usize])
        .expect("open map dimensions are valid")
}

/// Square map whose border, central row and central column are open and
/// everything else is wall.
///
/// Both spawn corners sit on the border, and the cross keeps every open
/// cell reachable. `size` must be at least 3 for any interior to exist.
#[must_use]
pub fn cross_map(size: u32) -> GridMap {
    let mid = (size / 2) as i32;
    let last = size as i32 - 1;
    let cells: Vec<Cell> = (0..size as i32)
        .flat_map(|x| {
            (0..size as i32).map(move |y| {
                if x == 0 || y == 0 || x == last || y == last || x == mid || y == mid {
                    Cell::Open
                } else {
                    Cell::Wall
                }
            })
        })
        .collect();
    GridMap::from_cells(size, size, cells).expect("cross map dimensions are valid")
}

/// Single open row of `len` cells. The tightest map both spawn corners fit
/// on, useful for forcing encounters.
#[must_use]
pub fn corridor(len: u32) -> GridMap {
    open_map(len, 1)
}

/// Parse a hand-written map literal, panicking on defects.
///
/// Thin wrapper over [`GridMap::parse`] so tests can inline small maps
/// without error plumbing.
///
/// # Panics
///
/// Panics on malformed map text; fixtures take valid literals.
#[must_use]
pub fn parse_map(text: &str) -> GridMap {
    GridMap::parse(text).expect("fixture map literal is valid")
}

/// Configuration with deterministic pill placement and no fruit, for tests
/// that need exact item layouts.
#[must_use]
pub fn quiet_config(pursuers: usize) -> GameConfig {
    GameConfig {
        pill_density: 0.5,
        fruit_probability: 0.0,
        pursuers,
        pill_strategy: PillStrategy::Linear,
        ..GameConfig::default()
    }
}

/// Strategy over small map dimensions that fit both spawn corners.
pub fn arb_dims() -> impl Strategy<Value = (u32, u32)> {
    (2u32..=12, 2u32..=12)
}

/// Strategy over game seeds.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Strategy over the three pill placement strategies.
pub fn arb_pill_strategy() -> impl Strategy<Value = PillStrategy> {
    prop_oneof![
        Just(PillStrategy::Stochastic),
        Just(PillStrategy::Linear),
        Just(PillStrategy::Manhattan),
    ]
}
