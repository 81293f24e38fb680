//! Deterministic turn-based pursuit game engine.
//!
//! A grid-world game where evaders collect pills (and opportunistic fruit)
//! under a time budget while pursuers try to catch them. The crate is a pure
//! simulation core: no rendering, no IO, no system randomness. Controllers
//! drive it through an explicit register-then-step protocol, and every game
//! produces a line-oriented event log that downstream tools can replay and
//! verify.
//!
//! ```
//! use pursuit_core::prelude::*;
//!
//! let grid = GridMap::parse("3 1\n~~~\n").unwrap();
//! let config = GameConfig {
//!     pill_strategy: PillStrategy::Linear,
//!     pill_density: 1.0,
//!     pursuers: 1,
//!     ..GameConfig::default()
//! };
//! let mut game = Game::new(grid, config).unwrap();
//! game.register_action(&AgentId::evader_primary(), Action::Move(Direction::Right)).unwrap();
//! game.register_action(&AgentId::pursuer(0), Action::Move(Direction::Left)).unwrap();
//! let events = game.step().unwrap();
//! assert!(events.game_over);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod agents;
pub mod error;
pub mod game;
pub mod grid;
pub mod items;
pub mod replay;
pub mod rng;
pub mod score;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::actions::{Action, Direction, LegalActionCache};
    pub use crate::agents::{Agent, AgentId, AgentRegistry, Role};
    pub use crate::error::{GameError, Result};
    pub use crate::game::{Game, GameConfig, Observation, Phase, TurnEvents};
    pub use crate::grid::{Cell, GridMap, Position};
    pub use crate::items::{ItemManager, PillStrategy};
    pub use crate::replay::{GameLog, Record};
    pub use crate::rng::GameRng;
}
