//! Error types for the game engine.
//!
//! Every error here is fatal for the game instance that raised it: either a
//! configuration defect caught at construction/reset, or a protocol
//! violation by the driving caller caught at turn resolution. The engine has
//! no IO and no partial-failure modes, so nothing is retryable. The event
//! log produced before the failure stays valid and inspectable.

use thiserror::Error;

use crate::agents::AgentId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game engine errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Map has zero width or zero height.
    #[error("Map must have at least one open row and column")]
    EmptyMap,

    /// Map rows have inconsistent lengths.
    #[error("Map is not rectangular: row {row} has {found} cells, expected {expected}")]
    NonRectangularMap {
        /// Index of the offending row.
        row: usize,
        /// Number of cells found in that row.
        found: usize,
        /// Number of cells every row must have.
        expected: usize,
    },

    /// Textual map definition could not be parsed.
    #[error("Failed to parse map: {0}")]
    MapParse(String),

    /// A configuration value is outside its documented range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An agent spawn position lands on a wall.
    #[error("Spawn cell ({x}, {y}) is a wall")]
    BlockedSpawn {
        /// Spawn x coordinate.
        x: i32,
        /// Spawn y coordinate.
        y: i32,
    },

    /// No open, unoccupied cell exists to hold a mandatory pill.
    #[error("No eligible cell for pill placement")]
    NoEligiblePillCell,

    /// Referenced agent identifier is not part of this game.
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// An action was registered or resolved for an eliminated evader.
    #[error("Agent {0} has been eliminated")]
    EliminatedAgent(AgentId),

    /// A registered action is not in the agent's legal action set.
    ///
    /// This is a controller/driver bug; the turn is aborted without
    /// recovery.
    #[error("Illegal action '{action}' for agent {agent}")]
    IllegalAction {
        /// Agent the action was registered for.
        agent: AgentId,
        /// Display token of the offending action.
        action: String,
    },

    /// Turn resolution was requested before every live agent registered an
    /// action.
    #[error("No action registered for agent {0}")]
    MissingAction(AgentId),

    /// An operation was attempted on a finished game.
    #[error("Game is over; no further actions are accepted")]
    GameOver,

    /// A textual log record could not be parsed.
    #[error("Failed to parse log record '{0}'")]
    RecordParse(String),

    /// Snapshot serialization or deserialization failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
