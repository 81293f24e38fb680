//! Event log for rendering and analysis collaborators.
//!
//! The engine appends one record per line of the wire format; downstream
//! tools (renderers, score checkers) parse the text back. The grammar is
//! stable:
//!
//! ```text
//! <width> <height>        header, exactly once, first line
//! <agent_id> <x> <y>      spawn, then per-turn position of each agent that
//!                          acted this turn (an evader's death turn included)
//! w <x> <y>               one per wall cell, once after spawns
//! p <x> <y>               one per initially placed pill, once after walls
//! f <x> <y>               whenever fruit spawns
//! t <time> <score>        exactly once per completed turn (turn 0 included)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;
use crate::error::GameError;
use crate::grid::Position;

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// Map dimensions; always the first record.
    Header {
        /// Map width in cells.
        width: u32,
        /// Map height in cells.
        height: u32,
    },
    /// An agent's position: its spawn at game start, then one for every
    /// turn the agent acted in, including an evader's death turn.
    Agent {
        /// Wire identifier.
        id: AgentId,
        /// Position this turn.
        pos: Position,
    },
    /// A wall cell.
    Wall(Position),
    /// An initially placed pill.
    Pill(Position),
    /// A fruit spawn.
    Fruit(Position),
    /// End of one turn: remaining time and current score.
    Tick {
        /// Remaining time after this turn.
        time: i64,
        /// Score after this turn.
        score: u32,
    },
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { width, height } => write!(f, "{width} {height}"),
            Self::Agent { id, pos } => write!(f, "{id} {} {}", pos.x, pos.y),
            Self::Wall(pos) => write!(f, "w {} {}", pos.x, pos.y),
            Self::Pill(pos) => write!(f, "p {} {}", pos.x, pos.y),
            Self::Fruit(pos) => write!(f, "f {} {}", pos.x, pos.y),
            Self::Tick { time, score } => write!(f, "t {time} {score}"),
        }
    }
}

impl FromStr for Record {
    type Err = GameError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let bad = || GameError::RecordParse(line.to_owned());
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [width, height] => Ok(Self::Header {
                width: width.parse().map_err(|_| bad())?,
                height: height.parse().map_err(|_| bad())?,
            }),
            ["w", x, y] => Ok(Self::Wall(parse_pos(x, y).ok_or_else(bad)?)),
            ["p", x, y] => Ok(Self::Pill(parse_pos(x, y).ok_or_else(bad)?)),
            ["f", x, y] => Ok(Self::Fruit(parse_pos(x, y).ok_or_else(bad)?)),
            ["t", time, score] => Ok(Self::Tick {
                time: time.parse().map_err(|_| bad())?,
                score: score.parse().map_err(|_| bad())?,
            }),
            [id, x, y] => Ok(Self::Agent {
                id: AgentId::from(*id),
                pos: parse_pos(x, y).ok_or_else(bad)?,
            }),
            _ => Err(bad()),
        }
    }
}

fn parse_pos(x: &str, y: &str) -> Option<Position> {
    Some(Position::new(x.parse().ok()?, y.parse().ok()?))
}

/// Append-only ordered sequence of log records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    records: Vec<Record>,
}

impl GameLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// All records in append order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the log as wire-format text, one record per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out
    }
}
