//! Agent identities, roles, and the position registry.
//!
//! Roles are explicit tags. Identifier tokens still follow the wire
//! convention the event log emits (`m`, `m0`, `m1`... for evaders; `0`,
//! `1`... for pursuers), but nothing in the engine dispatches on the token
//! text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{GridMap, Position};

/// What an agent is trying to do in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Consumes pills and fruit; eliminated by pursuer contact.
    Evader,
    /// Eliminates evaders by collision; cannot hold position.
    Pursuer,
}

/// An agent's wire identifier.
///
/// The token appears verbatim in spawn and position records. Identifier
/// sets for the two roles never overlap and are fixed for a game's
/// lifetime.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(String);

impl AgentId {
    /// The primary evader's token.
    #[must_use]
    pub fn evader_primary() -> Self {
        Self("m".into())
    }

    /// Token for the n-th additional evader (`m0`, `m1`, ...).
    #[must_use]
    pub fn evader_extra(n: usize) -> Self {
        Self(format!("m{n}"))
    }

    /// Token for the n-th pursuer (`0`, `1`, ...).
    #[must_use]
    pub fn pursuer(n: usize) -> Self {
        Self(format!("{n}"))
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

/// One agent in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Wire identifier.
    pub id: AgentId,
    /// Tagged role.
    pub role: Role,
    /// Current grid position.
    pub position: Position,
}

/// Mapping from agent identifier to role and current position.
///
/// Iteration order is insertion order (primary evader, extra evaders,
/// pursuers) and is the stable order position records are emitted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    /// Build the roster for a game: `evaders` evaders spawning at the
    /// top-left open corner `(0, height-1)` and `pursuers` pursuers at the
    /// bottom-right open corner `(width-1, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] when `evaders` is zero and
    /// [`GameError::BlockedSpawn`] when a spawn cell is a wall.
    pub fn spawn_roster(grid: &GridMap, evaders: usize, pursuers: usize) -> Result<Self> {
        if evaders == 0 {
            return Err(GameError::InvalidConfig(
                "at least one evader is required".into(),
            ));
        }
        let evader_spawn = Position::new(0, grid.height() as i32 - 1);
        let pursuer_spawn = Position::new(grid.width() as i32 - 1, 0);
        if !grid.is_open(evader_spawn) {
            return Err(GameError::BlockedSpawn {
                x: evader_spawn.x,
                y: evader_spawn.y,
            });
        }
        if pursuers > 0 && !grid.is_open(pursuer_spawn) {
            return Err(GameError::BlockedSpawn {
                x: pursuer_spawn.x,
                y: pursuer_spawn.y,
            });
        }

        let mut agents = Vec::with_capacity(evaders + pursuers);
        agents.push(Agent {
            id: AgentId::evader_primary(),
            role: Role::Evader,
            position: evader_spawn,
        });
        for n in 0..evaders - 1 {
            agents.push(Agent {
                id: AgentId::evader_extra(n),
                role: Role::Evader,
                position: evader_spawn,
            });
        }
        for n in 0..pursuers {
            agents.push(Agent {
                id: AgentId::pursuer(n),
                role: Role::Pursuer,
                position: pursuer_spawn,
            });
        }
        Ok(Self { agents })
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if the registry holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.iter().any(|a| &a.id == id)
    }

    /// Look up an agent.
    #[must_use]
    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// An agent's current position.
    #[must_use]
    pub fn position(&self, id: &AgentId) -> Option<Position> {
        self.get(id).map(|a| a.position)
    }

    /// An agent's role.
    #[must_use]
    pub fn role(&self, id: &AgentId) -> Option<Role> {
        self.get(id).map(|a| a.role)
    }

    /// Move an agent.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownAgent`] for identifiers outside the
    /// roster.
    pub fn set_position(&mut self, id: &AgentId, pos: Position) -> Result<()> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| GameError::UnknownAgent(id.clone()))?;
        agent.position = pos;
        Ok(())
    }

    /// All agents in stable registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Evaders in stable registry order.
    pub fn evaders(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.role == Role::Evader)
    }

    /// Pursuers in stable registry order.
    pub fn pursuers(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.role == Role::Pursuer)
    }
}
