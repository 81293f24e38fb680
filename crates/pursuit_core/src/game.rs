//! The turn engine.
//!
//! [`Game`] owns all game state and is the only component with side effects
//! across turns. A driver collects one action per live agent (querying
//! [`Game::legal_actions`], optionally previewing with [`Game::observe`]),
//! registers them, and calls [`Game::step`] to resolve the turn atomically.
//!
//! # Determinism
//!
//! All operations are fully deterministic:
//! - No system randomness; stochastic decisions draw from a seeded
//!   [`GameRng`] carried in the state.
//! - Agents resolve in stable registry order; pills iterate in position
//!   order.
//! - Same map, configuration, seed and action stream always produce the
//!   same event log.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::actions::{self, Action, LegalActionCache};
use crate::agents::{AgentId, AgentRegistry, Role};
use crate::error::{GameError, Result};
use crate::grid::{GridMap, Position};
use crate::items::{ItemManager, PillStrategy};
use crate::replay::{GameLog, Record};
use crate::rng::GameRng;
use crate::score;

/// Game parameters, supplied at construction and fixed for the game's
/// lifetime.
///
/// Deserializable from RON for data-driven evaluation setups:
///
/// ```ron
/// GameConfig(
///     pill_density: 0.1,
///     fruit_probability: 0.2,
///     fruit_bonus: 10,
///     time_multiplier: 2.0,
///     pursuers: 3,
///     evaders: 1,
///     pill_strategy: stochastic,
///     seed: 12345,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Pill placement density/probability, in (0, 1].
    pub pill_density: f64,
    /// Per-turn fruit spawn probability, in [0, 1].
    pub fruit_probability: f64,
    /// Bonus added when a fruit is consumed.
    pub fruit_bonus: u32,
    /// Time budget multiplier; total turns = floor(width * height * this).
    pub time_multiplier: f64,
    /// Number of pursuers (may be zero).
    pub pursuers: usize,
    /// Number of evaders (at least one).
    pub evaders: usize,
    /// Pill placement strategy.
    pub pill_strategy: PillStrategy,
    /// Seed for the game's pseudo-random source.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pill_density: 0.1,
            fruit_probability: 0.2,
            fruit_bonus: 10,
            time_multiplier: 2.0,
            pursuers: 3,
            evaders: 1,
            pill_strategy: PillStrategy::Stochastic,
            seed: 12345,
        }
    }
}

impl GameConfig {
    /// Deserialize a configuration from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for malformed text or an
    /// unrecognized pill strategy.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate all parameter ranges against a map.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for any value outside its
    /// documented range, including a time budget that floors to zero.
    pub fn validate(&self, grid: &GridMap) -> Result<()> {
        if !(self.pill_density > 0.0 && self.pill_density <= 1.0) {
            return Err(GameError::InvalidConfig(format!(
                "pill_density must be in (0, 1], got {}",
                self.pill_density
            )));
        }
        if !(0.0..=1.0).contains(&self.fruit_probability) {
            return Err(GameError::InvalidConfig(format!(
                "fruit_probability must be in [0, 1], got {}",
                self.fruit_probability
            )));
        }
        if self.time_multiplier <= 0.0 {
            return Err(GameError::InvalidConfig(format!(
                "time_multiplier must be positive, got {}",
                self.time_multiplier
            )));
        }
        if self.evaders == 0 {
            return Err(GameError::InvalidConfig(
                "at least one evader is required".into(),
            ));
        }
        if self.initial_time(grid) < 1 {
            return Err(GameError::InvalidConfig(
                "time budget floors to zero turns".into(),
            ));
        }
        Ok(())
    }

    /// Total turn budget for a map: floor(width * height * multiplier).
    #[must_use]
    pub fn initial_time(&self, grid: &GridMap) -> i64 {
        (f64::from(grid.width() * grid.height()) * self.time_multiplier).floor() as i64
    }
}

/// Turn engine state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Collecting one action per live agent.
    AwaitingActions,
    /// Inside an atomic turn resolution. Never observable from outside.
    Resolving,
    /// Terminal; no further actions are accepted.
    GameOver,
}

/// Events generated by one resolved turn, for drivers and analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnEvents {
    /// Evaders eliminated this turn.
    pub eliminated: Vec<AgentId>,
    /// Pills consumed this turn (empty when elimination ended the game).
    pub pills_eaten: Vec<Position>,
    /// Fruit consumed this turn.
    pub fruit_eaten: Option<Position>,
    /// Fruit spawned at the end of this turn.
    pub fruit_spawned: Option<Position>,
    /// Whether this turn reached a terminal state.
    pub game_over: bool,
}

/// Hypothetical post-move view of the world, for controller evaluation.
///
/// The acting agent's position is replaced by the destination of one
/// candidate action; everything else reflects the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// All agent positions, with the candidate move applied.
    pub positions: Vec<(AgentId, Position)>,
    /// Remaining pills in position order.
    pub pills: Vec<Position>,
    /// Active fruit, if any.
    pub fruit: Option<Position>,
}

/// The game state and turn engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    grid: GridMap,
    config: GameConfig,
    registry: AgentRegistry,
    items: ItemManager,
    time: i64,
    initial_time: i64,
    pills_consumed: u32,
    bonus: u32,
    score: u32,
    graveyard: BTreeSet<AgentId>,
    phase: Phase,
    registered: HashMap<AgentId, Action>,
    #[serde(skip)]
    legal_cache: LegalActionCache,
    rng: GameRng,
    log: GameLog,
}

impl Game {
    /// Create a game on a map and reset it to its initial state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for out-of-range parameters, blocked
    /// spawn cells, or a map without an eligible pill cell.
    pub fn new(grid: GridMap, config: GameConfig) -> Result<Self> {
        config.validate(&grid)?;
        let rng = GameRng::new(config.seed);
        let mut game = Self {
            registry: AgentRegistry::default(),
            items: ItemManager::new(),
            time: 0,
            initial_time: 0,
            pills_consumed: 0,
            bonus: 0,
            score: 0,
            graveyard: BTreeSet::new(),
            phase: Phase::AwaitingActions,
            registered: HashMap::new(),
            legal_cache: LegalActionCache::new(),
            rng,
            log: GameLog::new(),
            grid,
            config,
        };
        game.reset()?;
        Ok(game)
    }

    /// Re-initialize the game: respawn agents, re-place pills, reset
    /// counters and start a fresh log.
    ///
    /// The pseudo-random stream continues across resets, so a stochastic
    /// strategy may place pills differently each time while staying
    /// reproducible from the construction seed.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Game::new`].
    pub fn reset(&mut self) -> Result<()> {
        self.registry =
            AgentRegistry::spawn_roster(&self.grid, self.config.evaders, self.config.pursuers)?;
        let spawns: Vec<Position> = self.registry.iter().map(|a| a.position).collect();
        self.items.place_pills(
            &self.grid,
            &spawns,
            self.config.pill_strategy,
            self.config.pill_density,
            &mut self.rng,
        )?;

        self.time = self.config.initial_time(&self.grid);
        self.initial_time = self.time;
        self.pills_consumed = 0;
        self.bonus = 0;
        self.score = 0;
        self.graveyard.clear();
        self.registered.clear();
        self.legal_cache.clear();
        self.phase = Phase::AwaitingActions;

        self.log = GameLog::new();
        self.log.push(Record::Header {
            width: self.grid.width(),
            height: self.grid.height(),
        });
        for agent in self.registry.iter() {
            self.log.push(Record::Agent {
                id: agent.id.clone(),
                pos: agent.position,
            });
        }
        for wall in self.grid.wall_positions() {
            self.log.push(Record::Wall(wall));
        }
        for pill in self.items.pills() {
            self.log.push(Record::Pill(pill));
        }
        self.log.push(Record::Tick {
            time: self.time,
            score: self.score,
        });
        Ok(())
    }

    /// The legal actions for an agent this turn, memoized until the next
    /// turn resolves.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownAgent`] for identifiers outside the
    /// roster and [`GameError::EliminatedAgent`] for evaders in the
    /// graveyard.
    pub fn legal_actions(&mut self, id: &AgentId) -> Result<&[Action]> {
        let agent = self
            .registry
            .get(id)
            .ok_or_else(|| GameError::UnknownAgent(id.clone()))?;
        if self.graveyard.contains(id) {
            return Err(GameError::EliminatedAgent(id.clone()));
        }
        let (pos, role) = (agent.position, agent.role);
        Ok(self.legal_cache.get_or_compute(&self.grid, id, pos, role))
    }

    /// A hypothetical view of the world after `id` takes `action`, for
    /// controllers scoring candidate moves.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownAgent`] / [`GameError::EliminatedAgent`]
    /// as [`legal_actions`](Self::legal_actions) does, and
    /// [`GameError::IllegalAction`] when the candidate is not legal.
    pub fn observe(&self, id: &AgentId, action: Action) -> Result<Observation> {
        let agent = self
            .registry
            .get(id)
            .ok_or_else(|| GameError::UnknownAgent(id.clone()))?;
        if self.graveyard.contains(id) {
            return Err(GameError::EliminatedAgent(id.clone()));
        }
        if !actions::legal_actions(&self.grid, agent.position, agent.role).contains(&action) {
            return Err(GameError::IllegalAction {
                agent: id.clone(),
                action: action.to_string(),
            });
        }
        let (dx, dy) = action.delta();
        let dest = agent.position.offset(dx, dy);
        let positions = self
            .registry
            .iter()
            .map(|a| {
                let pos = if &a.id == id { dest } else { a.position };
                (a.id.clone(), pos)
            })
            .collect();
        Ok(Observation {
            positions,
            pills: self.items.pills().collect(),
            fruit: self.items.fruit(),
        })
    }

    /// Register an action for an agent this turn. Registering twice in the
    /// same turn overwrites the earlier choice (last write wins).
    ///
    /// Legality is checked when the turn resolves, not here.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameOver`] after termination,
    /// [`GameError::UnknownAgent`] for identifiers outside the roster, and
    /// [`GameError::EliminatedAgent`] for evaders in the graveyard.
    pub fn register_action(&mut self, id: &AgentId, action: Action) -> Result<()> {
        if self.phase == Phase::GameOver {
            return Err(GameError::GameOver);
        }
        if !self.registry.contains(id) {
            return Err(GameError::UnknownAgent(id.clone()));
        }
        if self.graveyard.contains(id) {
            return Err(GameError::EliminatedAgent(id.clone()));
        }
        self.registered.insert(id.clone(), action);
        Ok(())
    }

    /// Check whether every live agent has a registered action.
    #[must_use]
    pub fn actions_ready(&self) -> bool {
        self.registry
            .iter()
            .filter(|a| !self.graveyard.contains(&a.id))
            .all(|a| self.registered.contains_key(&a.id))
    }

    /// Resolve one turn atomically.
    ///
    /// Moves apply simultaneously: every agent steps from its snapshotted
    /// position, so two agents may exchange cells within one turn (which
    /// counts as contact, see the swap rule below).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameOver`] after termination,
    /// [`GameError::MissingAction`] when a live agent has not registered,
    /// and [`GameError::IllegalAction`] when a registered action is outside
    /// the agent's legal set (a protocol violation; the turn aborts).
    pub fn step(&mut self) -> Result<TurnEvents> {
        if self.phase == Phase::GameOver {
            return Err(GameError::GameOver);
        }
        for agent in self.registry.iter() {
            if !self.graveyard.contains(&agent.id) && !self.registered.contains_key(&agent.id) {
                return Err(GameError::MissingAction(agent.id.clone()));
            }
        }
        self.phase = Phase::Resolving;

        // Explicit cache invalidation opens every resolution.
        self.legal_cache.clear();
        self.time -= 1;

        let old_positions: HashMap<AgentId, Position> = self
            .registry
            .iter()
            .map(|a| (a.id.clone(), a.position))
            .collect();
        let dead_before: BTreeSet<AgentId> = self.graveyard.clone();

        // Apply all moves from the snapshot, recording what evaders touch.
        let mut touched_pills: BTreeSet<Position> = BTreeSet::new();
        let mut touched_fruit: Option<Position> = None;
        let order: Vec<(AgentId, Role, Position)> = self
            .registry
            .iter()
            .map(|a| (a.id.clone(), a.role, a.position))
            .collect();
        for (id, role, pos) in order {
            if self.graveyard.contains(&id) {
                continue;
            }
            let action = *self
                .registered
                .get(&id)
                .ok_or_else(|| GameError::MissingAction(id.clone()))?;
            if !actions::legal_actions(&self.grid, pos, role).contains(&action) {
                return Err(GameError::IllegalAction {
                    agent: id,
                    action: action.to_string(),
                });
            }
            let (dx, dy) = action.delta();
            let dest = pos.offset(dx, dy);
            self.registry.set_position(&id, dest)?;
            if role == Role::Evader {
                if self.items.has_pill(dest) {
                    touched_pills.insert(dest);
                }
                if self.items.fruit() == Some(dest) {
                    touched_fruit = Some(dest);
                }
            }
        }

        // Collision detection against new positions plus the snapshot. An
        // evader dies on shared destination or on swapping cells with a
        // pursuer within the turn.
        let pursuers: Vec<(AgentId, Position)> = self
            .registry
            .pursuers()
            .map(|a| (a.id.clone(), a.position))
            .collect();
        let evaders: Vec<(AgentId, Position)> = self
            .registry
            .evaders()
            .map(|a| (a.id.clone(), a.position))
            .collect();
        let mut eliminated = Vec::new();
        for (evader_id, evader_new) in &evaders {
            if self.graveyard.contains(evader_id) {
                continue;
            }
            let evader_old = old_positions[evader_id];
            let caught = pursuers.iter().any(|(pursuer_id, pursuer_new)| {
                *pursuer_new == *evader_new
                    || (*evader_new == old_positions[pursuer_id] && *pursuer_new == evader_old)
            });
            if caught {
                self.graveyard.insert(evader_id.clone());
                eliminated.push(evader_id.clone());
                tracing::trace!(agent = %evader_id, "evader eliminated");
            }
        }

        let mut events = TurnEvents {
            eliminated,
            ..TurnEvents::default()
        };

        let all_evaders_dead = self
            .registry
            .evaders()
            .all(|a| self.graveyard.contains(&a.id));
        if all_evaders_dead {
            // Elimination ends the game before item and score updates.
            self.phase = Phase::GameOver;
        } else {
            for &pill in &touched_pills {
                self.items.take_pill(pill);
                self.pills_consumed += 1;
                events.pills_eaten.push(pill);
            }
            if !touched_pills.is_empty() {
                self.update_score();
            }
            if let Some(pos) = touched_fruit {
                self.items.take_fruit();
                self.bonus += self.config.fruit_bonus;
                events.fruit_eaten = Some(pos);
                self.update_score();
            }
            if self.items.pills_remaining() == 0 {
                self.phase = Phase::GameOver;
                self.bonus += score::time_bonus(self.time, self.initial_time);
                self.update_score();
            } else if self.time <= 0 {
                // Timing out earns no completion bonus.
                self.phase = Phase::GameOver;
            }
        }

        // Position records cover every agent that acted this turn. An
        // evader eliminated just now still logs its final cell, so scores
        // stay derivable from the log alone; it disappears from the next
        // turn onward.
        for agent in self.registry.iter() {
            if !dead_before.contains(&agent.id) {
                self.log.push(Record::Agent {
                    id: agent.id.clone(),
                    pos: agent.position,
                });
            }
        }
        let evader_positions: Vec<Position> =
            self.registry.evaders().map(|a| a.position).collect();
        events.fruit_spawned = self.items.maybe_spawn_fruit(
            &self.grid,
            &evader_positions,
            self.config.fruit_probability,
            &mut self.rng,
        );
        if let Some(pos) = events.fruit_spawned {
            self.log.push(Record::Fruit(pos));
            tracing::trace!(x = pos.x, y = pos.y, "fruit spawned");
        }
        self.log.push(Record::Tick {
            time: self.time,
            score: self.score,
        });

        self.registered.clear();
        if self.phase != Phase::GameOver {
            self.phase = Phase::AwaitingActions;
        }
        events.game_over = self.phase == Phase::GameOver;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(time = self.time, state_hash = hash, "turn resolved");
        }

        Ok(events)
    }

    fn update_score(&mut self) {
        self.score = score::total(
            self.pills_consumed,
            self.items.pills_remaining() as u32,
            self.bonus,
        );
    }

    /// The map this game is played on.
    #[must_use]
    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// The configuration this game was built with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current engine phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Check whether the game reached a terminal state.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Remaining time counter.
    #[must_use]
    pub const fn time_remaining(&self) -> i64 {
        self.time
    }

    /// The turn budget the game started with.
    #[must_use]
    pub const fn initial_time(&self) -> i64 {
        self.initial_time
    }

    /// Pills consumed so far.
    #[must_use]
    pub const fn pills_consumed(&self) -> u32 {
        self.pills_consumed
    }

    /// Pills still on the map.
    #[must_use]
    pub fn pills_remaining(&self) -> usize {
        self.items.pills_remaining()
    }

    /// An agent's current position.
    #[must_use]
    pub fn position(&self, id: &AgentId) -> Option<Position> {
        self.registry.position(id)
    }

    /// The agent registry.
    #[must_use]
    pub fn agents(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Identifiers of eliminated evaders.
    #[must_use]
    pub fn graveyard(&self) -> &BTreeSet<AgentId> {
        &self.graveyard
    }

    /// The event log accumulated so far.
    #[must_use]
    pub fn log(&self) -> &GameLog {
        &self.log
    }

    /// Hash of all mutable state, in a stable order.
    ///
    /// Two games with identical map, configuration, seed and action stream
    /// produce identical hashes turn by turn.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.time.hash(&mut hasher);
        self.pills_consumed.hash(&mut hasher);
        self.bonus.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        for agent in self.registry.iter() {
            agent.id.as_str().hash(&mut hasher);
            agent.position.hash(&mut hasher);
        }
        for pill in self.items.pills() {
            pill.hash(&mut hasher);
        }
        self.items.fruit().hash(&mut hasher);
        for dead in &self.graveyard {
            dead.as_str().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Serialize the full game state for checkpointing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if serialization fails.
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Snapshot(e.to_string()))
    }

    /// Restore a game from [`to_snapshot`](Self::to_snapshot) bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if deserialization fails.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GameError::Snapshot(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Direction;
    use crate::grid::Cell;

    fn open_row(len: u32) -> GridMap {
        GridMap::from_cells(len, 1, vec![Cell::Open; len as usize]).unwrap()
    }

    /// 3x1 row: evader spawns at (0,0), pursuer at (2,0), pill at (1,0).
    fn duel() -> Game {
        let config = GameConfig {
            pill_density: 1.0,
            fruit_probability: 0.0,
            pursuers: 1,
            evaders: 1,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        Game::new(open_row(3), config).unwrap()
    }

    fn evader() -> AgentId {
        AgentId::evader_primary()
    }

    fn pursuer() -> AgentId {
        AgentId::pursuer(0)
    }

    #[test]
    fn test_initial_state_and_log_prefix() {
        let game = duel();
        assert_eq!(game.phase(), Phase::AwaitingActions);
        assert_eq!(game.time_remaining(), 6);
        assert_eq!(game.pills_remaining(), 1);
        assert_eq!(game.score(), 0);

        let lines = game.log().render();
        assert_eq!(lines, "3 1\nm 0 0\n0 2 0\np 1 0\nt 6 0\n");
    }

    #[test]
    fn test_swap_collision_eliminates_evader() {
        let mut game = duel();
        // Close the gap first: pursuer steps next to the evader.
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert!(events.eliminated.is_empty());

        // They now trade cells without ever sharing one.
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.eliminated, vec![evader()]);
        assert!(events.game_over);
        // Elimination skips item processing: the touched pill survives.
        assert!(events.pills_eaten.is_empty());
        assert_eq!(game.pills_remaining(), 1);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_direct_collision_eliminates_evader() {
        let mut game = duel();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();

        // The evader holds at (0,0) and the pursuer steps onto it.
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.eliminated, vec![evader()]);
        assert!(game.is_over());
    }

    #[test]
    fn test_last_pill_awards_time_bonus() {
        let config = GameConfig {
            pill_density: 0.3,
            fruit_probability: 0.0,
            pursuers: 1,
            evaders: 1,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        // 5x1: eligible cells (1,0) (2,0) (3,0); k = 3 keeps only (1,0).
        let mut game = Game::new(open_row(5), config).unwrap();
        assert_eq!(game.pills_remaining(), 1);
        assert_eq!(game.initial_time(), 10);

        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert!(events.game_over);
        assert_eq!(events.pills_eaten, vec![Position::new(1, 0)]);
        // Pill share 100 plus floor(100 * 9 / 10).
        assert_eq!(game.score(), 190);
        assert_eq!(game.phase(), Phase::GameOver);
    }

    #[test]
    fn test_time_expiry_ends_without_bonus() {
        let mut game = duel();
        for turn in 0..6 {
            assert!(!game.is_over(), "game ended early on turn {turn}");
            game.register_action(&evader(), Action::Hold).unwrap();
            // Oscillate on the right side, never reaching the evader.
            let dir = if turn % 2 == 0 {
                Direction::Left
            } else {
                Direction::Right
            };
            game.register_action(&pursuer(), Action::Move(dir)).unwrap();
            game.step().unwrap();
        }
        assert!(game.is_over());
        assert_eq!(game.time_remaining(), 0);
        assert_eq!(game.score(), 0);
        assert_eq!(game.pills_remaining(), 1);
    }

    #[test]
    fn test_illegal_action_is_a_protocol_violation() {
        let mut game = duel();
        game.register_action(&evader(), Action::Move(Direction::Up))
            .unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        assert!(matches!(
            game.step(),
            Err(GameError::IllegalAction { .. })
        ));
    }

    #[test]
    fn test_step_requires_all_live_agents() {
        let mut game = duel();
        game.register_action(&evader(), Action::Hold).unwrap();
        assert!(matches!(game.step(), Err(GameError::MissingAction(_))));
    }

    #[test]
    fn test_last_registration_wins() {
        let config = GameConfig {
            pill_density: 1.0,
            fruit_probability: 0.0,
            pursuers: 0,
            evaders: 1,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        let mut game = Game::new(open_row(3), config).unwrap();
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.step().unwrap();
        assert_eq!(game.position(&evader()), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_game_over_rejects_further_input() {
        let mut game = duel();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();
        assert!(game.is_over());

        assert!(matches!(
            game.register_action(&evader(), Action::Hold),
            Err(GameError::GameOver)
        ));
        assert!(matches!(game.step(), Err(GameError::GameOver)));
    }

    #[test]
    fn test_fruit_cycle_on_a_corridor() {
        let config = GameConfig {
            pill_density: 1.0,
            fruit_probability: 1.0,
            fruit_bonus: 10,
            pursuers: 0,
            evaders: 1,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        let mut game = Game::new(open_row(3), config).unwrap();
        // Pills at (1,0) and (2,0); no cell is free for fruit yet.
        assert_eq!(game.pills_remaining(), 2);

        // Turn 1: eat the pill at (1,0); fruit can only appear at (0,0).
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.fruit_spawned, Some(Position::new(0, 0)));

        // Turn 2: walk back onto the fruit.
        game.register_action(&evader(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.fruit_eaten, Some(Position::new(0, 0)));
        assert_eq!(game.score(), 60);
        // It respawns on the only free cell, (1,0).
        assert_eq!(events.fruit_spawned, Some(Position::new(1, 0)));

        // Turn 3: eat it again on the way to the last pill.
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.fruit_eaten, Some(Position::new(1, 0)));

        // Turn 4: last pill ends the game with a time bonus.
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        let events = game.step().unwrap();
        assert!(events.game_over);
        // Pill share 100, fruit 2 * 10, time bonus floor(100 * 2 / 6).
        assert_eq!(game.score(), 153);

        let fruit_records = game
            .log()
            .records()
            .iter()
            .filter(|r| matches!(r, Record::Fruit(_)))
            .count();
        assert_eq!(fruit_records, 3);
    }

    #[test]
    fn test_eliminated_evader_stops_acting_and_logging() {
        let config = GameConfig {
            pill_density: 1.0,
            fruit_probability: 0.0,
            pursuers: 1,
            evaders: 2,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        // 5x1 keeps the second evader and a pill away from the carnage.
        let mut game = Game::new(open_row(5), config).unwrap();
        let second = AgentId::evader_extra(0);

        // Primary marches right while the pursuer marches left; they meet
        // head-on at (2,0) on the second turn.
        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.register_action(&second, Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();

        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.register_action(&second, Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        let events = game.step().unwrap();
        assert_eq!(events.eliminated, vec![evader()]);
        assert!(!game.is_over());
        // A surviving evader keeps the game running, so the pill the dead
        // one touched on its final move still counts.
        assert_eq!(events.pills_eaten, vec![Position::new(2, 0)]);
        assert_eq!(game.pills_remaining(), 1);

        // The death turn still logs the evader's final cell, where it ate
        // the pill; afterwards it accepts no actions and emits nothing.
        assert!(game.log().records().contains(&Record::Agent {
            id: evader(),
            pos: Position::new(2, 0),
        }));
        assert!(matches!(
            game.register_action(&evader(), Action::Hold),
            Err(GameError::EliminatedAgent(_))
        ));
        let before = position_records_for(&game, "m");
        assert_eq!(before, 3); // spawn plus two turns acted
        game.register_action(&second, Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Right))
            .unwrap();
        game.step().unwrap();
        assert_eq!(position_records_for(&game, "m"), before);
    }

    fn position_records_for(game: &Game, token: &str) -> usize {
        game.log()
            .records()
            .iter()
            .filter(|r| matches!(r, Record::Agent { id, .. } if id.as_str() == token))
            .count()
    }

    #[test]
    fn test_reset_is_reusable_and_valid() {
        let mut game = duel();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();

        game.reset().unwrap();
        assert_eq!(game.phase(), Phase::AwaitingActions);
        assert_eq!(game.time_remaining(), 6);
        assert_eq!(game.score(), 0);
        assert!(game.graveyard().is_empty());
        assert!(game.pills_remaining() >= 1);
        assert!(matches!(
            game.log().records()[0],
            Record::Header { width: 3, height: 1 }
        ));
    }

    #[test]
    fn test_legal_cache_refreshes_after_step() {
        let config = GameConfig {
            pill_density: 1.0,
            fruit_probability: 0.0,
            pursuers: 0,
            evaders: 1,
            pill_strategy: PillStrategy::Linear,
            ..GameConfig::default()
        };
        let mut game = Game::new(open_row(2), config).unwrap();
        let at_left = game.legal_actions(&evader()).unwrap().to_vec();
        assert!(!at_left.contains(&Action::Move(Direction::Left)));

        game.register_action(&evader(), Action::Move(Direction::Right))
            .unwrap();
        game.step().unwrap();
        let at_right = game.legal_actions(&evader()).unwrap().to_vec();
        assert!(at_right.contains(&Action::Move(Direction::Left)));
        assert!(!at_right.contains(&Action::Move(Direction::Right)));
    }

    #[test]
    fn test_config_validation() {
        let grid = open_row(3);
        let bad_density = GameConfig {
            pill_density: 0.0,
            ..GameConfig::default()
        };
        assert!(bad_density.validate(&grid).is_err());

        let bad_prob = GameConfig {
            fruit_probability: 1.5,
            ..GameConfig::default()
        };
        assert!(bad_prob.validate(&grid).is_err());

        let bad_mult = GameConfig {
            time_multiplier: 0.0,
            ..GameConfig::default()
        };
        assert!(bad_mult.validate(&grid).is_err());

        let no_evaders = GameConfig {
            evaders: 0,
            ..GameConfig::default()
        };
        assert!(no_evaders.validate(&grid).is_err());

        let zero_budget = GameConfig {
            time_multiplier: 0.1,
            ..GameConfig::default()
        };
        assert!(matches!(
            zero_budget.validate(&grid),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_ron() {
        let config = GameConfig::from_ron(
            "(pill_density: 0.5, pursuers: 2, pill_strategy: manhattan, seed: 7)",
        )
        .unwrap();
        assert_eq!(config.pill_density, 0.5);
        assert_eq!(config.pursuers, 2);
        assert_eq!(config.pill_strategy, PillStrategy::Manhattan);
        assert_eq!(config.seed, 7);
        // Unspecified fields keep their defaults.
        assert_eq!(config.fruit_bonus, 10);

        assert!(GameConfig::from_ron("(pill_strategy: spiral)").is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut game = duel();
        game.register_action(&evader(), Action::Hold).unwrap();
        game.register_action(&pursuer(), Action::Move(Direction::Left))
            .unwrap();
        game.step().unwrap();

        let bytes = game.to_snapshot().unwrap();
        let restored = Game::from_snapshot(&bytes).unwrap();
        assert_eq!(game.state_hash(), restored.state_hash());
        assert_eq!(game.log().render(), restored.log().render());
    }

    #[test]
    fn test_unknown_agent_is_rejected() {
        let mut game = duel();
        let stranger = AgentId::pursuer(9);
        assert!(matches!(
            game.legal_actions(&stranger),
            Err(GameError::UnknownAgent(_))
        ));
        assert!(matches!(
            game.register_action(&stranger, Action::Hold),
            Err(GameError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_observe_projects_candidate_move() {
        let game = duel();
        let obs = game
            .observe(&evader(), Action::Move(Direction::Right))
            .unwrap();
        assert!(obs
            .positions
            .contains(&(evader(), Position::new(1, 0))));
        assert!(obs
            .positions
            .contains(&(pursuer(), Position::new(2, 0))));
        assert_eq!(obs.pills, vec![Position::new(1, 0)]);
        assert_eq!(obs.fruit, None);
        // The real state is untouched.
        assert_eq!(game.position(&evader()), Some(Position::new(0, 0)));

        assert!(matches!(
            game.observe(&evader(), Action::Move(Direction::Up)),
            Err(GameError::IllegalAction { .. })
        ));
        assert!(matches!(
            game.observe(&pursuer(), Action::Hold),
            Err(GameError::IllegalAction { .. })
        ));
    }
}
