//! Random-play driver.
//!
//! Plays complete games with uniformly random legal actions, the baseline
//! controller for determinism checks, log verification, and benchmarks.
//! The driver's own choices come from a seeded [`GameRng`], separate from
//! the game's internal stream, so a run is reproducible from the pair of
//! seeds.

use pursuit_core::prelude::*;

/// Everything a finished random game leaves behind.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// Final score.
    pub score: u32,
    /// Turns resolved before termination.
    pub turns: u64,
    /// Final state hash.
    pub state_hash: u64,
    /// Rendered event log.
    pub log: String,
    /// Evaders eliminated over the whole game.
    pub eliminated: Vec<AgentId>,
}

/// Play one game to completion with random legal actions.
///
/// # Errors
///
/// Propagates engine errors; with a valid game none are expected, so test
/// callers typically unwrap.
///
/// # Example
///
/// ```
/// use pursuit_test_utils::{driver, fixtures};
///
/// let game = pursuit_core::game::Game::new(
///     fixtures::open_map(6, 6),
///     fixtures::quiet_config(1),
/// )
/// .unwrap();
/// let outcome = driver::play_random_game(game, 99).unwrap();
/// assert!(outcome.turns > 0);
/// ```
pub fn play_random_game(mut game: Game, driver_seed: u64) -> Result<GameOutcome> {
    let mut chooser = GameRng::new(driver_seed);
    let mut turns = 0u64;
    let mut eliminated = Vec::new();

    while !game.is_over() {
        let live: Vec<AgentId> = game
            .agents()
            .iter()
            .filter(|a| !game.graveyard().contains(&a.id))
            .map(|a| a.id.clone())
            .collect();
        for id in &live {
            let legal = game.legal_actions(id)?.to_vec();
            // A boxed-in pursuer has no legal move; such maps are not
            // playable and the fixtures never produce them.
            let action = *chooser
                .pick(&legal)
                .ok_or_else(|| GameError::MissingAction(id.clone()))?;
            game.register_action(id, action)?;
        }
        let events = game.step()?;
        eliminated.extend(events.eliminated);
        turns += 1;
    }

    tracing::debug!(turns, score = game.score(), "random game finished");
    Ok(GameOutcome {
        score: game.score(),
        turns,
        state_hash: game.state_hash(),
        log: game.log().render(),
        eliminated,
    })
}
