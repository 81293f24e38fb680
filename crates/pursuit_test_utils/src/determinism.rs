//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Games must be 100% reproducible from (map, configuration, seed, action
//! stream) for replay analysis and controller evaluation. Sources of
//! non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   State is always walked in registry or position order, never by map
//!   iteration.
//!
//! - **System randomness**: No unseeded randomness anywhere. All stochastic
//!   behavior draws from the game's own seeded generator.
//!
//! - **Thread scheduling**: The engine is single-threaded per game, but
//!   parallel runs of the same game must still agree.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual components (placement, movement, scoring)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full games are reproducible, log and all
//! 4. **Parallel tests**: Running N games in parallel all match

use std::thread;

use pursuit_core::game::Game;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns resolved per run.
    pub turns: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `turns` - Number of turns to resolve per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one turn
/// * `hash` - Function to compute a state hash
///
/// # Example
///
/// ```
/// use pursuit_test_utils::{determinism, fixtures};
/// use pursuit_core::game::Game;
///
/// let result = determinism::verify_determinism(
///     3,
///     10,
///     || Game::new(fixtures::open_map(5, 5), fixtures::quiet_config(0)).unwrap(),
///     |game| {
///         let id = pursuit_core::agents::AgentId::evader_primary();
///         let action = game.legal_actions(&id).unwrap()[0];
///         game.register_action(&id, action).unwrap();
///         game.step().unwrap();
///     },
///     |game| game.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..turns {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Play the same random game several times and verify every run matches.
///
/// Each run builds a fresh game from `setup_fn` and plays it to completion
/// with [`crate::driver::play_random_game`] and the same driver seed,
/// comparing final state hashes and rendered logs.
///
/// # Panics
///
/// Panics if any run diverges, or if the driver hits an engine error.
pub fn verify_full_game_determinism<F>(setup_fn: F, driver_seed: u64, runs: usize)
where
    F: Fn() -> Game,
{
    let outcomes: Vec<_> = (0..runs)
        .map(|_| {
            crate::driver::play_random_game(setup_fn(), driver_seed)
                .expect("random game must complete")
        })
        .collect();
    for pair in outcomes.windows(2) {
        assert_eq!(pair[0].state_hash, pair[1].state_hash, "state hash diverged");
        assert_eq!(pair[0].log, pair[1].log, "event log diverged");
    }
}

/// Run N full games in parallel and verify the final hashes all match.
///
/// This catches non-determinism that only manifests under thread
/// scheduling variations or memory layout differences.
///
/// # Panics
///
/// Panics if the games diverge or a worker thread fails.
pub fn run_parallel_games<F>(setup_fn: F, driver_seed: u64, num_games: usize)
where
    F: Fn() -> Game + Send + Sync,
{
    let setup_ref = &setup_fn;
    let hashes: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                scope.spawn(move || {
                    crate::driver::play_random_game(setup_ref(), driver_seed)
                        .expect("random game must complete")
                        .state_hash
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });
    assert!(
        hashes.windows(2).all(|w| w[0] == w[1]),
        "parallel games diverged: {hashes:?}"
    );
}

/// Snapshot a game, restore it, and check the copies agree.
///
/// # Panics
///
/// Panics if serialization fails or the restored game hashes differently.
pub fn assert_snapshot_round_trip(game: &Game) {
    let bytes = game.to_snapshot().expect("snapshot must serialize");
    let restored = Game::from_snapshot(&bytes).expect("snapshot must deserialize");
    assert_eq!(
        game.state_hash(),
        restored.state_hash(),
        "snapshot round trip changed the state"
    );
}
