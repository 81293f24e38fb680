//! Scoring model.
//!
//! Scores are recomputed from counters each time, never incremented in
//! place, so the reported value can always be re-derived from the event log.

/// Pill completion share: `floor(100 * consumed / (consumed + remaining))`.
///
/// Callers uphold `consumed + remaining >= 1`; pill placement guarantees at
/// least one pill exists for the whole live game.
#[must_use]
pub fn pill_score(consumed: u32, remaining: u32) -> u32 {
    debug_assert!(consumed + remaining >= 1, "pill totals must be non-zero");
    (u64::from(consumed) * 100 / (u64::from(consumed) + u64::from(remaining))) as u32
}

/// Completion bonus for clearing the last pill with time to spare:
/// `floor(100 * remaining_time / initial_time)`.
///
/// No bonus is awarded when time simply runs out; that asymmetry is part of
/// the rules.
#[must_use]
pub fn time_bonus(remaining_time: i64, initial_time: i64) -> u32 {
    debug_assert!(initial_time >= 1, "time budget must be positive");
    (remaining_time.max(0) * 100 / initial_time) as u32
}

/// Total score: pill share plus the accumulated bonus.
#[must_use]
pub fn total(consumed: u32, remaining: u32, bonus: u32) -> u32 {
    pill_score(consumed, remaining) + bonus
}
