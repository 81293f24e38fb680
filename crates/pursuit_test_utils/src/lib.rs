//! # Pursuit Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Map fixtures and quick configurations
//! - Random-play driver for full games
//! - Determinism test harness
//! - Event log consistency checker
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod driver;
pub mod fixtures;
pub mod log_check;

/// Re-export proptest for convenience.
pub use proptest;
