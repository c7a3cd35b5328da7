//! Analysis modules.
//!
//! Median aggregation, leaderboard ranking and ledger statistics.

pub mod aggregator;

pub use aggregator::*;
