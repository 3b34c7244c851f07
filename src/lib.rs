#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Candidate sets and their cache signatures.
pub mod candidates;
/// Category kinds, parsed values, and per-kind comparison rules.
pub mod category;
/// Solver configuration and game profiles.
pub mod config;
/// Centralized constants used across parsing, feedback, and the entropy engine.
pub mod constants;
/// Records and the immutable record table.
pub mod data;
/// Partition scoring, guess selection, and the score cache.
pub mod entropy;
/// Reusable example runners shared by downstream crates.
pub mod example_apps;
/// Feedback tuples, the feedback simulator, and token parsing.
pub mod feedback;
/// Constraint filtering of candidate sets.
pub mod filter;
mod hash;
/// Aggregate self-play metrics.
pub mod metrics;
/// Persisted opening guesses.
pub mod openers;
/// Automated games against a known target.
pub mod self_play;
/// Interactive discovery sessions.
pub mod session;
/// Solver facade tying a table to its engine.
pub mod solver;
/// Table source traits and built-in sources.
pub mod source;
/// Shared type aliases.
pub mod types;
/// Token normalization helpers.
pub mod utils;

mod errors;

pub use candidates::{CandidateSet, CandidateSignature};
pub use category::{
    CategoryDecl, CategoryKind, CategorySchema, CategoryValue, FeedbackOutcome,
};
pub use config::{GameProfile, GuessPool, SolverConfig};
pub use data::{Record, RecordTable};
pub use entropy::{CacheStats, EntropyEngine, GuessChoice, GuessScore};
pub use errors::SolverError;
pub use feedback::{
    FeedbackConfig, FeedbackConfigEntry, FeedbackInput, FeedbackTuple, UserSignal, simulate,
};
pub use filter::filter;
pub use metrics::GuessStats;
pub use openers::{OpenerBook, OpenerEntry};
pub use self_play::SelfPlayReport;
pub use session::{
    DiscoverySession, GuessRound, RoundResult, SessionOutcome, SessionState, SessionSummary,
    Suggestion,
};
pub use solver::Solver;
pub use source::{CsvSource, InMemorySource, TableSource};
pub use types::{CategoryName, FeedbackToken, Label, ProfileName, RawValue};
