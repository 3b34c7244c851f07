use std::io;

use thiserror::Error;

use crate::types::{CategoryName, FeedbackToken, Label};

/// Error type for table loading, schema validation, feedback input, and session failures.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A table row is malformed (wrong column count, empty or duplicate label).
    #[error("malformed table at row {row}: {reason}")]
    DataLoad {
        /// 1-based row number, counting the header as row 1.
        row: usize,
        /// What was wrong with the row.
        reason: String,
    },
    /// An orderable cell is not a finite number.
    #[error(
        "category '{category}' expects a number but got '{value}'{}",
        row.map(|row| format!(" at row {row}")).unwrap_or_default()
    )]
    Parse {
        /// Category whose cell failed to parse.
        category: CategoryName,
        /// Cell value after preprocessing.
        value: String,
        /// Row of the cell, when it came from a table.
        row: Option<usize>,
    },
    /// Profile, table header, and feedback configuration disagree.
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),
    /// A feedback token is not legal for its category.
    #[error("'{token}' is not valid feedback for '{category}' (expected one of: {})", legal.join(", "))]
    InvalidFeedbackToken {
        /// Category the token was entered for.
        category: CategoryName,
        /// Token as entered.
        token: FeedbackToken,
        /// Tokens the category accepts.
        legal: Vec<FeedbackToken>,
    },
    /// A round of feedback left a category without an outcome.
    #[error("feedback is missing an outcome for '{category}'")]
    IncompleteFeedback {
        /// First category with no outcome.
        category: CategoryName,
    },
    /// A round of feedback gave the same category more than once.
    #[error("feedback for '{category}' was entered more than once")]
    DuplicateFeedback {
        /// Category that was repeated.
        category: CategoryName,
    },
    /// No candidate is consistent with the feedback, or there was nothing to choose from.
    #[error("no candidate is consistent with the feedback history ({context})")]
    EmptyCandidateSet {
        /// Which step ran out of candidates.
        context: String,
    },
    /// The label is not in the table.
    #[error("unknown label '{0}'")]
    UnknownLabel(Label),
    /// The session is solved or aborted.
    #[error("session is already {0} and accepts no further input")]
    SessionClosed(&'static str),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// CSV reader failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Profile or opener book JSON failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
