/// Constants used when parsing raw table cells.
pub mod parsing {
    /// Default delimiter separating tokens of a partial-matchable value (for example `Mid, Top`).
    pub const MULTI_VALUE_DELIMITER: char = ',';
}

/// Feedback tokens accepted at the input boundary.
pub mod feedback {
    /// Outcome token: the guessed value matches exactly.
    pub const TOKEN_CORRECT: &str = "correct";
    /// Outcome token: the guessed value does not match.
    pub const TOKEN_INCORRECT: &str = "incorrect";
    /// Outcome token: the guessed value shares some but not all tokens.
    pub const TOKEN_PARTIAL: &str = "partial";
    /// Outcome token: the target value precedes the guessed value.
    pub const TOKEN_BEFORE: &str = "before";
    /// Alias of [`TOKEN_BEFORE`] used by games that display an arrow pointing down.
    pub const TOKEN_LOWER: &str = "lower";
    /// Outcome token: the target value follows the guessed value.
    pub const TOKEN_AFTER: &str = "after";
    /// Alias of [`TOKEN_AFTER`] used by games that display an arrow pointing up.
    pub const TOKEN_HIGHER: &str = "higher";
}

/// Constants used by discovery sessions.
pub mod session {
    /// Keyword a player types to end the session early.
    pub const GUESSED_KEYWORD: &str = "guessed";
}

/// Constants used by the entropy engine.
pub mod entropy {
    /// Entropy differences at or below this value are treated as ties.
    pub const ENTROPY_TIE_EPSILON: f64 = 1e-9;
    /// Default number of ranked suggestions returned by demo runners.
    pub const DEFAULT_RANKED_SUGGESTIONS: usize = 5;
}

/// Constants used by demo runners.
pub mod apps {
    /// Default seed for sampling self-play targets.
    pub const DEFAULT_SELF_PLAY_SEED: u64 = 42;
    /// Default opener book file name.
    pub const DEFAULT_OPENER_BOOK_FILE: &str = "optimal_guesses.json";
}
