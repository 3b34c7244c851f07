//! Category kinds, parsed cell values, and the per-kind comparison rules.
//!
//! This is the only module that knows how two values of a category compare. Every other
//! component (simulation, filtering, scoring) goes through [`CategorySchema::compare_at`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::feedback::{
    TOKEN_AFTER, TOKEN_BEFORE, TOKEN_CORRECT, TOKEN_HIGHER, TOKEN_INCORRECT, TOKEN_LOWER,
    TOKEN_PARTIAL,
};
use crate::constants::parsing::MULTI_VALUE_DELIMITER;
use crate::errors::SolverError;
use crate::types::CategoryName;
use crate::utils::{category_key, normalize_token, numeric_prefix, split_tokens, truncate_chars};

/// Behavioral type of a feature category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Exact match or not (for example `Gender`).
    YesNo,
    /// Multi-value cell where overlapping values yield a partial match (for example `Roles`).
    PartialMatchable,
    /// Numeric cell compared by order (for example `Release Year`).
    Orderable,
}

/// Outcome reported for one category of a guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    /// Values match exactly.
    Correct,
    /// Values share nothing.
    Incorrect,
    /// Multi-value cells overlap without being equal.
    Partial,
    /// The target's value comes before (is smaller than) the guessed value.
    Before,
    /// The target's value comes after (is larger than) the guessed value.
    After,
}

impl FeedbackOutcome {
    /// Canonical token for this outcome.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Correct => TOKEN_CORRECT,
            Self::Incorrect => TOKEN_INCORRECT,
            Self::Partial => TOKEN_PARTIAL,
            Self::Before => TOKEN_BEFORE,
            Self::After => TOKEN_AFTER,
        }
    }

    /// Parse a token, accepting `lower`/`higher` as aliases of `before`/`after`.
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            TOKEN_CORRECT => Some(Self::Correct),
            TOKEN_INCORRECT => Some(Self::Incorrect),
            TOKEN_PARTIAL => Some(Self::Partial),
            TOKEN_BEFORE | TOKEN_LOWER => Some(Self::Before),
            TOKEN_AFTER | TOKEN_HIGHER => Some(Self::After),
            _ => None,
        }
    }
}

impl fmt::Display for FeedbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A cell value parsed according to its category kind.
#[derive(Clone, Debug, PartialEq)]
pub enum CategoryValue {
    /// Normalized opaque token (yes/no categories).
    Token(String),
    /// Normalized token set (partial-matchable categories).
    Tokens(BTreeSet<String>),
    /// Finite number (orderable categories).
    Number(f64),
}

/// Parses a raw cell; `None` means the cell is not valid for the kind.
pub type ParseFn = fn(&str, char) -> Option<CategoryValue>;
/// Compares a guessed value against a target value.
pub type CompareFn = fn(&CategoryValue, &CategoryValue) -> FeedbackOutcome;

const YES_NO_OUTCOMES: &[FeedbackOutcome] = &[FeedbackOutcome::Correct, FeedbackOutcome::Incorrect];
const PARTIAL_OUTCOMES: &[FeedbackOutcome] = &[
    FeedbackOutcome::Correct,
    FeedbackOutcome::Partial,
    FeedbackOutcome::Incorrect,
];
const ORDERABLE_OUTCOMES: &[FeedbackOutcome] = &[
    FeedbackOutcome::Before,
    FeedbackOutcome::After,
    FeedbackOutcome::Correct,
];

impl CategoryKind {
    /// Outcomes a category of this kind can produce.
    pub const fn legal_outcomes(self) -> &'static [FeedbackOutcome] {
        match self {
            Self::YesNo => YES_NO_OUTCOMES,
            Self::PartialMatchable => PARTIAL_OUTCOMES,
            Self::Orderable => ORDERABLE_OUTCOMES,
        }
    }

    /// Whether `outcome` can be reported for this kind.
    pub fn allows(self, outcome: FeedbackOutcome) -> bool {
        self.legal_outcomes().contains(&outcome)
    }

    /// Raw cell parser for this kind.
    pub fn parser(self) -> ParseFn {
        match self {
            Self::YesNo => parse_token,
            Self::PartialMatchable => parse_token_set,
            Self::Orderable => parse_number,
        }
    }

    /// Guess-versus-target comparator for this kind.
    pub fn comparator(self) -> CompareFn {
        match self {
            Self::YesNo => compare_tokens,
            Self::PartialMatchable => compare_token_sets,
            Self::Orderable => compare_numbers,
        }
    }

    /// Parse `raw` with this kind's parser.
    pub fn parse(self, raw: &str, delimiter: char) -> Option<CategoryValue> {
        (self.parser())(raw, delimiter)
    }

    /// Compare two parsed values with this kind's comparator.
    pub fn compare(self, guess: &CategoryValue, target: &CategoryValue) -> FeedbackOutcome {
        (self.comparator())(guess, target)
    }
}

fn parse_token(raw: &str, _delimiter: char) -> Option<CategoryValue> {
    Some(CategoryValue::Token(normalize_token(raw)))
}

fn parse_token_set(raw: &str, delimiter: char) -> Option<CategoryValue> {
    Some(CategoryValue::Tokens(split_tokens(raw, delimiter)))
}

fn parse_number(raw: &str, _delimiter: char) -> Option<CategoryValue> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(CategoryValue::Number)
}

fn compare_tokens(guess: &CategoryValue, target: &CategoryValue) -> FeedbackOutcome {
    match (guess, target) {
        (CategoryValue::Token(guess), CategoryValue::Token(target)) if guess == target => {
            FeedbackOutcome::Correct
        }
        _ => FeedbackOutcome::Incorrect,
    }
}

fn compare_token_sets(guess: &CategoryValue, target: &CategoryValue) -> FeedbackOutcome {
    match (guess, target) {
        (CategoryValue::Tokens(guess), CategoryValue::Tokens(target)) => {
            if guess == target {
                FeedbackOutcome::Correct
            } else if guess.is_disjoint(target) {
                FeedbackOutcome::Incorrect
            } else {
                FeedbackOutcome::Partial
            }
        }
        _ => FeedbackOutcome::Incorrect,
    }
}

fn compare_numbers(guess: &CategoryValue, target: &CategoryValue) -> FeedbackOutcome {
    match (guess, target) {
        (CategoryValue::Number(guess), CategoryValue::Number(target)) => {
            if target < guess {
                FeedbackOutcome::Before
            } else if target > guess {
                FeedbackOutcome::After
            } else {
                FeedbackOutcome::Correct
            }
        }
        _ => FeedbackOutcome::Incorrect,
    }
}

/// Declaration of one feature category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDecl {
    /// Column name as written in the table header.
    pub name: CategoryName,
    /// How values of this category are parsed and compared.
    pub kind: CategoryKind,
    /// Keep only the first `n` characters of each raw value before parsing
    /// (for example `2019-06-11` reduced to `2019`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate: Option<usize>,
    /// Read only the leading digits of each raw value, or `0` when there are none
    /// (for example `01. Romance Dawn` read as `1`). Applied after `truncate`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub numeric_prefix: bool,
}

impl CategoryDecl {
    /// Declaration with no value preprocessing.
    pub fn new(name: impl Into<CategoryName>, kind: CategoryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            truncate: None,
            numeric_prefix: false,
        }
    }

    /// Yes/no category.
    pub fn yes_no(name: impl Into<CategoryName>) -> Self {
        Self::new(name, CategoryKind::YesNo)
    }

    /// Partial-matchable category.
    pub fn partial(name: impl Into<CategoryName>) -> Self {
        Self::new(name, CategoryKind::PartialMatchable)
    }

    /// Orderable category.
    pub fn orderable(name: impl Into<CategoryName>) -> Self {
        Self::new(name, CategoryKind::Orderable)
    }

    /// Truncate raw values to their first `chars` characters before parsing.
    pub fn with_truncate(mut self, chars: usize) -> Self {
        self.truncate = Some(chars);
        self
    }

    /// Parse only the leading digits of each raw value, defaulting to `0`.
    pub fn with_numeric_prefix(mut self) -> Self {
        self.numeric_prefix = true;
        self
    }
}

/// Ordered set of category declarations shared by a table and its feedback tuples.
#[derive(Clone, Debug)]
pub struct CategorySchema {
    categories: Vec<CategoryDecl>,
    names: Arc<[CategoryName]>,
    positions: HashMap<String, usize>,
    delimiter: char,
}

impl CategorySchema {
    /// Build a schema; category names must be non-empty and unique (case-insensitively).
    pub fn new(categories: Vec<CategoryDecl>) -> Result<Self, SolverError> {
        if categories.is_empty() {
            return Err(SolverError::ConfigurationMismatch(
                "at least one feature category must be declared".to_string(),
            ));
        }
        let mut positions = HashMap::with_capacity(categories.len());
        for (position, decl) in categories.iter().enumerate() {
            let key = category_key(&decl.name);
            if key.is_empty() {
                return Err(SolverError::ConfigurationMismatch(
                    "category names must not be empty".to_string(),
                ));
            }
            if positions.insert(key, position).is_some() {
                return Err(SolverError::ConfigurationMismatch(format!(
                    "category '{}' is declared more than once",
                    decl.name
                )));
            }
        }
        let names = categories
            .iter()
            .map(|decl| decl.name.clone())
            .collect::<Vec<_>>()
            .into();
        Ok(Self {
            categories,
            names,
            positions,
            delimiter: MULTI_VALUE_DELIMITER,
        })
    }

    /// Override the delimiter used to split partial-matchable values.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Delimiter used to split partial-matchable values.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Number of declared categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always `false` for a schema built by [`CategorySchema::new`].
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Declarations in declaration order.
    pub fn categories(&self) -> &[CategoryDecl] {
        &self.categories
    }

    /// Category names in declaration order.
    pub fn names(&self) -> &Arc<[CategoryName]> {
        &self.names
    }

    /// Resolve a category by name; spaces, hyphens, underscores, and case are ignored.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&category_key(name)).copied()
    }

    /// Declaration of the named category.
    pub fn decl(&self, name: &str) -> Option<&CategoryDecl> {
        self.position(name).map(|position| &self.categories[position])
    }

    /// Kind of the category at `position`. Panics when out of range.
    pub fn kind_at(&self, position: usize) -> CategoryKind {
        self.categories[position].kind
    }

    /// Parse the raw cell of the category at `position`. `row` is used only for errors.
    pub fn parse_at(
        &self,
        position: usize,
        raw: &str,
        row: Option<usize>,
    ) -> Result<CategoryValue, SolverError> {
        let decl = &self.categories[position];
        let truncated;
        let mut raw = match decl.truncate {
            Some(chars) => {
                truncated = truncate_chars(raw, chars);
                truncated.as_str()
            }
            None => raw,
        };
        if decl.numeric_prefix {
            raw = numeric_prefix(raw);
        }
        decl.kind
            .parse(raw, self.delimiter)
            .ok_or_else(|| SolverError::Parse {
                category: decl.name.clone(),
                value: raw.to_string(),
                row,
            })
    }

    /// Compare two parsed values of the category at `position`.
    pub fn compare_at(
        &self,
        position: usize,
        guess: &CategoryValue,
        target: &CategoryValue,
    ) -> FeedbackOutcome {
        self.categories[position].kind.compare(guess, target)
    }

    /// Compare two parsed values of the named category.
    pub fn compare(
        &self,
        category: &str,
        guess: &CategoryValue,
        target: &CategoryValue,
    ) -> Result<FeedbackOutcome, SolverError> {
        let position = self.require(category)?;
        Ok(self.compare_at(position, guess, target))
    }

    /// Parse two raw cells of the named category and compare them.
    pub fn compare_raw(
        &self,
        category: &str,
        guess: &str,
        target: &str,
    ) -> Result<FeedbackOutcome, SolverError> {
        let position = self.require(category)?;
        let guess = self.parse_at(position, guess, None)?;
        let target = self.parse_at(position, target, None)?;
        Ok(self.compare_at(position, &guess, &target))
    }

    fn require(&self, category: &str) -> Result<usize, SolverError> {
        self.position(category).ok_or_else(|| {
            SolverError::ConfigurationMismatch(format!("category '{category}' is not declared"))
        })
    }
}
