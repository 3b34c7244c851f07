//! Feedback tuples, the feedback simulator, and validation of player-entered tokens.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::category::{CategoryKind, CategorySchema, FeedbackOutcome};
use crate::constants::feedback::{
    TOKEN_AFTER, TOKEN_BEFORE, TOKEN_CORRECT, TOKEN_HIGHER, TOKEN_INCORRECT, TOKEN_LOWER,
    TOKEN_PARTIAL,
};
use crate::constants::session::GUESSED_KEYWORD;
use crate::data::Record;
use crate::errors::SolverError;
use crate::types::{CategoryName, FeedbackToken};
use crate::utils::{category_key, normalize_token};

/// One outcome per feature category, in schema order. Always fully populated.
#[derive(Clone, Debug)]
pub struct FeedbackTuple {
    categories: Arc<[CategoryName]>,
    outcomes: Vec<FeedbackOutcome>,
}

impl FeedbackTuple {
    /// Build a tuple from outcomes in schema order, checking each against its category kind.
    pub fn new(schema: &CategorySchema, outcomes: Vec<FeedbackOutcome>) -> Result<Self, SolverError> {
        if outcomes.len() != schema.len() {
            let missing = schema
                .names()
                .get(outcomes.len())
                .cloned()
                .unwrap_or_default();
            if outcomes.len() < schema.len() {
                return Err(SolverError::IncompleteFeedback { category: missing });
            }
            return Err(SolverError::ConfigurationMismatch(format!(
                "feedback has {} outcomes but {} categories are declared",
                outcomes.len(),
                schema.len()
            )));
        }
        for (position, outcome) in outcomes.iter().enumerate() {
            let kind = schema.kind_at(position);
            if !kind.allows(*outcome) {
                return Err(SolverError::InvalidFeedbackToken {
                    category: schema.names()[position].clone(),
                    token: outcome.token().to_string(),
                    legal: kind
                        .legal_outcomes()
                        .iter()
                        .map(|outcome| outcome.token().to_string())
                        .collect(),
                });
            }
        }
        Ok(Self {
            categories: Arc::clone(schema.names()),
            outcomes,
        })
    }

    /// Build a tuple from `(category, outcome)` pairs in any order. Each category may appear once.
    pub fn from_pairs<'a, I>(schema: &CategorySchema, pairs: I) -> Result<Self, SolverError>
    where
        I: IntoIterator<Item = (&'a str, FeedbackOutcome)>,
    {
        let mut slots: Vec<Option<FeedbackOutcome>> = vec![None; schema.len()];
        for (category, outcome) in pairs {
            let position = schema.position(category).ok_or_else(|| {
                SolverError::ConfigurationMismatch(format!("category '{category}' is not declared"))
            })?;
            if slots[position].replace(outcome).is_some() {
                return Err(SolverError::DuplicateFeedback {
                    category: schema.names()[position].clone(),
                });
            }
        }
        let outcomes = fill_slots(schema, slots)?;
        Self::new(schema, outcomes)
    }

    /// Every category correct.
    pub fn all_correct(schema: &CategorySchema) -> Self {
        Self {
            categories: Arc::clone(schema.names()),
            outcomes: vec![FeedbackOutcome::Correct; schema.len()],
        }
    }

    /// Outcome of the named category (case and separators ignored).
    pub fn get(&self, category: &str) -> Option<FeedbackOutcome> {
        let key = category_key(category);
        self.categories
            .iter()
            .position(|name| category_key(name) == key)
            .map(|position| self.outcomes[position])
    }

    /// Outcomes in schema order.
    pub fn outcomes(&self) -> &[FeedbackOutcome] {
        &self.outcomes
    }

    /// `(category, outcome)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeedbackOutcome)> {
        self.categories
            .iter()
            .map(String::as_str)
            .zip(self.outcomes.iter().copied())
    }

    /// Number of categories covered.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the tuple covers no category.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether every category is correct.
    pub fn is_all_correct(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| *outcome == FeedbackOutcome::Correct)
    }
}

impl PartialEq for FeedbackTuple {
    fn eq(&self, other: &Self) -> bool {
        self.outcomes == other.outcomes
            && (Arc::ptr_eq(&self.categories, &other.categories)
                || self.categories == other.categories)
    }
}

impl Eq for FeedbackTuple {}

impl Hash for FeedbackTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.outcomes.hash(state);
    }
}

impl fmt::Display for FeedbackTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (category, outcome)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{category}: {outcome}")?;
        }
        Ok(())
    }
}

/// Feedback `target` would show for `guess`.
///
/// Both records must come from tables sharing `schema`.
pub fn simulate(schema: &CategorySchema, guess: &Record, target: &Record) -> FeedbackTuple {
    let outcomes = guess
        .values()
        .iter()
        .zip(target.values())
        .enumerate()
        .map(|(position, (guess, target))| schema.compare_at(position, guess, target))
        .collect();
    FeedbackTuple {
        categories: Arc::clone(schema.names()),
        outcomes,
    }
}

fn fill_slots(
    schema: &CategorySchema,
    slots: Vec<Option<FeedbackOutcome>>,
) -> Result<Vec<FeedbackOutcome>, SolverError> {
    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| SolverError::IncompleteFeedback {
                category: schema.names()[position].clone(),
            })
        })
        .collect()
}

/// Serializable category configuration entry: a category key and the tokens players may enter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfigEntry {
    /// Category key, matched case-insensitively (`release_year` matches `Release Year`).
    pub category: String,
    /// Legal tokens, for example `["lower", "higher", "correct"]`.
    pub outcomes: Vec<FeedbackToken>,
}

impl FeedbackConfigEntry {
    /// Entry for `category` accepting `outcomes`.
    pub fn new<I, S>(category: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FeedbackToken>,
    {
        Self {
            category: category.into(),
            outcomes: outcomes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Out-of-band input from the player that is not feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSignal {
    /// The player typed the `guessed` keyword and wants to stop.
    Guessed,
}

/// Validated input for one round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedbackInput {
    /// A complete, validated feedback tuple.
    Outcomes(FeedbackTuple),
    /// A session control signal entered instead of feedback.
    Signal(UserSignal),
}

#[derive(Clone, Debug)]
struct ConfigSlot {
    key: String,
    position: usize,
    legal: Vec<(FeedbackToken, FeedbackOutcome)>,
}

/// Prompt order and legal tokens for every category, used to validate typed feedback.
#[derive(Clone, Debug)]
pub struct FeedbackConfig {
    slots: Vec<ConfigSlot>,
    schema: CategorySchema,
}

impl FeedbackConfig {
    /// Default configuration: schema order, every token the category kind allows.
    pub fn for_schema(schema: &CategorySchema) -> Self {
        let slots = schema
            .categories()
            .iter()
            .enumerate()
            .map(|(position, decl)| {
                let tokens: &[&str] = match decl.kind {
                    CategoryKind::YesNo => &[TOKEN_CORRECT, TOKEN_INCORRECT],
                    CategoryKind::PartialMatchable => {
                        &[TOKEN_CORRECT, TOKEN_PARTIAL, TOKEN_INCORRECT]
                    }
                    CategoryKind::Orderable => &[
                        TOKEN_LOWER,
                        TOKEN_HIGHER,
                        TOKEN_BEFORE,
                        TOKEN_AFTER,
                        TOKEN_CORRECT,
                    ],
                };
                ConfigSlot {
                    key: category_key(&decl.name),
                    position,
                    legal: tokens
                        .iter()
                        .filter_map(|token| {
                            FeedbackOutcome::from_token(token)
                                .map(|outcome| (token.to_string(), outcome))
                        })
                        .collect(),
                }
            })
            .collect();
        Self {
            slots,
            schema: schema.clone(),
        }
    }

    /// Validate caller-supplied entries: each must name a declared category exactly once,
    /// every category must be covered, and every token must be legal for its kind.
    pub fn from_entries(
        schema: &CategorySchema,
        entries: &[FeedbackConfigEntry],
    ) -> Result<Self, SolverError> {
        let mut covered = vec![false; schema.len()];
        let mut slots = Vec::with_capacity(entries.len());
        for entry in entries {
            let position = schema.position(&entry.category).ok_or_else(|| {
                SolverError::ConfigurationMismatch(format!(
                    "feedback category '{}' is not declared",
                    entry.category
                ))
            })?;
            if std::mem::replace(&mut covered[position], true) {
                return Err(SolverError::ConfigurationMismatch(format!(
                    "feedback category '{}' is configured more than once",
                    entry.category
                )));
            }
            let kind = schema.kind_at(position);
            let mut legal = Vec::with_capacity(entry.outcomes.len());
            for token in &entry.outcomes {
                let outcome = FeedbackOutcome::from_token(token)
                    .filter(|outcome| kind.allows(*outcome))
                    .ok_or_else(|| {
                        SolverError::ConfigurationMismatch(format!(
                            "token '{token}' is not a legal outcome for category '{}'",
                            entry.category
                        ))
                    })?;
                legal.push((normalize_token(token), outcome));
            }
            slots.push(ConfigSlot {
                key: category_key(&entry.category),
                position,
                legal,
            });
        }
        if let Some(position) = covered.iter().position(|covered| !covered) {
            return Err(SolverError::ConfigurationMismatch(format!(
                "category '{}' has no feedback configuration",
                schema.names()[position]
            )));
        }
        Ok(Self {
            slots,
            schema: schema.clone(),
        })
    }

    /// `(category key, legal tokens)` pairs in prompt order.
    pub fn prompts(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.slots.iter().map(|slot| {
            (
                slot.key.as_str(),
                slot.legal.iter().map(|(token, _)| token.as_str()).collect(),
            )
        })
    }

    /// Legal tokens for the named category, in configured order.
    pub fn legal_tokens(&self, category: &str) -> Option<Vec<&str>> {
        self.slot(category)
            .map(|slot| slot.legal.iter().map(|(token, _)| token.as_str()).collect())
    }

    /// Validate one token for one category.
    pub fn parse_token(&self, category: &str, token: &str) -> Result<FeedbackOutcome, SolverError> {
        let slot = self.slot(category).ok_or_else(|| {
            SolverError::ConfigurationMismatch(format!("category '{category}' is not configured"))
        })?;
        let normalized = normalize_token(token);
        slot.legal
            .iter()
            .find(|(legal, _)| *legal == normalized)
            .map(|(_, outcome)| *outcome)
            .ok_or_else(|| SolverError::InvalidFeedbackToken {
                category: self.schema.names()[slot.position].clone(),
                token: token.to_string(),
                legal: slot.legal.iter().map(|(token, _)| token.clone()).collect(),
            })
    }

    /// Validate a full round of `(category, token)` input.
    ///
    /// The `guessed` keyword in any category short-circuits to [`UserSignal::Guessed`].
    pub fn parse<I, K, V>(&self, entries: I) -> Result<FeedbackInput, SolverError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut slots: Vec<Option<FeedbackOutcome>> = vec![None; self.schema.len()];
        for (category, token) in entries {
            if normalize_token(token.as_ref()) == GUESSED_KEYWORD {
                return Ok(FeedbackInput::Signal(UserSignal::Guessed));
            }
            let outcome = self.parse_token(category.as_ref(), token.as_ref())?;
            if let Some(slot) = self.slot(category.as_ref()) {
                if slots[slot.position].replace(outcome).is_some() {
                    return Err(SolverError::DuplicateFeedback {
                        category: self.schema.names()[slot.position].clone(),
                    });
                }
            }
        }
        let outcomes = fill_slots(&self.schema, slots)?;
        Ok(FeedbackInput::Outcomes(FeedbackTuple::new(
            &self.schema,
            outcomes,
        )?))
    }

    fn slot(&self, category: &str) -> Option<&ConfigSlot> {
        let key = category_key(category);
        self.slots.iter().find(|slot| slot.key == key)
    }
}
