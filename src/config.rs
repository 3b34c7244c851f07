use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::{CategoryDecl, CategorySchema};
use crate::constants::parsing::MULTI_VALUE_DELIMITER;
use crate::errors::SolverError;
use crate::feedback::{FeedbackConfig, FeedbackConfigEntry};
use crate::types::{CategoryName, ProfileName};
use crate::utils::category_key;

/// Which records are scored as prospective guesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessPool {
    /// Only records still consistent with the feedback so far.
    #[default]
    Candidates,
    /// Every record in the table, including ones already ruled out.
    ///
    /// An eliminated record can split the remaining candidates better than any
    /// candidate can, at the cost of never being the answer itself.
    FullTable,
}

/// Top-level solver configuration.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Guesses considered by the entropy engine.
    pub guess_pool: GuessPool,
    /// Score uncached guesses on the rayon thread pool.
    pub parallel_scoring: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            guess_pool: GuessPool::Candidates,
            parallel_scoring: false,
        }
    }
}

impl SolverConfig {
    /// Set which records are scored as guesses.
    pub fn with_guess_pool(mut self, guess_pool: GuessPool) -> Self {
        self.guess_pool = guess_pool;
        self
    }

    /// Toggle rayon scoring.
    pub fn with_parallel_scoring(mut self, parallel_scoring: bool) -> Self {
        self.parallel_scoring = parallel_scoring;
        self
    }
}

/// Everything needed to play one game: its table layout, category kinds, and the
/// feedback tokens its interface shows.
///
/// Profiles are plain data and can be stored as JSON:
///
/// ```json
/// {
///   "display_name": "Warframedle",
///   "label_column": "Frame",
///   "categories": [
///     { "name": "Gender", "kind": "yes_no" },
///     { "name": "Roles", "kind": "partial_matchable" },
///     { "name": "Release", "kind": "orderable", "truncate": 4 }
///   ]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProfile {
    /// Name shown to players and used as the opener book key.
    pub display_name: ProfileName,
    /// Column holding the unique record label.
    pub label_column: CategoryName,
    /// Feature categories in prompt order.
    pub categories: Vec<CategoryDecl>,
    /// Table columns that are neither the label nor a category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_columns: Vec<CategoryName>,
    /// Delimiter for partial-matchable cells.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Legal feedback tokens per category; derived from the category kinds when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<FeedbackConfigEntry>>,
}

fn default_delimiter() -> char {
    MULTI_VALUE_DELIMITER
}

impl GameProfile {
    /// Profile with no categories, `,` as delimiter, and derived feedback tokens.
    pub fn new(display_name: impl Into<ProfileName>, label_column: impl Into<CategoryName>) -> Self {
        Self {
            display_name: display_name.into(),
            label_column: label_column.into(),
            categories: Vec::new(),
            ignored_columns: Vec::new(),
            delimiter: MULTI_VALUE_DELIMITER,
            feedback: None,
        }
    }

    /// Append a category; order is prompt order.
    pub fn with_category(mut self, category: CategoryDecl) -> Self {
        self.categories.push(category);
        self
    }

    /// Allow a header column that is neither label nor category.
    pub fn with_ignored_column(mut self, column: impl Into<CategoryName>) -> Self {
        self.ignored_columns.push(column.into());
        self
    }

    /// Delimiter for partial-matchable cells.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replace the derived feedback tokens.
    pub fn with_feedback(mut self, feedback: Vec<FeedbackConfigEntry>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Read a JSON profile from disk.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a JSON profile.
    pub fn from_json_str(json: &str) -> Result<Self, SolverError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validated category schema for this profile.
    pub fn schema(&self) -> Result<CategorySchema, SolverError> {
        let label_key = category_key(&self.label_column);
        if self.categories.iter().any(|decl| category_key(&decl.name) == label_key) {
            return Err(SolverError::ConfigurationMismatch(format!(
                "label column '{}' cannot also be a feature category",
                self.label_column
            )));
        }
        Ok(CategorySchema::new(self.categories.clone())?.with_delimiter(self.delimiter))
    }

    /// Feedback configuration validated against `schema`.
    pub fn feedback_config(&self, schema: &CategorySchema) -> Result<FeedbackConfig, SolverError> {
        match &self.feedback {
            Some(entries) => FeedbackConfig::from_entries(schema, entries),
            None => Ok(FeedbackConfig::for_schema(schema)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryKind;
    use tempfile::tempdir;

    #[test]
    fn profile_json_applies_defaults() {
        let profile = GameProfile::from_json_str(
            r#"{
                "display_name": "Warframedle",
                "label_column": "Frame",
                "categories": [
                    { "name": "Gender", "kind": "yes_no" },
                    { "name": "Roles", "kind": "partial_matchable" },
                    { "name": "Release", "kind": "orderable", "truncate": 4 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(profile.delimiter, ',');
        assert!(profile.ignored_columns.is_empty());
        assert!(profile.feedback.is_none());
        assert_eq!(profile.categories[2].kind, CategoryKind::Orderable);
        assert_eq!(profile.categories[2].truncate, Some(4));
        assert_eq!(profile.schema().unwrap().len(), 3);
    }

    #[test]
    fn numeric_prefix_flag_is_read_from_json() {
        let profile = GameProfile::from_json_str(
            r#"{
                "display_name": "One Piecedle",
                "label_column": "Character",
                "categories": [
                    { "name": "First arc", "kind": "orderable", "numeric_prefix": true },
                    { "name": "Haki", "kind": "partial_matchable" }
                ]
            }"#,
        )
        .unwrap();

        assert!(profile.categories[0].numeric_prefix);
        assert!(!profile.categories[1].numeric_prefix);
        let json = serde_json::to_string(&profile.categories[1]).unwrap();
        assert!(!json.contains("numeric_prefix"));
    }

    #[test]
    fn profile_round_trips_through_a_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("profile.json");
        let profile = GameProfile::new("LolDle", "Champion")
            .with_category(CategoryDecl::yes_no("Gender"))
            .with_ignored_column("Title")
            .with_delimiter(';');
        std::fs::write(&path, serde_json::to_string_pretty(&profile).unwrap()).unwrap();

        assert_eq!(GameProfile::load_from_file(&path).unwrap(), profile);
    }

    #[test]
    fn label_column_cannot_be_a_category() {
        let profile = GameProfile::new("LolDle", "Champion")
            .with_category(CategoryDecl::yes_no("Champion"));
        assert!(matches!(
            profile.schema(),
            Err(SolverError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            GameProfile::from_json_str("{ not json"),
            Err(SolverError::Json(_))
        ));
    }
}
