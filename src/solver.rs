use tracing::info;

use crate::candidates::CandidateSet;
use crate::config::{GameProfile, SolverConfig};
use crate::data::RecordTable;
use crate::entropy::{EntropyEngine, GuessChoice};
use crate::errors::SolverError;
use crate::feedback::{FeedbackConfig, FeedbackTuple, simulate};
use crate::session::DiscoverySession;
use crate::source::TableSource;
use crate::types::ProfileName;

/// Owns a record table, its feedback configuration, and the entropy engine (with its cache).
///
/// One solver serves any number of sequential discovery sessions; cached scores carry over
/// between them.
#[derive(Debug)]
pub struct Solver {
    display_name: ProfileName,
    table: RecordTable,
    feedback_config: FeedbackConfig,
    engine: EntropyEngine,
    config: SolverConfig,
    opener: Option<GuessChoice>,
}

impl Solver {
    /// Solver over `table` using the default feedback tokens for its schema.
    pub fn new(table: RecordTable, config: SolverConfig) -> Self {
        let feedback_config = FeedbackConfig::for_schema(table.schema());
        Self {
            display_name: table.label_column().to_string(),
            engine: EntropyEngine::new(&config),
            table,
            feedback_config,
            config,
            opener: None,
        }
    }

    /// Load the profile's table from `source` and validate its feedback configuration.
    pub fn from_source<S: TableSource + ?Sized>(
        profile: &GameProfile,
        source: &S,
        config: SolverConfig,
    ) -> Result<Self, SolverError> {
        let table = source.load(profile)?;
        let feedback_config = profile.feedback_config(table.schema())?;
        info!(
            "[dle:solver] '{}' ready from '{}' ({} records, pool {:?})",
            profile.display_name,
            source.id(),
            table.len(),
            config.guess_pool
        );
        Ok(Self {
            display_name: profile.display_name.clone(),
            feedback_config,
            ..Self::new(table, config)
        })
    }

    /// Game name from the profile.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Loaded record table.
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Legal feedback tokens per category.
    pub fn feedback_config(&self) -> &FeedbackConfig {
        &self.feedback_config
    }

    /// Entropy engine, for cache statistics.
    pub fn engine(&self) -> &EntropyEngine {
        &self.engine
    }

    /// Configuration the solver was built with.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Feedback `target` would show when `guess` is played.
    pub fn simulate(&self, guess: &str, target: &str) -> Result<FeedbackTuple, SolverError> {
        Ok(simulate(
            self.table.schema(),
            self.table.get(guess)?,
            self.table.get(target)?,
        ))
    }

    /// Most informative guess for `candidates`.
    pub fn optimal_guess(&mut self, candidates: &CandidateSet) -> Result<GuessChoice, SolverError> {
        self.engine.best_guess(&self.table, candidates)
    }

    /// Up to `limit` guesses for `candidates`, best first.
    pub fn ranked_guesses(
        &mut self,
        candidates: &CandidateSet,
        limit: usize,
    ) -> Result<Vec<GuessChoice>, SolverError> {
        self.engine.rank(&self.table, candidates, limit)
    }

    /// Best opening guess against the full table, computed once per solver.
    pub fn optimal_first_guess(&mut self) -> Result<GuessChoice, SolverError> {
        if let Some(opener) = &self.opener {
            return Ok(opener.clone());
        }
        let opener = self
            .engine
            .best_guess(&self.table, &CandidateSet::full(&self.table))?;
        info!(
            "[dle:solver] opening guess for '{}': '{}'",
            self.display_name, opener.label
        );
        self.opener = Some(opener.clone());
        Ok(opener)
    }

    /// Start a session over the full table.
    pub fn start_session(&mut self) -> DiscoverySession<'_> {
        DiscoverySession::new(self)
    }

    pub(crate) fn engine_and_table(&mut self) -> (&mut EntropyEngine, &RecordTable) {
        (&mut self.engine, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryDecl, FeedbackOutcome};
    use crate::feedback::FeedbackConfigEntry;
    use crate::source::InMemorySource;

    fn profile() -> GameProfile {
        GameProfile::new("Pokedle", "Name")
            .with_category(CategoryDecl::partial("Type"))
            .with_category(CategoryDecl::yes_no("Gender"))
            .with_category(CategoryDecl::orderable("Generation"))
    }

    fn source() -> InMemorySource {
        InMemorySource::new("fixture", ["Name", "Type", "Gender", "Generation"])
            .with_row(["Charizard", "Fire, Flying", "Male", "1"])
            .with_row(["Cinderace", "Fire", "Female", "8"])
            .with_row(["Greninja", "Water, Dark", "Male", "6"])
            .with_row(["Pidgeot", "Normal, Flying", "Female", "1"])
    }

    #[test]
    fn simulate_by_label() {
        let solver = Solver::from_source(&profile(), &source(), SolverConfig::default()).unwrap();
        let feedback = solver.simulate("Charizard", "Cinderace").unwrap();
        assert_eq!(feedback.get("Type"), Some(FeedbackOutcome::Partial));
        assert_eq!(feedback.get("Gender"), Some(FeedbackOutcome::Incorrect));
        assert_eq!(feedback.get("Generation"), Some(FeedbackOutcome::After));
        assert!(matches!(
            solver.simulate("Mew", "Cinderace"),
            Err(SolverError::UnknownLabel(_))
        ));
        assert_eq!(solver.display_name(), "Pokedle");
    }

    #[test]
    fn first_guess_is_memoized() {
        let mut solver =
            Solver::from_source(&profile(), &source(), SolverConfig::default()).unwrap();
        let first = solver.optimal_first_guess().unwrap();
        let misses = solver.engine().stats().misses;
        let again = solver.optimal_first_guess().unwrap();
        assert_eq!(first, again);
        assert_eq!(solver.engine().stats().misses, misses);
        assert_eq!(solver.engine().stats().hits, 0);
    }

    #[test]
    fn invalid_feedback_configuration_fails_construction() {
        let profile = profile().with_feedback(vec![FeedbackConfigEntry::new(
            "type",
            ["correct", "partial", "incorrect"],
        )]);
        let err = Solver::from_source(&profile, &source(), SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::ConfigurationMismatch(_)));
    }
}
