//! Entropy-based guess scoring and selection.
//!
//! A guess partitions the candidate set by the feedback each candidate would produce.
//! The Shannon entropy of that partition (in bits) is the expected information the guess
//! yields; the engine picks the guess with the highest entropy and caches scores per
//! candidate-set content so repeated states are never rescored.

use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::debug;

use crate::candidates::{CandidateSet, CandidateSignature};
use crate::config::{GuessPool, SolverConfig};
use crate::constants::entropy::ENTROPY_TIE_EPSILON;
use crate::data::{Record, RecordTable};
use crate::errors::SolverError;
use crate::feedback::{FeedbackTuple, simulate};
use crate::types::Label;

/// Score of one prospective guess against one candidate set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuessScore {
    /// Expected information in bits.
    pub entropy: f64,
    /// Size of the largest feedback group (worst-case remaining candidates).
    pub largest_group: usize,
    /// Number of distinct feedback tuples.
    pub groups: usize,
}

/// A selected guess.
#[derive(Clone, Debug, PartialEq)]
pub struct GuessChoice {
    /// Row index in the table.
    pub index: usize,
    /// Label of the guessed record.
    pub label: Label,
    /// `None` when the choice was forced (a single candidate left) and nothing was scored.
    pub score: Option<GuessScore>,
    /// Whether the guess is itself still a possible answer.
    pub is_candidate: bool,
}

/// Cache hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Scores served from the cache.
    pub hits: u64,
    /// Scores computed and then cached.
    pub misses: u64,
}

/// Group `candidates` by the feedback each would show for `guess`.
///
/// Groups appear in order of first occurrence; counts sum to `candidates.len()`.
pub fn partition(
    table: &RecordTable,
    candidates: &CandidateSet,
    guess: &Record,
) -> IndexMap<FeedbackTuple, usize> {
    let schema = table.schema();
    let mut groups: IndexMap<FeedbackTuple, usize> = IndexMap::new();
    for index in candidates.indices() {
        *groups
            .entry(simulate(schema, guess, table.row(*index)))
            .or_insert(0) += 1;
    }
    groups
}

/// Shannon entropy in bits of a partition with the given group sizes.
pub fn entropy_bits<I>(counts: I, total: usize) -> f64
where
    I: IntoIterator<Item = usize>,
{
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .into_iter()
        .filter(|count| *count > 0)
        .map(|count| {
            let p = count as f64 / total;
            p * (total / count as f64).log2()
        })
        .sum()
}

/// Score `guess` against `candidates` without touching any cache.
pub fn score_guess(table: &RecordTable, candidates: &CandidateSet, guess: &Record) -> GuessScore {
    let groups = partition(table, candidates, guess);
    GuessScore {
        entropy: entropy_bits(groups.values().copied(), candidates.len()),
        largest_group: groups.values().copied().max().unwrap_or(0),
        groups: groups.len(),
    }
}

/// Ranks prospective guesses by expected information and remembers every score it computes.
///
/// Cache entries are keyed by the content of the candidate set, including the fingerprint
/// of its table, so one engine may serve several tables without mixing their scores.
#[derive(Debug)]
pub struct EntropyEngine {
    pool: GuessPool,
    parallel: bool,
    cache: HashMap<CandidateSignature, HashMap<Label, GuessScore>>,
    stats: CacheStats,
}

impl EntropyEngine {
    /// Engine with an empty cache using the configured guess pool.
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            pool: config.guess_pool,
            parallel: config.parallel_scoring,
            cache: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Which records are scored as guesses.
    pub fn guess_pool(&self) -> GuessPool {
        self.pool
    }

    /// Hit and miss counters since construction or the last [`EntropyEngine::clear_cache`].
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of distinct candidate sets with cached scores.
    pub fn cached_sets(&self) -> usize {
        self.cache.len()
    }

    /// Total cached (set, guess) scores.
    pub fn cached_scores(&self) -> usize {
        self.cache.values().map(HashMap::len).sum()
    }

    /// Drop every cached score and reset the counters.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.stats = CacheStats::default();
    }

    /// Cached score of guessing `guess` against `candidates`.
    pub fn score(
        &mut self,
        table: &RecordTable,
        candidates: &CandidateSet,
        guess: &str,
    ) -> Result<GuessScore, SolverError> {
        check_candidates(table, candidates)?;
        let guess_index = table.require_index(guess)?;
        self.scores_for(table, candidates, &[guess_index])
            .into_iter()
            .next()
            .map(|(_, score)| score)
            .ok_or_else(|| SolverError::UnknownLabel(guess.to_string()))
    }

    /// The most informative guess for `candidates`.
    ///
    /// Ties on entropy go to the smaller worst-case group, then to a guess that can still be
    /// the answer, then to the lexically smallest label.
    pub fn best_guess(
        &mut self,
        table: &RecordTable,
        candidates: &CandidateSet,
    ) -> Result<GuessChoice, SolverError> {
        check_candidates(table, candidates)?;
        if let Some(only) = candidates.single() {
            return Ok(forced_choice(table, only));
        }
        self.rank(table, candidates, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| SolverError::EmptyCandidateSet {
                context: "guess pool is empty".to_string(),
            })
    }

    /// Up to `limit` guesses, best first.
    pub fn rank(
        &mut self,
        table: &RecordTable,
        candidates: &CandidateSet,
        limit: usize,
    ) -> Result<Vec<GuessChoice>, SolverError> {
        check_candidates(table, candidates)?;
        if let Some(only) = candidates.single() {
            return Ok(vec![forced_choice(table, only)]);
        }
        let pool = self.pool_indices(table, candidates);
        let mut choices: Vec<GuessChoice> = self
            .scores_for(table, candidates, &pool)
            .into_iter()
            .map(|(index, score)| GuessChoice {
                index,
                label: table.row(index).label().to_string(),
                score: Some(score),
                is_candidate: candidates.contains(index),
            })
            .collect();
        choices.sort_by(compare_choices);
        choices.truncate(limit);
        if let Some(best) = choices.first() {
            debug!(
                "[dle:entropy] best guess '{}' for {} candidates (set {:016x}): {:?}",
                best.label,
                candidates.len(),
                candidates.signature(table).digest(),
                best.score
            );
        }
        Ok(choices)
    }

    fn pool_indices(&self, table: &RecordTable, candidates: &CandidateSet) -> Vec<usize> {
        match self.pool {
            GuessPool::Candidates => candidates.indices().to_vec(),
            GuessPool::FullTable => (0..table.len()).collect(),
        }
    }

    /// Scores for `guesses`, computing and caching the ones not seen for this set yet.
    fn scores_for(
        &mut self,
        table: &RecordTable,
        candidates: &CandidateSet,
        guesses: &[usize],
    ) -> Vec<(usize, GuessScore)> {
        let cached = self.cache.entry(candidates.signature(table)).or_default();
        let missing: Vec<usize> = guesses
            .iter()
            .copied()
            .filter(|index| !cached.contains_key(table.row(*index).label()))
            .collect();
        self.stats.hits += (guesses.len() - missing.len()) as u64;
        self.stats.misses += missing.len() as u64;

        let fresh: Vec<(usize, GuessScore)> = if self.parallel {
            missing
                .par_iter()
                .map(|index| (*index, score_guess(table, candidates, table.row(*index))))
                .collect()
        } else {
            missing
                .iter()
                .map(|index| (*index, score_guess(table, candidates, table.row(*index))))
                .collect()
        };
        for (index, score) in fresh {
            cached.insert(table.row(index).label().to_string(), score);
        }

        guesses
            .iter()
            .filter_map(|index| {
                cached
                    .get(table.row(*index).label())
                    .map(|score| (*index, *score))
            })
            .collect()
    }
}

fn check_candidates(table: &RecordTable, candidates: &CandidateSet) -> Result<(), SolverError> {
    if candidates.is_empty() {
        return Err(SolverError::EmptyCandidateSet {
            context: "cannot choose a guess from zero candidates".to_string(),
        });
    }
    if !candidates.fits(table) {
        return Err(SolverError::ConfigurationMismatch(format!(
            "candidate set refers to rows beyond the {} records of the table",
            table.len()
        )));
    }
    Ok(())
}

fn forced_choice(table: &RecordTable, index: usize) -> GuessChoice {
    GuessChoice {
        index,
        label: table.row(index).label().to_string(),
        score: None,
        is_candidate: true,
    }
}

/// `Less` means `left` is the better guess.
fn compare_choices(left: &GuessChoice, right: &GuessChoice) -> Ordering {
    let (left_score, right_score) = match (left.score, right.score) {
        (Some(left), Some(right)) => (left, right),
        _ => return left.label.cmp(&right.label),
    };
    let entropy_gap = left_score.entropy - right_score.entropy;
    let by_entropy = if entropy_gap.abs() <= ENTROPY_TIE_EPSILON {
        Ordering::Equal
    } else if entropy_gap > 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    by_entropy
        .then_with(|| left_score.largest_group.cmp(&right_score.largest_group))
        .then_with(|| right.is_candidate.cmp(&left.is_candidate))
        .then_with(|| left.label.cmp(&right.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryDecl, CategorySchema};

    fn table() -> RecordTable {
        RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![
                CategoryDecl::yes_no("Gender"),
                CategoryDecl::partial("Roles"),
                CategoryDecl::orderable("Year"),
            ])
            .unwrap(),
            ["Name", "Gender", "Roles", "Year"],
            vec![
                vec!["Ahri", "Female", "Mid", "2011"],
                vec!["Braum", "Male", "Support", "2014"],
                vec!["Caitlyn", "Female", "Bottom", "2011"],
                vec!["Darius", "Male", "Top", "2012"],
                vec!["Ekko", "Male", "Mid, Jungle", "2015"],
            ],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn entropy_bits_matches_known_values() {
        assert_eq!(entropy_bits([4], 4), 0.0);
        assert!((entropy_bits([1, 1], 2) - 1.0).abs() < 1e-12);
        assert!((entropy_bits([1, 1, 1, 1], 4) - 2.0).abs() < 1e-12);
        assert!((entropy_bits([2, 1, 1], 4) - 1.5).abs() < 1e-12);
        assert_eq!(entropy_bits(Vec::<usize>::new(), 0), 0.0);
    }

    #[test]
    fn partition_conserves_candidates() {
        let table = table();
        let candidates = CandidateSet::full(&table);
        for guess in table.records() {
            let groups = partition(&table, &candidates, guess);
            assert_eq!(groups.values().sum::<usize>(), candidates.len());
            let score = score_guess(&table, &candidates, guess);
            assert!(score.entropy >= 0.0);
            assert_eq!(score.groups, groups.len());
        }
    }

    #[test]
    fn best_guess_is_deterministic_and_cached() {
        let table = table();
        let candidates = CandidateSet::full(&table);
        let mut engine = EntropyEngine::new(&SolverConfig::default());

        let first = engine.best_guess(&table, &candidates).unwrap();
        assert_eq!(engine.stats().misses, table.len() as u64);
        assert_eq!(engine.cached_scores(), table.len());

        let second = engine.best_guess(&table, &candidates).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.stats().hits, table.len() as u64);
        assert_eq!(engine.stats().misses, table.len() as u64);
    }

    #[test]
    fn every_guess_separates_five_distinct_records_fully() {
        let table = table();
        let candidates = CandidateSet::full(&table);
        let mut engine = EntropyEngine::new(&SolverConfig::default());
        let ranked = engine.rank(&table, &candidates, 10).unwrap();
        assert_eq!(ranked.len(), 5);
        let top = ranked[0].score.unwrap();
        for choice in &ranked {
            let score = choice.score.unwrap();
            assert!(score.entropy <= top.entropy + ENTROPY_TIE_EPSILON);
        }
    }

    #[test]
    fn ties_break_by_worst_case_then_label() {
        let mk = |label: &str, entropy: f64, largest_group: usize, is_candidate: bool| GuessChoice {
            index: 0,
            label: label.to_string(),
            score: Some(GuessScore {
                entropy,
                largest_group,
                groups: 2,
            }),
            is_candidate,
        };
        let mut choices = vec![
            mk("Zed", 1.0, 2, true),
            mk("Annie", 1.0, 3, true),
            mk("Bard", 1.0, 2, false),
            mk("Lux", 1.0, 2, true),
            mk("Yuumi", 1.2, 4, true),
        ];
        choices.sort_by(compare_choices);
        let order: Vec<_> = choices.iter().map(|choice| choice.label.as_str()).collect();
        assert_eq!(order, vec!["Yuumi", "Lux", "Zed", "Bard", "Annie"]);
    }

    #[test]
    fn single_candidate_is_returned_without_scoring() {
        let table = table();
        let candidates = CandidateSet::from_labels(&table, ["Ekko"]).unwrap();
        let mut engine = EntropyEngine::new(&SolverConfig::default());

        let choice = engine.best_guess(&table, &candidates).unwrap();
        assert_eq!(choice.label, "Ekko");
        assert_eq!(choice.score, None);
        assert_eq!(engine.stats(), CacheStats::default());
        assert_eq!(engine.cached_sets(), 0);
    }

    #[test]
    fn empty_candidate_set_is_an_error() {
        let table = table();
        let empty = CandidateSet::from_labels(&table, Vec::<&str>::new()).unwrap();
        let mut engine = EntropyEngine::new(&SolverConfig::default());
        assert!(matches!(
            engine.best_guess(&table, &empty),
            Err(SolverError::EmptyCandidateSet { .. })
        ));
    }

    #[test]
    fn full_table_pool_can_pick_an_eliminated_record() {
        // Ahri and Caitlyn differ only by role; Ekko shares Ahri's "Mid" role and splits them.
        let table = table();
        let candidates = CandidateSet::from_labels(&table, ["Ahri", "Caitlyn"]).unwrap();
        let mut engine =
            EntropyEngine::new(&SolverConfig::default().with_guess_pool(GuessPool::FullTable));
        let ranked = engine.rank(&table, &candidates, 10).unwrap();
        assert_eq!(ranked.len(), table.len());
        let best = &ranked[0];
        assert!((best.score.unwrap().entropy - 1.0).abs() < 1e-12);
        assert!(best.is_candidate, "candidates win ties against eliminated guesses");
    }

    #[test]
    fn one_engine_keeps_scores_of_different_tables_apart() {
        let build = |genders: [&str; 3]| {
            RecordTable::from_rows(
                "Name",
                CategorySchema::new(vec![CategoryDecl::yes_no("Gender")]).unwrap(),
                ["Name", "Gender"],
                vec![
                    vec!["A", genders[0]],
                    vec!["B", genders[1]],
                    vec!["C", genders[2]],
                ],
                &[],
            )
            .unwrap()
        };
        let mixed = build(["Male", "Female", "Female"]);
        let uniform = build(["Male", "Male", "Male"]);
        let mut engine = EntropyEngine::new(&SolverConfig::default());

        let on_mixed = engine
            .score(&mixed, &CandidateSet::full(&mixed), "A")
            .unwrap();
        let on_uniform = engine
            .score(&uniform, &CandidateSet::full(&uniform), "A")
            .unwrap();

        assert!((on_mixed.entropy - 0.918_295_834_054_489_3).abs() < 1e-12);
        assert_eq!(on_uniform.entropy, 0.0);
        assert_eq!(engine.cached_sets(), 2);
        assert_eq!(engine.stats().hits, 0);
    }

    #[test]
    fn scoring_rejects_unknown_guesses_and_foreign_sets() {
        let table = table();
        let mut engine = EntropyEngine::new(&SolverConfig::default());
        let full = CandidateSet::full(&table);
        assert!(matches!(
            engine.score(&table, &full, "Zilean"),
            Err(SolverError::UnknownLabel(_))
        ));

        let small = RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![CategoryDecl::yes_no("Gender")]).unwrap(),
            ["Name", "Gender"],
            vec![vec!["Ahri", "Female"], vec!["Braum", "Male"]],
            &[],
        )
        .unwrap();
        assert!(matches!(
            engine.best_guess(&small, &full),
            Err(SolverError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn parallel_scoring_matches_sequential() {
        let table = table();
        let candidates = CandidateSet::full(&table);
        let mut sequential = EntropyEngine::new(&SolverConfig::default());
        let mut parallel =
            EntropyEngine::new(&SolverConfig::default().with_parallel_scoring(true));
        assert_eq!(
            sequential.rank(&table, &candidates, 5).unwrap(),
            parallel.rank(&table, &candidates, 5).unwrap()
        );
    }
}
