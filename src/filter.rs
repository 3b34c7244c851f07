use crate::candidates::CandidateSet;
use crate::data::{Record, RecordTable};
use crate::errors::SolverError;
use crate::feedback::{FeedbackTuple, simulate};

/// Keep the candidates that would have produced `feedback` for `guess`.
///
/// Order is preserved. An empty result means the feedback contradicts every candidate;
/// callers decide how to surface that.
pub fn filter(
    table: &RecordTable,
    candidates: &CandidateSet,
    guess: &Record,
    feedback: &FeedbackTuple,
) -> CandidateSet {
    let schema = table.schema();
    let kept = candidates
        .indices()
        .iter()
        .copied()
        .filter(|index| simulate(schema, guess, table.row(*index)) == *feedback)
        .collect();
    CandidateSet::from_indices(kept)
}

/// [`filter`] with the guess given by label.
pub fn filter_by_label(
    table: &RecordTable,
    candidates: &CandidateSet,
    guess: &str,
    feedback: &FeedbackTuple,
) -> Result<CandidateSet, SolverError> {
    let guess = table.get(guess)?;
    Ok(filter(table, candidates, guess, feedback))
}
