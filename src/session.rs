//! Discovery session state machine.
//!
//! ```text
//!   Active --feedback--> Active | Solved
//!   Active --confirm---> Solved
//!   Active --signal----> Aborted
//! ```
//!
//! Solved and Aborted are terminal. A feedback step that would leave no candidate is
//! rejected and the candidate set stays as it was.

use std::fmt;

use tracing::{info, warn};

use crate::candidates::CandidateSet;
use crate::entropy::GuessScore;
use crate::errors::SolverError;
use crate::feedback::{FeedbackInput, FeedbackTuple, UserSignal};
use crate::filter::filter;
use crate::solver::Solver;
use crate::types::Label;

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// More than one candidate remains.
    Active,
    /// Exactly one candidate remains.
    Solved,
    /// The player ended the session.
    Aborted,
}

impl SessionState {
    /// Lowercase name used in logs and summaries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Solved => "solved",
            Self::Aborted => "aborted",
        }
    }

    /// Solved and Aborted accept no further feedback.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened after a guess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundResult {
    /// Feedback was applied.
    Feedback(FeedbackTuple),
    /// The player confirmed the guess was the answer.
    Confirmed,
    /// The guess was not the answer even though every category matched.
    Rejected,
}

/// One played guess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuessRound {
    /// Label that was played.
    pub guess: Label,
    /// How the round ended.
    pub result: RoundResult,
    /// Candidates left after the round.
    pub remaining: usize,
}

/// Next guess to show the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    /// Record to guess next.
    pub label: Label,
    /// `None` when the answer is already known.
    pub score: Option<GuessScore>,
    /// Candidates still possible.
    pub remaining: usize,
}

/// Final or current result of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The session is still active.
    InProgress,
    /// The answer was found.
    Solved(Label),
    /// The player ended the session first.
    Aborted,
}

/// Snapshot of a session for display.
#[derive(Clone, Debug)]
pub struct SessionSummary {
    /// State at the time of the snapshot.
    pub state: SessionState,
    /// Answer, once solved.
    pub answer: Option<Label>,
    /// Rounds played.
    pub guesses: usize,
    /// Round history in play order.
    pub rounds: Vec<GuessRound>,
    /// Feedback steps rejected because they contradicted every candidate.
    pub rejected_steps: usize,
}

/// One play-through: the candidate set, its state, and the round history.
pub struct DiscoverySession<'s> {
    solver: &'s mut Solver,
    candidates: CandidateSet,
    state: SessionState,
    rounds: Vec<GuessRound>,
    rejected_steps: usize,
}

impl<'s> DiscoverySession<'s> {
    pub(crate) fn new(solver: &'s mut Solver) -> Self {
        let candidates = CandidateSet::full(solver.table());
        let state = state_for(&candidates);
        info!(
            "[dle:session] started '{}' with {} candidates",
            solver.display_name(),
            candidates.len()
        );
        Self {
            solver,
            candidates,
            state,
            rounds: Vec::new(),
            rejected_steps: 0,
        }
    }

    /// Solver the session plays against.
    pub fn solver(&self) -> &Solver {
        &*self.solver
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Records still consistent with every applied round.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Number of remaining candidates.
    pub fn remaining(&self) -> usize {
        self.candidates.len()
    }

    /// Labels of the remaining candidates in table order.
    pub fn remaining_labels(&self) -> Vec<&str> {
        self.candidates.labels(self.solver.table())
    }

    /// Rounds played so far.
    pub fn rounds(&self) -> &[GuessRound] {
        &self.rounds
    }

    /// Label of the answer once solved.
    pub fn answer(&self) -> Option<&str> {
        match self.state {
            SessionState::Solved => self
                .candidates
                .single()
                .map(|index| self.solver.table().row(index).label()),
            _ => None,
        }
    }

    /// Outcome derived from the state and the remaining candidate.
    pub fn outcome(&self) -> SessionOutcome {
        match self.state {
            SessionState::Active => SessionOutcome::InProgress,
            SessionState::Aborted => SessionOutcome::Aborted,
            SessionState::Solved => self
                .answer()
                .map(|label| SessionOutcome::Solved(label.to_string()))
                .unwrap_or(SessionOutcome::InProgress),
        }
    }

    /// Next guess. Once solved this is the answer itself.
    pub fn suggest(&mut self) -> Result<Suggestion, SolverError> {
        if self.state == SessionState::Aborted {
            return Err(SolverError::SessionClosed(self.state.as_str()));
        }
        let (engine, table) = self.solver.engine_and_table();
        let choice = engine.best_guess(table, &self.candidates)?;
        Ok(Suggestion {
            label: choice.label,
            score: choice.score,
            remaining: self.candidates.len(),
        })
    }

    /// Apply feedback observed for `guess`.
    ///
    /// If no candidate is consistent with it, the step is discarded and
    /// [`SolverError::EmptyCandidateSet`] is returned.
    pub fn apply_feedback(
        &mut self,
        guess: &str,
        feedback: &FeedbackTuple,
    ) -> Result<SessionState, SolverError> {
        self.ensure_active()?;
        let table = self.solver.table();
        let guess_record = table.get(guess)?;
        let narrowed = filter(table, &self.candidates, guess_record, feedback);
        if narrowed.is_empty() {
            self.rejected_steps += 1;
            warn!(
                "[dle:session] feedback for '{}' contradicts all {} candidates; step discarded",
                guess,
                self.candidates.len()
            );
            return Err(SolverError::EmptyCandidateSet {
                context: format!("feedback for '{guess}' ({feedback}) matches no candidate"),
            });
        }
        let label = guess_record.label().to_string();
        self.advance(label, RoundResult::Feedback(feedback.clone()), narrowed);
        Ok(self.state)
    }

    /// Validate raw `(category, token)` input and apply it.
    ///
    /// The `guessed` keyword aborts the session.
    pub fn apply_tokens<I, K, V>(&mut self, guess: &str, tokens: I) -> Result<SessionState, SolverError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.ensure_active()?;
        match self.solver.feedback_config().parse(tokens)? {
            FeedbackInput::Outcomes(feedback) => self.apply_feedback(guess, &feedback),
            FeedbackInput::Signal(signal) => Ok(self.signal(signal)),
        }
    }

    /// The player reports `guess` as the answer.
    pub fn confirm_correct(&mut self, guess: &str) -> Result<SessionState, SolverError> {
        self.ensure_active_or_solved()?;
        let index = self.solver.table().require_index(guess)?;
        if !self.candidates.contains(index) {
            self.rejected_steps += 1;
            return Err(SolverError::EmptyCandidateSet {
                context: format!("'{guess}' was already ruled out"),
            });
        }
        let label = self.solver.table().row(index).label().to_string();
        self.advance(label, RoundResult::Confirmed, CandidateSet::from_indices(vec![index]));
        Ok(self.state)
    }

    /// The player reports `guess` as wrong even though its feedback matched every category,
    /// which happens when records are indistinguishable by their categories.
    pub fn reject_guess(&mut self, guess: &str) -> Result<SessionState, SolverError> {
        self.ensure_active()?;
        let index = self.solver.table().require_index(guess)?;
        let narrowed = self.candidates.without(index);
        if narrowed.is_empty() {
            self.rejected_steps += 1;
            return Err(SolverError::EmptyCandidateSet {
                context: format!("'{guess}' was the last candidate"),
            });
        }
        let label = self.solver.table().row(index).label().to_string();
        self.advance(label, RoundResult::Rejected, narrowed);
        Ok(self.state)
    }

    /// Apply an in-band player signal and return the resulting state.
    pub fn signal(&mut self, signal: UserSignal) -> SessionState {
        match signal {
            UserSignal::Guessed => self.abort(),
        }
    }

    /// End the session. A solved session stays solved.
    pub fn abort(&mut self) -> SessionState {
        if self.state == SessionState::Active {
            info!(
                "[dle:session] aborted after {} guesses with {} candidates left",
                self.rounds.len(),
                self.candidates.len()
            );
            self.state = SessionState::Aborted;
        }
        self.state
    }

    /// Start over with every record as a candidate. Cached scores are kept.
    pub fn reset(&mut self) {
        self.candidates = CandidateSet::full(self.solver.table());
        self.state = state_for(&self.candidates);
        self.rounds.clear();
        self.rejected_steps = 0;
    }

    /// Snapshot of the state and round history.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            state: self.state,
            answer: self.answer().map(str::to_string),
            guesses: self.rounds.len(),
            rounds: self.rounds.clone(),
            rejected_steps: self.rejected_steps,
        }
    }

    fn advance(&mut self, guess: Label, result: RoundResult, narrowed: CandidateSet) {
        self.candidates = narrowed;
        self.rounds.push(GuessRound {
            guess,
            result,
            remaining: self.candidates.len(),
        });
        self.state = state_for(&self.candidates);
        if let Some(answer) = self.answer() {
            info!(
                "[dle:session] solved '{}' after {} guesses",
                answer,
                self.rounds.len()
            );
        }
    }

    fn ensure_active(&self) -> Result<(), SolverError> {
        match self.state {
            SessionState::Active => Ok(()),
            state => Err(SolverError::SessionClosed(state.as_str())),
        }
    }

    fn ensure_active_or_solved(&self) -> Result<(), SolverError> {
        match self.state {
            SessionState::Aborted => Err(SolverError::SessionClosed(self.state.as_str())),
            _ => Ok(()),
        }
    }
}

fn state_for(candidates: &CandidateSet) -> SessionState {
    if candidates.len() == 1 {
        SessionState::Solved
    } else {
        SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryDecl, CategorySchema, FeedbackOutcome};
    use crate::config::SolverConfig;
    use crate::data::RecordTable;

    fn solver() -> Solver {
        let table = RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![
                CategoryDecl::partial("Category1"),
                CategoryDecl::yes_no("Category2"),
            ])
            .unwrap(),
            ["Name", "Category1", "Category2"],
            vec![
                vec!["A", "Fire, Flying", "Male"],
                vec!["B", "Fire", "Female"],
                vec!["C", "Water", "Female"],
            ],
            &[],
        )
        .unwrap();
        Solver::new(table, SolverConfig::default())
    }

    #[test]
    fn feedback_moves_active_to_solved() {
        let mut solver = solver();
        let mut session = solver.start_session();
        assert_eq!(session.state(), SessionState::Active);

        let state = session
            .apply_tokens("A", [("category1", "partial"), ("category2", "incorrect")])
            .unwrap();
        assert_eq!(state, SessionState::Solved);
        assert_eq!(session.answer(), Some("B"));
        assert_eq!(session.outcome(), SessionOutcome::Solved("B".to_string()));

        let suggestion = session.suggest().unwrap();
        assert_eq!(suggestion.label, "B");
        assert_eq!(suggestion.score, None);

        assert!(matches!(
            session.apply_tokens("B", [("category1", "correct"), ("category2", "correct")]),
            Err(SolverError::SessionClosed("solved"))
        ));
    }

    #[test]
    fn contradictory_feedback_is_discarded() {
        let mut solver = solver();
        let mut session = solver.start_session();
        let feedback = FeedbackTuple::from_pairs(
            session.solver().table().schema(),
            [
                ("Category1", FeedbackOutcome::Partial),
                ("Category2", FeedbackOutcome::Correct),
            ],
        )
        .unwrap();

        let err = session.apply_feedback("C", &feedback).unwrap_err();
        assert!(matches!(err, SolverError::EmptyCandidateSet { .. }));
        assert_eq!(session.remaining(), 3);
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.rounds().is_empty());
        assert_eq!(session.summary().rejected_steps, 1);
    }

    #[test]
    fn guessed_keyword_aborts_and_aborted_is_terminal() {
        let mut solver = solver();
        let mut session = solver.start_session();
        let state = session
            .apply_tokens("A", [("category1", "guessed")])
            .unwrap();
        assert_eq!(state, SessionState::Aborted);
        assert_eq!(session.outcome(), SessionOutcome::Aborted);
        assert!(matches!(
            session.suggest(),
            Err(SolverError::SessionClosed("aborted"))
        ));
        assert!(session.confirm_correct("A").is_err());
    }

    #[test]
    fn invalid_tokens_leave_session_untouched() {
        let mut solver = solver();
        let mut session = solver.start_session();
        let err = session
            .apply_tokens("A", [("category1", "partial"), ("category2", "partial")])
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidFeedbackToken { .. }));
        assert_eq!(session.remaining(), 3);
    }

    #[test]
    fn confirm_correct_solves_with_the_guess() {
        let mut solver = solver();
        let mut session = solver.start_session();
        assert_eq!(session.confirm_correct("C").unwrap(), SessionState::Solved);
        assert_eq!(session.answer(), Some("C"));
        let summary = session.summary();
        assert_eq!(summary.guesses, 1);
        assert_eq!(summary.rounds[0].result, RoundResult::Confirmed);
    }

    #[test]
    fn reset_restores_the_full_table() {
        let mut solver = solver();
        let mut session = solver.start_session();
        session.reject_guess("A").unwrap();
        assert_eq!(session.remaining_labels(), vec!["B", "C"]);
        session.reset();
        assert_eq!(session.remaining(), 3);
        assert!(session.rounds().is_empty());
    }
}
