//! Automated discovery against a known target, using the feedback simulator as the player.

use tracing::debug;

use crate::errors::SolverError;
use crate::session::SessionState;
use crate::solver::Solver;
use crate::types::Label;

/// Result of one automated game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfPlayReport {
    /// Hidden answer of the game.
    pub target: Label,
    /// Guesses in play order; the last one is the target when solved.
    pub guesses: Vec<Label>,
    /// Whether the target was named within the guess limit.
    pub solved: bool,
}

impl SelfPlayReport {
    /// Guesses played, including the final correct one.
    pub fn guess_count(&self) -> usize {
        self.guesses.len()
    }
}

/// Play until the target is guessed or `max_guesses` is reached (`None` caps at the table size).
pub fn play(
    solver: &mut Solver,
    target: &str,
    max_guesses: Option<usize>,
) -> Result<SelfPlayReport, SolverError> {
    let target = solver.table().get(target)?.label().to_string();
    let limit = max_guesses.unwrap_or(solver.table().len());
    let mut session = solver.start_session();
    let mut guesses = Vec::new();
    let mut solved = false;

    while guesses.len() < limit {
        let suggestion = session.suggest()?;
        guesses.push(suggestion.label.clone());
        if suggestion.label == target {
            session.confirm_correct(&suggestion.label)?;
            solved = true;
            break;
        }
        let feedback = session.solver().simulate(&suggestion.label, &target)?;
        debug!(
            "[dle:self-play] '{}' vs hidden '{}': {}",
            suggestion.label, target, feedback
        );
        let state = if feedback.is_all_correct() {
            session.reject_guess(&suggestion.label)?
        } else {
            session.apply_feedback(&suggestion.label, &feedback)?
        };
        if state == SessionState::Aborted {
            break;
        }
    }

    Ok(SelfPlayReport {
        target,
        guesses,
        solved,
    })
}

/// [`play`] for each target in order.
pub fn play_many<S: AsRef<str>>(
    solver: &mut Solver,
    targets: &[S],
    max_guesses: Option<usize>,
) -> Result<Vec<SelfPlayReport>, SolverError> {
    targets
        .iter()
        .map(|target| play(solver, target.as_ref(), max_guesses))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryDecl, CategorySchema};
    use crate::config::SolverConfig;
    use crate::data::RecordTable;

    fn solver(rows: Vec<Vec<&str>>) -> Solver {
        let table = RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![
                CategoryDecl::yes_no("Gender"),
                CategoryDecl::partial("Roles"),
                CategoryDecl::orderable("Year"),
            ])
            .unwrap(),
            ["Name", "Gender", "Roles", "Year"],
            rows,
            &[],
        )
        .unwrap();
        Solver::new(table, SolverConfig::default())
    }

    #[test]
    fn solves_every_target() {
        let mut solver = solver(vec![
            vec!["Ahri", "Female", "Mid", "2011"],
            vec!["Braum", "Male", "Support", "2014"],
            vec!["Caitlyn", "Female", "Bottom", "2011"],
            vec!["Darius", "Male", "Top", "2012"],
            vec!["Ekko", "Male", "Mid, Jungle", "2015"],
        ]);
        let targets: Vec<String> = solver.table().labels().map(str::to_string).collect();
        for report in play_many(&mut solver, &targets, None).unwrap() {
            assert!(report.solved, "{report:?}");
            assert_eq!(report.guesses.last(), Some(&report.target));
            assert!(report.guess_count() <= 5);
        }
    }

    #[test]
    fn indistinguishable_records_are_still_resolved_by_label() {
        let mut solver = solver(vec![
            vec!["Twin A", "Male", "Top", "2012"],
            vec!["Twin B", "Male", "Top", "2012"],
            vec!["Other", "Female", "Mid", "2010"],
        ]);
        let report = play(&mut solver, "Twin B", None).unwrap();
        assert!(report.solved);
        assert_eq!(report.guesses.last().map(String::as_str), Some("Twin B"));
    }

    #[test]
    fn guess_limit_stops_the_game() {
        let mut solver = solver(vec![
            vec!["Ahri", "Female", "Mid", "2011"],
            vec!["Braum", "Male", "Support", "2014"],
            vec!["Caitlyn", "Female", "Bottom", "2011"],
        ]);
        let report = play(&mut solver, "Caitlyn", Some(0)).unwrap();
        assert!(!report.solved);
        assert!(report.guesses.is_empty());
        assert!(play(&mut solver, "Zilean", None).is_err());
    }
}
