//! Precomputed opening guesses per game, persisted as pretty JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entropy::GuessScore;
use crate::errors::SolverError;
use crate::solver::Solver;
use crate::types::{Label, ProfileName};

/// Best first guess for one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenerEntry {
    /// Label of the opening guess.
    pub label: Label,
    /// Expected information in bits against the full table.
    pub entropy: f64,
    /// Worst-case candidates left after the opener.
    pub largest_group: usize,
    /// Table size the opener was computed for.
    pub records: usize,
}

/// Opening guesses keyed by game display name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenerBook {
    entries: BTreeMap<ProfileName, OpenerEntry>,
}

impl OpenerBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute (or reuse) the solver's opening guess and store it under its display name.
    pub fn record(&mut self, solver: &mut Solver) -> Result<&OpenerEntry, SolverError> {
        let opener = solver.optimal_first_guess()?;
        let score = opener.score.unwrap_or(GuessScore {
            entropy: 0.0,
            largest_group: 1,
            groups: 1,
        });
        let name = solver.display_name().to_string();
        self.entries.insert(
            name.clone(),
            OpenerEntry {
                label: opener.label,
                entropy: score.entropy,
                largest_group: score.largest_group,
                records: solver.table().len(),
            },
        );
        Ok(&self.entries[&name])
    }

    /// Entry stored for `game`, without any staleness check.
    pub fn get(&self, game: &str) -> Option<&OpenerEntry> {
        self.entries.get(game)
    }

    /// Stored opener, if it was computed for a table of the same size as the solver's.
    pub fn lookup(&self, solver: &Solver) -> Option<&OpenerEntry> {
        self.get(solver.display_name())
            .filter(|entry| entry.records == solver.table().len())
            .filter(|entry| solver.table().index_of(&entry.label).is_some())
    }

    /// Number of games in the book.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no game has an opener.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in game-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OpenerEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Read a book written by [`OpenerBook::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load `path`, or start empty when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Overwrite `path` with the book.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let path = path.as_ref();
        let raw = serde_json::to_vec_pretty(self)?;
        fs::write(path, raw)?;
        info!(
            "[dle:openers] saved {} openers to '{}'",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }
}
