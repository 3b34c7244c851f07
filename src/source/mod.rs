//! Table source interfaces.
//!
//! A `TableSource` turns some tabular backend into an immutable [`RecordTable`] for a
//! [`GameProfile`]. Sources are read once at solver construction.

use crate::config::GameProfile;
use crate::data::RecordTable;
use crate::errors::SolverError;
use crate::types::RawValue;

/// Source implementation modules.
pub mod sources;

pub use sources::csv_source::CsvSource;

/// Loader-facing table interface.
pub trait TableSource {
    /// Stable identifier used in logs and errors (a path, a fixture name).
    fn id(&self) -> &str;

    /// Read every row and build the table described by `profile`.
    ///
    /// Malformed rows fail fast with an error naming the row.
    fn load(&self, profile: &GameProfile) -> Result<RecordTable, SolverError>;
}

/// Source backed by rows held in memory, mainly for tests and embedding.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    id: String,
    header: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl InMemorySource {
    /// Empty source with the given id and header row.
    pub fn new<H, S>(id: impl Into<String>, header: H) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append one row; cells are in header order.
    pub fn with_row<R, S>(mut self, row: R) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<RawValue>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row has been added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TableSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self, profile: &GameProfile) -> Result<RecordTable, SolverError> {
        RecordTable::from_rows(
            &profile.label_column,
            profile.schema()?,
            self.header.iter().cloned(),
            self.rows.iter().cloned(),
            &profile.ignored_columns,
        )
    }
}
