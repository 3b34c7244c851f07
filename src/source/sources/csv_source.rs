use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::GameProfile;
use crate::data::RecordTable;
use crate::errors::SolverError;
use crate::source::TableSource;

/// Table source reading a CSV file with a header row.
///
/// Cells are kept verbatim (no type inference); empty cells stay empty strings.
#[derive(Clone, Debug)]
pub struct CsvSource {
    id: String,
    path: PathBuf,
}

impl CsvSource {
    /// Source for the CSV file at `path`; the path doubles as the source id.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.to_string_lossy().into_owned(),
            path,
        }
    }

    /// File the source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self, profile: &GameProfile) -> Result<RecordTable, SolverError> {
        debug!("[dle:csv] reading '{}'", self.id);
        let file = std::fs::File::open(&self.path)?;
        load_csv_reader(file, profile)
    }
}

/// Build a table from any CSV reader. Row numbers in errors are CSV line numbers.
pub fn load_csv_reader<R: Read>(reader: R, profile: &GameProfile) -> Result<RecordTable, SolverError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut next_row = 1;
    let rows = reader.records().map(|record| {
        next_row += 1;
        match record {
            Ok(record) => {
                let row = record
                    .position()
                    .map(|position| position.line() as usize)
                    .unwrap_or(next_row);
                Ok((row, record.iter().map(str::to_string).collect()))
            }
            Err(err) => Err(SolverError::DataLoad {
                row: err
                    .position()
                    .map(|position| position.line() as usize)
                    .unwrap_or(next_row),
                reason: err.to_string(),
            }),
        }
    });

    RecordTable::build(
        &profile.label_column,
        profile.schema()?,
        &header,
        rows,
        &profile.ignored_columns,
    )
}
