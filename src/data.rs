use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use tracing::info;

use crate::category::{CategorySchema, CategoryValue};
use crate::errors::SolverError;
use crate::hash::stable_hash_with;
use crate::types::{CategoryName, Label, RawValue};
use crate::utils::category_key;

/// One row of the source table: a unique label plus one parsed value per feature category.
#[derive(Clone, Debug)]
pub struct Record {
    label: Label,
    values: Vec<CategoryValue>,
    raw: IndexMap<CategoryName, RawValue>,
}

impl Record {
    /// Unique label (value of the label column).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parsed values in schema order.
    pub fn values(&self) -> &[CategoryValue] {
        &self.values
    }

    /// Parsed value of the category at `position`. Panics when out of range.
    pub fn value_at(&self, position: usize) -> &CategoryValue {
        &self.values[position]
    }

    /// Raw cell values keyed by category name, in schema order.
    pub fn raw(&self) -> &IndexMap<CategoryName, RawValue> {
        &self.raw
    }
}

/// Immutable in-memory table of records sharing one category schema.
#[derive(Clone, Debug)]
pub struct RecordTable {
    label_column: CategoryName,
    schema: CategorySchema,
    records: Vec<Record>,
    by_label: HashMap<Label, usize>,
    fingerprint: u64,
}

impl RecordTable {
    /// Build a table from a header and string rows.
    ///
    /// The header must contain `label_column` and every declared category. Columns named in
    /// `ignored_columns` are skipped; any other undeclared column is a configuration mismatch.
    /// Rows are numbered from 2 in errors (the header is row 1).
    pub fn from_rows<H, R, S>(
        label_column: &str,
        schema: CategorySchema,
        header: H,
        rows: R,
        ignored_columns: &[CategoryName],
    ) -> Result<Self, SolverError>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        let numbered = rows.into_iter().enumerate().map(|(idx, row)| {
            Ok::<_, SolverError>((idx + 2, row.into_iter().map(Into::into).collect()))
        });
        Self::build(label_column, schema, &header, numbered, ignored_columns)
    }

    /// Shared constructor for in-memory rows and file sources. Each row carries its row number.
    pub(crate) fn build<I>(
        label_column: &str,
        schema: CategorySchema,
        header: &[String],
        rows: I,
        ignored_columns: &[CategoryName],
    ) -> Result<Self, SolverError>
    where
        I: IntoIterator<Item = Result<(usize, Vec<String>), SolverError>>,
    {
        let layout = ColumnLayout::resolve(label_column, &schema, header, ignored_columns)?;

        let mut records = Vec::new();
        let mut by_label = HashMap::new();
        for row in rows {
            let (row_number, cells) = row?;
            if cells.len() != header.len() {
                return Err(SolverError::DataLoad {
                    row: row_number,
                    reason: format!(
                        "expected {} columns but found {}",
                        header.len(),
                        cells.len()
                    ),
                });
            }
            let label = cells[layout.label].trim().to_string();
            if label.is_empty() {
                return Err(SolverError::DataLoad {
                    row: row_number,
                    reason: format!("label column '{label_column}' is empty"),
                });
            }
            let mut values = Vec::with_capacity(schema.len());
            let mut raw = IndexMap::with_capacity(schema.len());
            for (position, &column) in layout.features.iter().enumerate() {
                let cell = &cells[column];
                values.push(schema.parse_at(position, cell, Some(row_number))?);
                raw.insert(schema.categories()[position].name.clone(), cell.clone());
            }
            if by_label.insert(label.clone(), records.len()).is_some() {
                return Err(SolverError::DataLoad {
                    row: row_number,
                    reason: format!("duplicate label '{label}'"),
                });
            }
            records.push(Record { label, values, raw });
        }

        if records.is_empty() {
            return Err(SolverError::DataLoad {
                row: 1,
                reason: "table contains no records".to_string(),
            });
        }

        info!(
            "[dle:table] loaded {} records with {} categories (label '{}')",
            records.len(),
            schema.len(),
            label_column
        );
        let fingerprint = content_fingerprint(label_column, &schema, &records);
        Ok(Self {
            label_column: label_column.to_string(),
            schema,
            records,
            by_label,
            fingerprint,
        })
    }

    /// Name of the label column.
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Category schema shared by every record.
    pub fn schema(&self) -> &CategorySchema {
        &self.schema
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false` for a successfully built table.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in table order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Digest of the schema and every record's label and raw values.
    ///
    /// Tables with equal content share a fingerprint; score caches key on it.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Record at `index`, if in range.
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Record at an index produced by this table (candidate sets, label lookups).
    pub(crate) fn row(&self, index: usize) -> &Record {
        &self.records[index]
    }

    /// Row index of `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(label.trim()).copied()
    }

    /// Row index of `label`, or [`SolverError::UnknownLabel`].
    pub fn require_index(&self, label: &str) -> Result<usize, SolverError> {
        self.index_of(label)
            .ok_or_else(|| SolverError::UnknownLabel(label.to_string()))
    }

    /// Record with `label`, or [`SolverError::UnknownLabel`].
    pub fn get(&self, label: &str) -> Result<&Record, SolverError> {
        self.require_index(label).map(|index| self.row(index))
    }

    /// Raw category values of a record, for display next to a suggested guess.
    pub fn info(&self, label: &str) -> Result<&IndexMap<CategoryName, RawValue>, SolverError> {
        self.get(label).map(Record::raw)
    }

    /// Labels in table order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(Record::label)
    }
}

fn content_fingerprint(label_column: &str, schema: &CategorySchema, records: &[Record]) -> u64 {
    stable_hash_with(|hasher| {
        category_key(label_column).hash(hasher);
        schema.delimiter().hash(hasher);
        for decl in schema.categories() {
            decl.name.hash(hasher);
            decl.kind.hash(hasher);
            decl.truncate.hash(hasher);
            decl.numeric_prefix.hash(hasher);
        }
        records.len().hash(hasher);
        for record in records {
            record.label.hash(hasher);
            for raw in record.raw.values() {
                raw.hash(hasher);
            }
        }
    })
}

/// Maps header columns onto the label and the schema's categories.
struct ColumnLayout {
    label: usize,
    /// Column index for each category, in schema order.
    features: Vec<usize>,
}

impl ColumnLayout {
    fn resolve(
        label_column: &str,
        schema: &CategorySchema,
        header: &[String],
        ignored_columns: &[CategoryName],
    ) -> Result<Self, SolverError> {
        let label_key = category_key(label_column);
        let ignored: Vec<String> = ignored_columns.iter().map(|c| category_key(c)).collect();
        let mut label = None;
        let mut features = vec![None; schema.len()];

        for (column, name) in header.iter().enumerate() {
            let key = category_key(name);
            if key == label_key {
                if label.replace(column).is_some() {
                    return Err(SolverError::ConfigurationMismatch(format!(
                        "label column '{label_column}' appears more than once"
                    )));
                }
                continue;
            }
            if ignored.contains(&key) {
                continue;
            }
            let Some(position) = schema.position(name) else {
                return Err(SolverError::ConfigurationMismatch(format!(
                    "column '{name}' has no category declaration"
                )));
            };
            if features[position].replace(column).is_some() {
                return Err(SolverError::ConfigurationMismatch(format!(
                    "category '{}' is mapped by more than one column",
                    schema.categories()[position].name
                )));
            }
        }

        let label = label.ok_or_else(|| {
            SolverError::ConfigurationMismatch(format!(
                "label column '{label_column}' not found; available columns: {}",
                header.join(", ")
            ))
        })?;
        let features = features
            .into_iter()
            .enumerate()
            .map(|(position, column)| {
                column.ok_or_else(|| {
                    SolverError::ConfigurationMismatch(format!(
                        "declared category '{}' is missing from the table",
                        schema.categories()[position].name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { label, features })
    }
}
