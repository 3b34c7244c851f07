use std::sync::Arc;

use crate::data::RecordTable;
use crate::errors::SolverError;
use crate::hash::stable_hash_indices;

/// Records still consistent with every feedback tuple seen so far.
///
/// Stored as ascending row indices into one [`RecordTable`], so iteration follows table order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSet {
    indices: Vec<usize>,
}

/// Order-independent identity of a candidate set's content, used as a cache key.
///
/// Pairs the sorted row indices with the fingerprint of the table they index, so equal
/// signatures always denote the same records.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CandidateSignature {
    table: u64,
    indices: Arc<[usize]>,
}

impl CandidateSignature {
    /// Number of records in the set.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fingerprint of the table the indices refer to.
    pub fn table(&self) -> u64 {
        self.table
    }

    /// Short hash of the content for log lines.
    pub fn digest(&self) -> u64 {
        stable_hash_indices(self.table, &self.indices)
    }
}

impl CandidateSet {
    /// Every record of `table`.
    pub fn full(table: &RecordTable) -> Self {
        Self {
            indices: (0..table.len()).collect(),
        }
    }

    /// Set containing the named records; unknown labels are an error.
    pub fn from_labels<I, S>(table: &RecordTable, labels: I) -> Result<Self, SolverError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indices = labels
            .into_iter()
            .map(|label| table.require_index(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_indices(indices))
    }

    pub(crate) fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Number of remaining records.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no record remains.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Ascending row indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Whether the highest index is a row of `table`.
    pub fn fits(&self, table: &RecordTable) -> bool {
        self.indices.last().is_none_or(|last| *last < table.len())
    }

    /// Whether the record at `index` is still a candidate.
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// The remaining record when exactly one is left.
    pub fn single(&self) -> Option<usize> {
        match self.indices.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Labels of the remaining records in table order.
    pub fn labels<'t>(&self, table: &'t RecordTable) -> Vec<&'t str> {
        self.indices
            .iter()
            .filter_map(|index| table.record(*index))
            .map(|record| record.label())
            .collect()
    }

    /// Cache key for this set within `table`.
    pub fn signature(&self, table: &RecordTable) -> CandidateSignature {
        CandidateSignature {
            table: table.fingerprint(),
            indices: self.indices.as_slice().into(),
        }
    }

    /// Drop one record, keeping the rest in order.
    pub(crate) fn without(&self, index: usize) -> Self {
        Self {
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|candidate| *candidate != index)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryDecl, CategorySchema};

    fn table() -> RecordTable {
        RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![CategoryDecl::yes_no("Gender")]).unwrap(),
            ["Name", "Gender"],
            vec![vec!["A", "Male"], vec!["B", "Female"], vec!["C", "Male"]],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn signature_ignores_insertion_order() {
        let table = table();
        let left = CandidateSet::from_labels(&table, ["C", "A"]).unwrap();
        let right = CandidateSet::from_labels(&table, ["A", "C", "A"]).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.signature(&table), right.signature(&table));
        assert_eq!(left.labels(&table), vec!["A", "C"]);
    }

    #[test]
    fn equal_sized_sets_have_distinct_signatures() {
        let table = table();
        let left = CandidateSet::from_labels(&table, ["A", "B"]).unwrap();
        let right = CandidateSet::from_labels(&table, ["A", "C"]).unwrap();
        assert_ne!(left.signature(&table), right.signature(&table));
    }

    #[test]
    fn signature_distinguishes_tables_with_the_same_labels() {
        let table = table();
        let other = RecordTable::from_rows(
            "Name",
            CategorySchema::new(vec![CategoryDecl::yes_no("Gender")]).unwrap(),
            ["Name", "Gender"],
            vec![vec!["A", "Male"], vec!["B", "Male"], vec!["C", "Male"]],
            &[],
        )
        .unwrap();
        let set = CandidateSet::full(&table);
        assert_eq!(set, CandidateSet::full(&other));
        assert_ne!(set.signature(&table), set.signature(&other));
        assert!(set.fits(&other));
        assert!(!CandidateSet::from_indices(vec![0, 7]).fits(&table));
    }

    #[test]
    fn single_reports_last_remaining_record() {
        let table = table();
        assert_eq!(CandidateSet::full(&table).single(), None);
        let one = CandidateSet::from_labels(&table, ["B"]).unwrap();
        assert_eq!(one.single(), Some(1));
        assert!(CandidateSet::from_labels(&table, ["Z"]).is_err());
    }
}
