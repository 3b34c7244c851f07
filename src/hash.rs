use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

/// Short digest of a sorted index list within one table, used to tag candidate sets in logs.
pub fn stable_hash_indices(table: u64, indices: &[usize]) -> u64 {
    stable_hash_with(|hasher| {
        table.hash(hasher);
        indices.len().hash(hasher);
        for index in indices {
            index.hash(hasher);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_content_not_only_length() {
        assert_eq!(stable_hash_indices(7, &[1, 2, 3]), stable_hash_indices(7, &[1, 2, 3]));
        assert_ne!(stable_hash_indices(7, &[1, 2, 3]), stable_hash_indices(7, &[1, 2, 4]));
        assert_ne!(stable_hash_indices(7, &[1, 2, 3]), stable_hash_indices(8, &[1, 2, 3]));
    }
}
