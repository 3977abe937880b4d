use std::collections::{BTreeMap, HashMap};

/// Groups items by key and keeps only keys shared by two or more items.
/// Items keep their input order within a group.
pub fn duplicate_groups<T, I>(items: I) -> BTreeMap<String, Vec<T>>
where
    I: IntoIterator<Item = (String, T)>,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for (key, item) in items {
        groups.entry(key).or_default().push(item);
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}

/// Indices of items whose size is shared with at least one other item.
///
/// Files with a unique size cannot have identical content, so only these
/// need to be hashed.
pub fn size_collisions(sizes: &[u64]) -> Vec<usize> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for size in sizes {
        *counts.entry(*size).or_insert(0) += 1;
    }
    sizes
        .iter()
        .enumerate()
        .filter(|(_, size)| counts.get(size).copied().unwrap_or(0) > 1)
        .map(|(idx, _)| idx)
        .collect()
}
