use serde::Serialize;
use std::collections::HashMap;

/// A tag, label or folder name with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Tallies occurrences of each value, ordered by descending count.
///
/// Ties keep the order in which names were first encountered during the
/// counting pass; the sort is stable and no secondary key is applied.
pub fn sorted_counts<I>(values: I) -> Vec<NameCount>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: Vec<NameCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for name in values {
        match positions.get(&name) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(name.clone(), counts.len());
                counts.push(NameCount { name, count: 1 });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
