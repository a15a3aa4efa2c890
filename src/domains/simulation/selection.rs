use crate::common::{ScenarioError, ScenarioResult};

/// Index chosen for `seed` among `len` options: the Euclidean remainder, so
/// negative seeds also land in `[0, len)`.
pub fn select_index(seed: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = i128::try_from(len).ok()?;
    usize::try_from(i128::from(seed).rem_euclid(len)).ok()
}

/// Deterministically pick one of `items` for `seed`, returning the index and item.
pub fn select_by_seed<'a, T>(seed: i64, items: &'a [T], what: &str) -> ScenarioResult<(usize, &'a T)> {
    let index = select_index(seed, items.len()).ok_or_else(|| ScenarioError::EmptySelection {
        what: what.to_string(),
    })?;
    Ok((index, &items[index]))
}
