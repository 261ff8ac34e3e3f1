//! Key-based full outer join of request items and stored entities

use std::collections::HashMap;
use store_object::KeyValue;

/// One correlated pair; at least one side is present
pub type Joined<L, R> = (Option<L>, Option<R>);

/// Pair every left entry with every right entry sharing its key
///
/// Keys are visited in first-appearance order, left side first. A key present
/// on one side only yields pairs with `None` for the other side, and duplicate
/// keys produce the cross product of their groups.
pub fn full_outer_join<L, R>(
    left: Vec<L>,
    right: Vec<R>,
    left_key: impl Fn(&L) -> KeyValue,
    right_key: impl Fn(&R) -> KeyValue,
) -> Vec<Joined<L, R>>
where
    L: Clone,
    R: Clone,
{
    let mut order: Vec<KeyValue> = Vec::new();
    let mut left_groups: HashMap<KeyValue, Vec<L>> = HashMap::new();
    let mut right_groups: HashMap<KeyValue, Vec<R>> = HashMap::new();

    for value in left {
        let key = left_key(&value);
        if !left_groups.contains_key(&key) {
            order.push(key.clone());
        }
        left_groups.entry(key).or_default().push(value);
    }

    for value in right {
        let key = right_key(&value);
        if !left_groups.contains_key(&key) && !right_groups.contains_key(&key) {
            order.push(key.clone());
        }
        right_groups.entry(key).or_default().push(value);
    }

    let mut joined = Vec::new();
    for key in order {
        let lefts = left_groups.remove(&key).unwrap_or_default();
        let rights = right_groups.remove(&key).unwrap_or_default();

        match (lefts.is_empty(), rights.is_empty()) {
            (false, false) => {
                for l in &lefts {
                    for r in &rights {
                        joined.push((Some(l.clone()), Some(r.clone())));
                    }
                }
            }
            (false, true) => joined.extend(lefts.into_iter().map(|l| (Some(l), None))),
            (true, false) => joined.extend(rights.into_iter().map(|r| (None, Some(r)))),
            (true, true) => {}
        }
    }
    joined
}
