//! Small helpers shared by every module.
use std::collections::{HashMap, HashSet};

pub type FastHashMap<K, V> = HashMap<K, V, foldhash::fast::RandomState>;
pub type FastHashSet<K> = HashSet<K, foldhash::fast::RandomState>;

/// Mean of the values, `None` when there are none.
/// ```
/// use cog_align::shared::utils::mean;
/// assert_eq!(mean([1., 2., 3.].into_iter()), Some(2.));
/// assert_eq!(mean(std::iter::empty()), None);
/// ```
pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0., 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Round half to even, the way the distance metric expects it.
/// ```
/// use cog_align::shared::utils::round_even;
/// assert_eq!(round_even(2.5), 2);
/// assert_eq!(round_even(3.5), 4);
/// assert_eq!(round_even(-1.2), -1);
/// ```
pub fn round_even(x: f64) -> i32 {
    x.round_ties_even() as i32
}
