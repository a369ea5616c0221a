//! Grouping and reduction primitives shared by the aggregation queries.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Partitions `items` into buckets keyed by `key_fn` and reduces each bucket
/// with `reduce_fn`.
///
/// Keys appear in first-seen order; items within a bucket keep their input
/// order. Consumers needing a different order re-sort the result.
pub fn rollup<T, K, V>(
    items: &[T],
    key_fn: impl Fn(&T) -> K,
    reduce_fn: impl Fn(&[&T]) -> V,
) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
{
    let mut order: Vec<K> = Vec::new();
    let mut buckets: HashMap<K, Vec<&T>> = HashMap::new();

    for item in items {
        match buckets.entry(key_fn(item)) {
            Entry::Occupied(mut e) => e.get_mut().push(item),
            Entry::Vacant(e) => {
                order.push(e.key().clone());
                e.insert(vec![item]);
            }
        }
    }

    order
        .into_iter()
        .map(|key| {
            let reduced = reduce_fn(&buckets[&key]);
            (key, reduced)
        })
        .collect()
}

/// [`rollup`] specialized to bucket sizes, the most common reduction.
pub fn rollup_count<T, K>(items: &[T], key_fn: impl Fn(&T) -> K) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
{
    rollup(items, key_fn, |bucket| bucket.len())
}

/// Arithmetic mean. `None` on empty input so callers decide the display
/// default instead of propagating NaN.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// [min, max] over a sequence, `None` on empty input.
pub fn extent<T: PartialOrd + Copy>(values: &[T]) -> Option<(T, T)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    let mut min = first;
    let mut max = first;
    for v in iter {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Some((min, max))
}

/// One histogram interval. Half-open `[lower, upper)` except the last bin of
/// a histogram, which also includes the domain maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Partitions `values` into `threshold_count` contiguous equal-width bins
/// spanning `[domain_min, domain_max]`.
///
/// Values outside the domain are excluded. Empty bins are retained with a
/// zero count so charts keep the full axis. A degenerate domain
/// (`domain_max <= domain_min`) collects every in-domain value into the
/// first bin.
pub fn bin(values: &[f64], domain_min: f64, domain_max: f64, threshold_count: usize) -> Vec<Bin> {
    if threshold_count == 0 {
        return Vec::new();
    }

    let width = (domain_max - domain_min) / threshold_count as f64;
    let mut bins: Vec<Bin> = (0..threshold_count)
        .map(|i| Bin {
            lower: domain_min + width * i as f64,
            upper: domain_min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &v in values {
        if v < domain_min || v > domain_max {
            continue;
        }
        let idx = if width > 0.0 {
            (((v - domain_min) / width) as usize).min(threshold_count - 1)
        } else {
            0
        };
        bins[idx].count += 1;
    }

    bins
}
