//! Comparator combinators and the partition sort behind every report table.
//!
//! Reporting commands build their ordering out of small pieces: key
//! extractors, a rank table, reversal, and lexicographic combination where
//! the first non-equal verdict wins. [`sort`] consumes such a chain.

use std::cmp::Ordering;

/// A total-order comparison between two values.
///
/// Callers must supply a valid total order over the values they sort; the
/// sort does not detect or guard against an intransitive comparator.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Combine comparators lexicographically: each is consulted in order and
/// the first non-equal verdict wins. An empty chain compares everything
/// as equal.
pub fn combine<T: 'static>(comparators: Vec<Comparator<T>>) -> Comparator<T> {
    Box::new(move |a, b| {
        for comparator in &comparators {
            let verdict = comparator(a, b);
            if verdict != Ordering::Equal {
                return verdict;
            }
        }
        Ordering::Equal
    })
}

/// Reverse a comparator, turning ascending into descending order.
pub fn reverse<T: 'static>(comparator: Comparator<T>) -> Comparator<T> {
    Box::new(move |a, b| comparator(a, b).reverse())
}

/// Order by an extracted key. Covers strings, integers, booleans
/// (false before true), and instants: anything `Ord`.
pub fn by_key<T, K, F>(key: F) -> Comparator<T>
where
    K: Ord,
    F: Fn(&T) -> K + 'static,
{
    Box::new(move |a, b| key(a).cmp(&key(b)))
}

/// Order by a floating-point key using IEEE total ordering.
pub fn by_f64<T, F>(key: F) -> Comparator<T>
where
    F: Fn(&T) -> f64 + 'static,
{
    Box::new(move |a, b| key(a).total_cmp(&key(b)))
}

/// Order strings by their position in an explicit low-to-high rank table.
///
/// A value absent from the table ranks -1 and sorts before every listed
/// value. Two absent values are mutually equal; their relative order after
/// sorting is unspecified.
pub fn by_rank(low_to_high: Vec<String>) -> Comparator<String> {
    Box::new(move |a, b| rank_of(&low_to_high, a).cmp(&rank_of(&low_to_high, b)))
}

fn rank_of(table: &[String], value: &str) -> i64 {
    table
        .iter()
        .position(|candidate| candidate == value)
        .map_or(-1, |index| index as i64)
}

/// Sort a slice with a chain of comparators, returning a new vector.
///
/// Recursive partition sort: the first element is the pivot, strictly-less
/// elements go left, everything else (pivot-equal included) goes right.
/// Quadratic on adversarial input; workspace-sized inputs are tens of
/// items, so simplicity wins over a guaranteed bound.
pub fn sort<T: Clone + 'static>(items: &[T], comparators: Vec<Comparator<T>>) -> Vec<T> {
    let compare = combine(comparators);
    partition_sort(items, &compare)
}

fn partition_sort<T: Clone>(items: &[T], compare: &Comparator<T>) -> Vec<T> {
    if items.len() <= 1 {
        return items.to_vec();
    }

    let pivot = &items[0];
    let mut left = Vec::new();
    let mut right = Vec::new();
    for item in &items[1..] {
        if compare(item, pivot) == Ordering::Less {
            left.push(item.clone());
        } else {
            right.push(item.clone());
        }
    }

    let mut sorted = partition_sort(&left, compare);
    sorted.push(pivot.clone());
    sorted.extend(partition_sort(&right, compare));
    sorted
}
