//! Key-based joins of partitioned collections.
//!
//! Both sides are shuffled by the hash partitioner, so matching keys meet in the same
//! partition. The right side holds at most one value per key, the left side may repeat keys.

use std::cmp::Ordering;

use itertools::EitherOrBoth::{self, Both, Left, Right};
use rayon::prelude::*;

use crate::error::CoreResult;
use crate::partition::Partitioned;

/// Keeps every key present on either side.
///
/// Within a partition, records come out sorted by key, and equal left keys keep their input order.
pub fn full_outer_join<L, R>(
    left: impl IntoIterator<Item = (i64, L)>,
    right: impl IntoIterator<Item = (i64, R)>,
    n_partitions: usize,
) -> CoreResult<Partitioned<(i64, EitherOrBoth<L, R>)>>
where
    L: Send,
    R: Clone + Send,
{
    let left = Partitioned::by_key(left, n_partitions, |(key, _)| *key)?;
    let right = Partitioned::by_key(right, n_partitions, |(key, _)| *key)?;
    let partitions = left
        .into_partitions()
        .into_par_iter()
        .zip(right.into_partitions())
        .map(|(left, right)| join_partition(left, right))
        .collect();
    Partitioned::new(partitions)
}

/// Keeps exactly one record per left record, the right value is absent for unmatched keys.
pub fn left_outer_join<L, R>(
    left: impl IntoIterator<Item = (i64, L)>,
    right: impl IntoIterator<Item = (i64, R)>,
    n_partitions: usize,
) -> CoreResult<Partitioned<(i64, L, Option<R>)>>
where
    L: Send,
    R: Clone + Send,
{
    full_outer_join(left, right, n_partitions)?.try_map_partitions(|_, partition| {
        let joined = partition
            .into_iter()
            .filter_map(|(key, value)| match value {
                Left(left) => Some((key, left, None)),
                Both(left, right) => Some((key, left, Some(right))),
                Right(_) => None,
            })
            .collect::<Vec<_>>();
        Ok(joined)
    })
}

fn join_partition<L, R: Clone>(
    mut left: Vec<(i64, L)>,
    mut right: Vec<(i64, R)>,
) -> Vec<(i64, EitherOrBoth<L, R>)> {
    left.sort_by_key(|(key, _)| *key);
    right.sort_by_key(|(key, _)| *key);
    debug_assert!(right.windows(2).all(|pair| pair[0].0 != pair[1].0));

    let mut joined = Vec::with_capacity(left.len().max(right.len()));
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let ordering = match (left.peek(), right.peek()) {
            (Some((left_key, _)), Some((right_key, _))) => left_key.cmp(right_key),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match ordering {
            Ordering::Less => {
                if let Some((key, value)) = left.next() {
                    joined.push((key, Left(value)));
                }
            }
            Ordering::Greater => {
                if let Some((key, value)) = right.next() {
                    joined.push((key, Right(value)));
                }
            }
            Ordering::Equal => {
                if let Some((key, right_value)) = right.next() {
                    while let Some((_, left_value)) = left.next_if(|(left_key, _)| *left_key == key) {
                        joined.push((key, Both(left_value, right_value.clone())));
                    }
                }
            }
        }
    }

    joined
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn full_outer_join_ok() -> crate::Result {
        let left = vec![(1, "a"), (2, "b"), (2, "c")];
        let right = vec![(2, 20), (3, 30)];
        let joined = full_outer_join(left, right, 3)?
            .into_records()
            .sorted_by_key(|(key, _)| *key)
            .collect::<Vec<_>>();
        assert_eq!(
            joined,
            vec![(1, Left("a")), (2, Both("b", 20)), (2, Both("c", 20)), (3, Right(30))],
        );
        Ok(())
    }

    #[test]
    fn full_outer_join_sorted_within_partition() -> crate::Result {
        let left = (0..50_i64).rev().map(|key| (key, ()));
        let right = (25..75_i64).map(|key| (key, ()));
        let joined = full_outer_join(left, right, 4)?;
        for partition in joined.partitions() {
            assert!(partition.windows(2).all(|pair| pair[0].0 < pair[1].0));
        }
        assert_eq!(joined.len(), 75);
        Ok(())
    }

    #[test]
    fn left_outer_join_keeps_cardinality() -> crate::Result {
        let left = vec![(5, 'x'), (1, 'y'), (5, 'z'), (9, 'w')];
        let right = vec![(5, 0.5), (7, 0.7)];
        for n_partitions in [1, 2, 8] {
            let joined = left_outer_join(left.clone(), right.clone(), n_partitions)?
                .into_records()
                .sorted_by_key(|(_, value, _)| *value)
                .collect::<Vec<_>>();
            assert_eq!(
                joined,
                vec![(9, 'w', None), (5, 'x', Some(0.5)), (1, 'y', None), (5, 'z', Some(0.5))],
            );
        }
        Ok(())
    }

    #[test]
    fn join_with_empty_sides_ok() -> crate::Result {
        let joined = full_outer_join(Vec::<(i64, ())>::new(), vec![(1, ())], 2)?;
        assert_eq!(joined.into_records().collect::<Vec<_>>(), vec![(1, Right(()))]);
        let joined = left_outer_join(Vec::<(i64, ())>::new(), vec![(1, ())], 2)?;
        assert!(joined.is_empty());
        Ok(())
    }
}
