//! Partitioned collections and the reductions over them.
//!
//! Partitions are processed independently on the `rayon` pool. Anything crossing
//! partition boundaries goes through an associative reduction or a key-based join.

pub mod join;

use rayon::prelude::*;

use crate::error::{CoreResult, Error};
use crate::helpers::hash::mix64;

#[derive(Debug, Clone, PartialEq)]
pub struct Partitioned<T> {
    partitions: Vec<Vec<T>>,
}

/// Deterministic hash partitioner.
#[must_use]
#[inline]
pub fn partition_of(key: i64, n_partitions: usize) -> usize {
    (mix64(key as u64) % n_partitions as u64) as usize
}

impl<T> Partitioned<T> {
    pub fn new(partitions: Vec<Vec<T>>) -> CoreResult<Self> {
        if partitions.is_empty() {
            return Err(Error::InvalidPartitionCount);
        }
        Ok(Self { partitions })
    }

    /// Deals the records out to the partitions one by one.
    pub fn round_robin(
        records: impl IntoIterator<Item = T>,
        n_partitions: usize,
    ) -> CoreResult<Self> {
        let mut partitions = Self::empty_partitions(n_partitions)?;
        for (i, record) in records.into_iter().enumerate() {
            partitions[i % n_partitions].push(record);
        }
        Self::new(partitions)
    }

    /// Puts every record into the partition its key hashes to.
    pub fn by_key(
        records: impl IntoIterator<Item = T>,
        n_partitions: usize,
        key: impl Fn(&T) -> i64,
    ) -> CoreResult<Self> {
        let mut partitions = Self::empty_partitions(n_partitions)?;
        for record in records {
            partitions[partition_of(key(&record), n_partitions)].push(record);
        }
        Self::new(partitions)
    }

    fn empty_partitions(n_partitions: usize) -> CoreResult<Vec<Vec<T>>> {
        if n_partitions == 0 {
            return Err(Error::InvalidPartitionCount);
        }
        Ok((0..n_partitions).map(|_| Vec::new()).collect())
    }

    #[must_use]
    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }

    #[must_use]
    pub fn partitions(&self) -> &[Vec<T>] {
        &self.partitions
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.partitions.iter().flatten()
    }

    #[must_use]
    pub fn into_partitions(self) -> Vec<Vec<T>> {
        self.partitions
    }

    pub fn into_records(self) -> impl Iterator<Item = T> {
        self.partitions.into_iter().flatten()
    }
}

impl<T: Sync> Partitioned<T> {
    /// Folds each partition, then merges the partial results.
    ///
    /// `merge` must be associative and commutative with `zero` as the identity.
    pub fn aggregate<A, Z, F, M>(&self, zero: Z, fold: F, merge: M) -> A
    where
        A: Send,
        Z: Fn() -> A + Sync + Send,
        F: Fn(A, &T) -> A + Sync + Send,
        M: Fn(A, A) -> A + Sync + Send,
    {
        self.partitions
            .par_iter()
            .map(|partition| partition.iter().fold(zero(), &fold))
            .reduce(&zero, merge)
    }
}

impl<T: Send> Partitioned<T> {
    /// Transforms every partition independently, the partition index is passed along.
    ///
    /// The first error aborts the whole operation.
    pub fn try_map_partitions<U, E, F>(self, f: F) -> Result<Partitioned<U>, E>
    where
        U: Send,
        E: Send,
        F: Fn(usize, Vec<T>) -> Result<Vec<U>, E> + Sync + Send,
    {
        let partitions = self
            .partitions
            .into_par_iter()
            .enumerate()
            .map(|(index, partition)| f(index, partition))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Partitioned { partitions })
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn zero_partitions_rejected() {
        assert_eq!(Partitioned::<i64>::round_robin(0..3, 0), Err(Error::InvalidPartitionCount));
        assert_eq!(Partitioned::<i64>::new(Vec::new()), Err(Error::InvalidPartitionCount));
    }

    #[test]
    fn round_robin_ok() -> crate::Result {
        let partitioned = Partitioned::round_robin(0..5, 2)?;
        assert_eq!(partitioned.partitions(), &[vec![0, 2, 4], vec![1, 3]]);
        assert_eq!(partitioned.len(), 5);
        Ok(())
    }

    #[test]
    fn by_key_colocates_equal_keys() -> crate::Result {
        let records = (0..100_i64).map(|i| (i % 10, i));
        let partitioned = Partitioned::by_key(records, 4, |(key, _)| *key)?;
        for (index, partition) in partitioned.partitions().iter().enumerate() {
            assert!(partition.iter().all(|(key, _)| partition_of(*key, 4) == index));
        }
        let keys_per_partition = partitioned
            .partitions()
            .iter()
            .map(|partition| partition.iter().map(|(key, _)| *key).unique().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let all_keys = keys_per_partition.iter().flatten().sorted().collect::<Vec<_>>();
        assert_eq!(all_keys.len(), 10, "a key ended up in several partitions");
        Ok(())
    }

    #[test]
    fn aggregate_independent_of_partitioning() -> crate::Result {
        let sum_of = |n_partitions| -> crate::Result<i64> {
            Ok(Partitioned::round_robin(1..=1000_i64, n_partitions)?
                .aggregate(|| 0, |sum, x| sum + x, |left, right| left + right))
        };
        for n_partitions in [1, 2, 3, 16, 2000] {
            assert_eq!(sum_of(n_partitions)?, 500_500);
        }
        Ok(())
    }

    #[test]
    fn aggregate_empty_is_zero() -> crate::Result {
        let partitioned = Partitioned::<i64>::round_robin(Vec::new(), 3)?;
        assert!(partitioned.is_empty());
        assert_eq!(partitioned.aggregate(|| 0, |sum, x| sum + x, |l, r| l + r), 0);
        Ok(())
    }

    #[test]
    fn try_map_partitions_passes_index() -> crate::Result {
        let partitioned = Partitioned::round_robin(0..4, 2)?;
        let mapped = partitioned.try_map_partitions(|index, partition| {
            Ok::<_, Error>(partition.into_iter().map(|x| (index, x)).collect())
        })?;
        assert_eq!(mapped.partitions(), &[vec![(0, 0), (0, 2)], vec![(1, 1), (1, 3)]]);
        Ok(())
    }

    #[test]
    fn try_map_partitions_propagates_error() -> crate::Result {
        let partitioned = Partitioned::round_robin(0..4, 2)?;
        let result = partitioned.try_map_partitions(|index, _| match index {
            1 => Err(Error::InvalidRank),
            _ => Ok(Vec::<i32>::new()),
        });
        assert_eq!(result, Err(Error::InvalidRank));
        Ok(())
    }
}
