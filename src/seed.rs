//! Per-partition seed derivation.

use std::fmt::{Display, Formatter};

use crate::helpers::hash::mix64;

/// Which collection of the model a partition belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    User,
    Item,
}

impl Side {
    const fn tag(self) -> u64 {
        match self {
            Self::User => 0,
            Self::Item => 1,
        }
    }
}

impl Display for Side {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::User => "user",
            Self::Item => "item",
        })
    }
}

/// Derives the seed of a partition's random stream.
///
/// Implementations must be deterministic and must never return the same seed
/// for two distinct `(side, partition)` pairs under the same base seed.
pub trait SeedStrategy: Sync {
    fn derive(&self, base_seed: u64, side: Side, partition: usize) -> u64;
}

/// Default strategy: hashes the base seed, then hashes it again together with
/// the side and the partition index packed into disjoint bit ranges.
///
/// The packing is injective for partitions below 2³², and [`mix64`] is a bijection,
/// so distinct pairs never collide. Callers keep partition indices within `u32`;
/// [`crate::Initializer`] rejects larger partition counts with
/// [`crate::Error::InvalidPartitionCount`].
#[derive(Debug, Default, Copy, Clone)]
pub struct MixedSeeds;

impl SeedStrategy for MixedSeeds {
    fn derive(&self, base_seed: u64, side: Side, partition: usize) -> u64 {
        debug_assert!(u32::try_from(partition).is_ok());
        mix64(mix64(base_seed) ^ ((side.tag() << 32) | partition as u64))
    }
}
