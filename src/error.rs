use crate::seed::Side;

/// Structural failures of the model core.
///
/// Missing user or item factors during prediction are not errors:
/// they are handled by the fallback policy and only logged.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Two latent vectors of different length were combined.
    /// Indicates a rank configuration bug.
    #[error("vector length mismatch: {left} vs {right}")]
    VectorLengthMismatch { left: usize, right: usize },

    /// Nothing to compute the global bias from.
    #[error("the ratings batch is empty and there is no prior bias to fall back on")]
    EmptyBatchBias,

    #[error("the prior model has rank {actual}, but rank {expected} is requested")]
    RankMismatch { expected: usize, actual: usize },

    #[error("the rank must be positive")]
    InvalidRank,

    #[error("the number of partitions must be between 1 and 2^32 - 1")]
    InvalidPartitionCount,

    #[error("duplicate {side} entry #{id}")]
    DuplicateEntry { side: Side, id: i64 },
}

pub type CoreResult<T> = std::result::Result<T, Error>;
