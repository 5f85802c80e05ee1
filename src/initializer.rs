//! Instantiates a model from a ratings batch, or merges the batch into a prior model.
//!
//! Known users and items keep their factors untouched, new ones get random factors
//! drawn from per-partition seeded streams. The global bias is the rating mean,
//! updated incrementally when the prior model is a streaming one.

use itertools::EitherOrBoth::{Both, Left, Right};
use itertools::Itertools;

use crate::error::{CoreResult, Error};
use crate::generator::{FactorGenerator, RandomFactorGenerator};
use crate::math::mean::RatingSum;
use crate::metrics::Stopwatch;
use crate::model::{FactorMap, FactorModel, Model, StreamingModel};
use crate::partition::join::full_outer_join;
use crate::partition::Partitioned;
use crate::prelude::*;
use crate::rating::Rating;
use crate::seed::{MixedSeeds, SeedStrategy, Side};

/// Initializations slower than this are logged as warnings.
const SLOW_INITIALIZATION: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Params {
    /// Latent vector length.
    pub rank: usize,

    /// Base seed of the factor generators.
    pub seed: u64,

    /// Number of partitions the factors are generated in.
    /// Together with the seed, it determines the generated values.
    ///
    /// Must be in `1..=u32::MAX`: partition indices are packed into 32 bits of the seed.
    pub n_partitions: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rank: 10,
            seed: 42,
            n_partitions: 4,
        }
    }
}

pub struct Initializer<S = MixedSeeds> {
    params: Params,
    seeds: S,
}

impl Initializer {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self::with_seeds(params, MixedSeeds)
    }
}

impl<S: SeedStrategy> Initializer<S> {
    #[must_use]
    pub fn with_seeds(params: Params, seeds: S) -> Self {
        Self { params, seeds }
    }

    /// Returns the new model and the number of ratings in the batch.
    ///
    /// The result is a streaming model when `is_streaming` is requested
    /// or the prior model is already a streaming one. The prior model is left intact.
    #[instrument(
        skip_all,
        fields(
            rank = self.params.rank,
            n_ratings = ratings.len(),
            has_prior = prior.is_some(),
            is_streaming = is_streaming,
        ),
    )]
    pub fn initialize(
        &self,
        ratings: &Partitioned<Rating>,
        prior: Option<&Model>,
        is_streaming: bool,
    ) -> CoreResult<(Model, u64)> {
        let _stopwatch = Stopwatch::new("initialized the model").threshold(SLOW_INITIALIZATION);
        let Params { rank, n_partitions, .. } = self.params;
        if rank == 0 {
            return Err(Error::InvalidRank);
        }
        if n_partitions == 0 || u32::try_from(n_partitions).is_err() {
            return Err(Error::InvalidPartitionCount);
        }
        if let Some(prior) = prior {
            if prior.rank() != rank {
                return Err(Error::RankMismatch {
                    expected: rank,
                    actual: prior.rank(),
                });
            }
        }

        let batch = ratings.aggregate(
            RatingSum::default,
            |mut sum, rating| {
                sum.push(rating.value);
                sum
            },
            RatingSum::merge,
        );
        let (global_bias, n_examples) = global_bias(&batch, prior)?;

        let prior_factors = prior.map(Model::factors);
        let users = self.merge_factors(
            Side::User,
            ratings.iter().map(|rating| rating.user),
            prior_factors.map(|factors| &factors.users),
        )?;
        let items = self.merge_factors(
            Side::Item,
            ratings.iter().map(|rating| rating.item),
            prior_factors.map(|factors| &factors.items),
        )?;

        info!(
            n_ratings = batch.count,
            n_users = users.len(),
            n_items = items.len(),
            global_bias,
            n_examples,
            "merged",
        );
        let model = FactorModel {
            rank,
            users,
            items,
            global_bias,
            fallback: prior_factors.map(|factors| factors.fallback).unwrap_or_default(),
        };
        let model = if is_streaming || prior.map_or(false, Model::is_streaming) {
            Model::Streaming(StreamingModel {
                model,
                observed_examples: n_examples,
            })
        } else {
            Model::Batch(model)
        };
        Ok((model, batch.count))
    }

    /// Outer-joins the batch IDs with the existing factors,
    /// keeping the existing factors and generating the missing ones.
    fn merge_factors(
        &self,
        side: Side,
        ids: impl Iterator<Item = i64>,
        existing: Option<&FactorMap>,
    ) -> CoreResult<FactorMap> {
        let Params { rank, seed, n_partitions } = self.params;
        let n_existing = existing.map_or(0, FactorMap::len);
        let existing = existing
            .into_iter()
            .flatten()
            .map(|(id, factor)| (*id, Arc::clone(factor)));

        let merged = full_outer_join(ids.unique().map(|id| (id, ())), existing, n_partitions)?
            .try_map_partitions(|partition_index, partition| {
                let mut generator = RandomFactorGenerator::new(rank);
                generator.set_seed(self.seeds.derive(seed, side, partition_index));
                let factors = partition
                    .into_iter()
                    .map(|(id, entry)| match entry {
                        Both((), factor) | Right(factor) => (id, factor),
                        Left(()) => (id, Arc::new(generator.next_value())),
                    })
                    .collect::<Vec<_>>();
                debug!(%side, partition_index, n_factors = factors.len());
                Ok::<_, Error>(factors)
            })?;

        let merged = merged.into_records().collect::<FactorMap>();
        debug!(%side, n_factors = merged.len(), n_generated = merged.len() - n_existing);
        Ok(merged)
    }
}

/// Computes the new global bias and the number of examples it is based upon.
///
/// Only a streaming prior contributes its history. An empty batch keeps the prior bias.
fn global_bias(batch: &RatingSum, prior: Option<&Model>) -> CoreResult<(f32, u64)> {
    match prior {
        Some(Model::Streaming(prior)) => Ok(batch
            .mean_after(f64::from(prior.model.global_bias), prior.observed_examples)
            .map_or((prior.model.global_bias, 0), |(mean, count)| (mean as f32, count))),
        _ => match (batch.mean(), prior) {
            (Some(mean), _) => Ok((mean as f32, batch.count)),
            (None, Some(prior)) => Ok((prior.global_bias(), 0)),
            (None, None) => Err(Error::EmptyBatchBias),
        },
    }
}
