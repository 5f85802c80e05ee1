//! Latent factor model and rating prediction.

pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::factor::LatentFactor;
use crate::partition::join::left_outer_join;
use crate::partition::Partitioned;
use crate::prelude::*;
use crate::rating::Pair;

/// Factors are shared between successive models: an unchanged factor of a prior
/// model is aliased, never copied, and is only mutated through copy-on-write.
pub type FactorMap = AHashMap<i64, Arc<LatentFactor>>;

/// What to return when a user's or an item's factors are unknown.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Global bias plus whichever side's bias is known.
    #[default]
    Estimate,

    /// Constant zero, regardless of the biases.
    Zero,
}

/// Read-only prediction interface shared by the model variants.
pub trait Predict {
    fn predict(&self, user: i64, item: i64) -> CoreResult<f32>;

    /// Predicts every pair, including the pairs with unseen users or items.
    ///
    /// Output order is unspecified, but there is exactly one prediction per input pair.
    fn predict_all(&self, pairs: Partitioned<Pair>) -> CoreResult<Partitioned<Prediction>>;
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Prediction {
    pub user: i64,
    pub item: i64,
    pub rating: f32,
}

#[derive(Debug, Clone)]
pub struct FactorModel {
    pub rank: usize,
    pub users: FactorMap,
    pub items: FactorMap,
    pub global_bias: f32,
    pub fallback: FallbackPolicy,
}

impl FactorModel {
    #[must_use]
    pub fn new(rank: usize, global_bias: f32) -> Self {
        Self {
            rank,
            global_bias,
            users: FactorMap::default(),
            items: FactorMap::default(),
            fallback: FallbackPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn user(&self, id: i64) -> Option<&LatentFactor> {
        self.users.get(&id).map(Arc::as_ref)
    }

    #[must_use]
    pub fn item(&self, id: i64) -> Option<&LatentFactor> {
        self.items.get(&id).map(Arc::as_ref)
    }

    /// Mutable access for an optimizer, detaches the factor from any model sharing it.
    pub fn user_mut(&mut self, id: i64) -> Option<&mut LatentFactor> {
        self.users.get_mut(&id).map(Arc::make_mut)
    }

    /// See [`FactorModel::user_mut`].
    pub fn item_mut(&mut self, id: i64) -> Option<&mut LatentFactor> {
        self.items.get_mut(&id).map(Arc::make_mut)
    }
}

impl Predict for FactorModel {
    fn predict(&self, user: i64, item: i64) -> CoreResult<f32> {
        estimate(
            user,
            self.user(user),
            item,
            self.item(item),
            self.global_bias,
            self.fallback,
        )
    }

    #[instrument(level = "debug", skip_all, fields(n_pairs = pairs.len()))]
    fn predict_all(&self, pairs: Partitioned<Pair>) -> CoreResult<Partitioned<Prediction>> {
        let n_partitions = pairs.n_partitions();
        let global_bias = self.global_bias;
        let fallback = self.fallback;

        let with_users = left_outer_join(
            pairs.into_records().map(|pair| (pair.user, pair.item)),
            self.users.iter().map(|(id, factor)| (*id, Arc::clone(factor))),
            n_partitions,
        )?;
        let with_items = left_outer_join(
            with_users
                .into_records()
                .map(|(user, item, user_factor)| (item, (user, user_factor))),
            self.items.iter().map(|(id, factor)| (*id, Arc::clone(factor))),
            n_partitions,
        )?;

        with_items.try_map_partitions(move |_, partition| {
            partition
                .into_iter()
                .map(|(item, (user, user_factor), item_factor)| {
                    let rating = estimate(
                        user,
                        user_factor.as_deref(),
                        item,
                        item_factor.as_deref(),
                        global_bias,
                        fallback,
                    )?;
                    Ok(Prediction { user, item, rating })
                })
                .collect::<CoreResult<Vec<_>>>()
        })
    }
}

fn estimate(
    user_id: i64,
    user: Option<&LatentFactor>,
    item_id: i64,
    item: Option<&LatentFactor>,
    global_bias: f32,
    fallback: FallbackPolicy,
) -> CoreResult<f32> {
    let estimate = match (user, item) {
        (Some(user), Some(item)) => {
            return Ok(user.dot(item)? + user.bias + item.bias + global_bias);
        }
        (Some(user), None) => {
            warn!(item_id, "item data missing for item #{}; using user factors", item_id);
            global_bias + user.bias
        }
        (None, Some(item)) => {
            warn!(user_id, "user data missing for user #{}; using item factors", user_id);
            global_bias + item.bias
        }
        (None, None) => {
            warn!(user_id, item_id, "both user and item factors missing; returning global average");
            global_bias
        }
    };
    Ok(match fallback {
        FallbackPolicy::Estimate => estimate,
        FallbackPolicy::Zero => 0.0,
    })
}

/// Model that also counts the ratings folded into its global bias,
/// so that the bias can be updated incrementally.
#[derive(Debug, Clone)]
pub struct StreamingModel {
    pub model: FactorModel,
    pub observed_examples: u64,
}

#[derive(Debug, Clone)]
pub enum Model {
    Batch(FactorModel),
    Streaming(StreamingModel),
}

impl Model {
    #[must_use]
    pub fn factors(&self) -> &FactorModel {
        match self {
            Self::Batch(model) | Self::Streaming(StreamingModel { model, .. }) => model,
        }
    }

    #[must_use]
    pub fn factors_mut(&mut self) -> &mut FactorModel {
        match self {
            Self::Batch(model) | Self::Streaming(StreamingModel { model, .. }) => model,
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.factors().rank
    }

    #[must_use]
    pub fn global_bias(&self) -> f32 {
        self.factors().global_bias
    }

    /// Number of ratings folded into the global bias, tracked by streaming models only.
    #[must_use]
    pub fn observed_examples(&self) -> Option<u64> {
        match self {
            Self::Batch(_) => None,
            Self::Streaming(model) => Some(model.observed_examples),
        }
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }
}

impl Predict for Model {
    fn predict(&self, user: i64, item: i64) -> CoreResult<f32> {
        self.factors().predict(user, item)
    }

    fn predict_all(&self, pairs: Partitioned<Pair>) -> CoreResult<Partitioned<Prediction>> {
        self.factors().predict_all(pairs)
    }
}
