//! Serializable view of a model, the hand-off point to persistence.

use std::io::{Read, Write};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, Error};
use crate::factor::LatentEntry;
use crate::model::{FactorMap, FactorModel, FallbackPolicy, Model, StreamingModel};
use crate::prelude::*;
use crate::seed::Side;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub rank: usize,
    pub global_bias: f32,

    /// Present for streaming models only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_examples: Option<u64>,

    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Sorted by ID.
    pub users: Vec<LatentEntry>,

    /// Sorted by ID.
    pub items: Vec<LatentEntry>,
}

impl From<&Model> for ModelSnapshot {
    fn from(model: &Model) -> Self {
        let factors = model.factors();
        Self {
            rank: factors.rank,
            global_bias: factors.global_bias,
            observed_examples: model.observed_examples(),
            fallback: factors.fallback,
            users: to_entries(&factors.users),
            items: to_entries(&factors.items),
        }
    }
}

impl TryFrom<ModelSnapshot> for Model {
    type Error = Error;

    fn try_from(snapshot: ModelSnapshot) -> CoreResult<Self> {
        if snapshot.rank == 0 {
            return Err(Error::InvalidRank);
        }
        let model = FactorModel {
            rank: snapshot.rank,
            global_bias: snapshot.global_bias,
            fallback: snapshot.fallback,
            users: to_factor_map(Side::User, snapshot.users, snapshot.rank)?,
            items: to_factor_map(Side::Item, snapshot.items, snapshot.rank)?,
        };
        Ok(match snapshot.observed_examples {
            Some(observed_examples) => Self::Streaming(StreamingModel {
                model,
                observed_examples,
            }),
            None => Self::Batch(model),
        })
    }
}

fn to_entries(factors: &FactorMap) -> Vec<LatentEntry> {
    factors
        .iter()
        .map(|(id, latent)| LatentEntry {
            id: *id,
            latent: latent.as_ref().clone(),
        })
        .sorted_by_key(|entry| entry.id)
        .collect()
}

fn to_factor_map(side: Side, entries: Vec<LatentEntry>, rank: usize) -> CoreResult<FactorMap> {
    let mut factors = FactorMap::default();
    factors.reserve(entries.len());
    for LatentEntry { id, latent } in entries {
        if latent.rank() != rank {
            return Err(Error::VectorLengthMismatch {
                left: rank,
                right: latent.rank(),
            });
        }
        if factors.insert(id, Arc::new(latent)).is_some() {
            return Err(Error::DuplicateEntry { side, id });
        }
    }
    Ok(factors)
}

pub fn read_model(reader: impl Read) -> Result<Model> {
    let snapshot: ModelSnapshot =
        serde_json::from_reader(reader).context("failed to deserialize the model snapshot")?;
    Ok(Model::try_from(snapshot)?)
}

pub fn write_model(writer: impl Write, model: &Model) -> Result {
    serde_json::to_writer(writer, &ModelSnapshot::from(model))
        .context("failed to serialize the model snapshot")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::LatentFactor;
    use crate::model::Predict;

    fn entry(id: i64, bias: f32, vector: Vec<f32>) -> LatentEntry {
        LatentEntry {
            id,
            latent: LatentFactor::new(bias, vector),
        }
    }

    fn snapshot() -> ModelSnapshot {
        ModelSnapshot {
            rank: 2,
            global_bias: 3.0,
            observed_examples: Some(12),
            fallback: FallbackPolicy::Estimate,
            users: vec![entry(1, 0.5, vec![1.0, 0.0]), entry(4, 0.25, vec![0.0, 1.0])],
            items: vec![entry(7, -0.5, vec![2.0, 3.0])],
        }
    }

    #[test]
    fn streaming_snapshot_ok() -> crate::Result {
        let model = Model::try_from(snapshot())?;
        assert_eq!(model.observed_examples(), Some(12));
        assert!((model.predict(1, 7)? - 5.0).abs() < f32::EPSILON);
        assert_eq!(ModelSnapshot::from(&model), snapshot());
        Ok(())
    }

    #[test]
    fn batch_snapshot_ok() -> crate::Result {
        let json = serde_json::to_string(&ModelSnapshot {
            observed_examples: None,
            ..snapshot()
        })?;
        assert!(!json.contains("observed_examples"));
        let model = read_model(json.as_bytes())?;
        assert!(!model.is_streaming());
        Ok(())
    }

    #[test]
    fn fallback_defaults_to_estimate() -> crate::Result {
        let model = read_model(
            // language=json
            r#"{"rank":1,"global_bias":2.5,"users":[],"items":[{"id":3,"latent":{"bias":0.5,"vector":[1.0]}}]}"#
                .as_bytes(),
        )?;
        assert_eq!(model.factors().fallback, FallbackPolicy::Estimate);
        assert!((model.predict(1, 3)? - 3.0).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn write_then_read_ok() -> crate::Result {
        let model = Model::try_from(snapshot())?;
        let mut buffer = Vec::new();
        write_model(&mut buffer, &model)?;
        let restored = read_model(buffer.as_slice())?;
        assert_eq!(ModelSnapshot::from(&restored), snapshot());
        Ok(())
    }

    #[test]
    fn duplicate_entry_rejected() {
        let mut snapshot = snapshot();
        snapshot.items.push(entry(7, 0.0, vec![0.0, 0.0]));
        assert_eq!(
            Model::try_from(snapshot).err(),
            Some(Error::DuplicateEntry { side: Side::Item, id: 7 }),
        );
    }

    #[test]
    fn wrong_vector_length_rejected() {
        let mut snapshot = snapshot();
        snapshot.users.push(entry(9, 0.0, vec![0.0]));
        assert_eq!(
            Model::try_from(snapshot).err(),
            Some(Error::VectorLengthMismatch { left: 2, right: 1 }),
        );
    }

    #[test]
    fn zero_rank_rejected() {
        let snapshot = ModelSnapshot {
            rank: 0,
            users: Vec::new(),
            items: Vec::new(),
            ..snapshot()
        };
        assert_eq!(Model::try_from(snapshot).err(), Some(Error::InvalidRank));
    }
}
