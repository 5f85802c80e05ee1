//! Latent factor model core for streaming collaborative filtering:
//! model initialization and merging, and rating prediction.

pub mod error;
pub mod factor;
pub mod generator;
pub mod helpers;
pub mod ingest;
pub mod initializer;
pub mod math;
pub mod metrics;
pub mod model;
pub mod partition;
pub mod prelude;
pub mod rating;
pub mod seed;

pub use crate::error::Error;
pub use crate::initializer::{Initializer, Params};
pub use crate::model::{Model, Predict};
pub use crate::prelude::{Result, StdResult};
