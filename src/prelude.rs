pub use std::result::Result as StdResult;
pub use std::sync::Arc;
pub use std::time::Duration as StdDuration;

pub use anyhow::{anyhow, Context};
pub use tracing::{debug, info, instrument, warn};

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
pub type AHashSet<T> = std::collections::HashSet<T, ahash::RandomState>;

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
