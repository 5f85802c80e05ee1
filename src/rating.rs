use serde::{Deserialize, Serialize};

/// Observed rating of an item by a user.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Rating {
    pub user: i64,
    pub item: i64,
    pub value: f32,
}

impl Rating {
    #[must_use]
    pub const fn new(user: i64, item: i64, value: f32) -> Self {
        Self { user, item, value }
    }
}

/// User and item to predict a rating for.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub user: i64,
    pub item: i64,
}

impl From<(i64, i64)> for Pair {
    fn from((user, item): (i64, i64)) -> Self {
        Self { user, item }
    }
}
