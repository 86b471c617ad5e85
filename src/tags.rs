// 🏷️ Stock Tags - what the dashboard attaches to a trending topic

use crate::catalog::StockEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrigin {
    /// Picked automatically from the topic title
    Trending,

    /// Picked by an operator
    Manual,
}

impl TagOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagOrigin::Trending => "trending",
            TagOrigin::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTag {
    pub code: String,
    pub name: String,
    pub origin: TagOrigin,
}

impl StockTag {
    pub fn from_entry(entry: &StockEntry, origin: TagOrigin) -> Self {
        StockTag {
            code: entry.code.clone(),
            name: entry.name.clone(),
            origin,
        }
    }
}
