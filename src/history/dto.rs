use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::history::repo::HistoryEntry;
use crate::recipes::RecipeResponse;

#[derive(Debug, Deserialize)]
pub struct AddHistoryRequest {
    pub recipe_id: Uuid,
    pub cooked_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub rating: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHistoryRequest {
    pub notes: Option<String>,
    pub rating: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// A history entry joined with its recipe for the recent-cooking feed.
#[derive(Debug, Serialize)]
pub struct RecentHistoryItem {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub recipe: Option<RecipeResponse>,
}
