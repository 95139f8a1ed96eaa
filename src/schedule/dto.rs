use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::RecipeResponse;
use crate::schedule::repo::ScheduledMeal;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub recipe_id: Uuid,
    pub scheduled_for: OffsetDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub add_to_history: bool,
    pub history_notes: Option<String>,
    pub history_rating: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub scheduled_for: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// A planned meal joined with its recipe for the planner view.
#[derive(Debug, Serialize)]
pub struct ScheduledMealItem {
    #[serde(flatten)]
    pub meal: ScheduledMeal,
    pub recipe: Option<RecipeResponse>,
}
