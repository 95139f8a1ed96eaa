use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// The single family account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub pin_hash: String, // Argon2 hash, not exposed in JSON
    pub can_generate_images: bool,
    pub created_at: OffsetDateTime,
}
