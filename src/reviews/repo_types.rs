use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A user's review of one catalog game, as stored and as returned over the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: i64,
    #[serde(rename = "slug")]
    pub game_slug: String,
    #[serde(rename = "name")]
    pub game_name: String,
    pub rating: i32,
    pub description: String,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub game_id: i64,
    pub game_slug: String,
    pub game_name: String,
    pub rating: i32,
    pub description: String,
    pub comment: Option<String>,
}

/// Owner-editable fields; `None` leaves the stored value alone.
/// `comment: Some(None)` clears the comment.
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub description: Option<String>,
    pub comment: Option<Option<String>>,
}
