use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreError;
use crate::reviews::repo_types::{NewReview, Review, ReviewChanges};

/// Persistence for reviews. Ownership is checked by the caller; the store only
/// guarantees one review per (user, game).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Reviews of `user_id`, newest first, optionally narrowed to games whose
    /// name or slug contains `search` (case-insensitive).
    async fn list_by_user(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Review>, StoreError>;
    /// A second review of the same game by the same user yields `StoreError::UniqueViolation`.
    async fn create(&self, new: NewReview) -> Result<Review, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, StoreError>;
    async fn update(
        &self,
        id: Uuid,
        changes: ReviewChanges,
        now: OffsetDateTime,
    ) -> Result<Option<Review>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const REVIEW_COLUMNS: &str = "id, user_id, game_id, game_slug, game_name, rating, \
     description, comment, created_at, updated_at";

#[derive(Clone)]
pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Review>, StoreError> {
        // strpos keeps the search a literal substring, no LIKE wildcards
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE user_id = $1 \
               AND ($2::text IS NULL \
                    OR strpos(lower(game_name), lower($2)) > 0 \
                    OR strpos(lower(game_slug), lower($2)) > 0) \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .bind(search)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create(&self, new: NewReview) -> Result<Review, StoreError> {
        let sql = format!(
            "INSERT INTO reviews \
                 (id, user_id, game_id, game_slug, game_name, rating, description, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(new.game_id)
            .bind(&new.game_slug)
            .bind(&new.game_name)
            .bind(new.rating)
            .bind(&new.description)
            .bind(&new.comment)
            .fetch_one(&self.db)
            .await?;
        Ok(review)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(review)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ReviewChanges,
        now: OffsetDateTime,
    ) -> Result<Option<Review>, StoreError> {
        let sql = format!(
            "UPDATE reviews \
                SET rating = COALESCE($2, rating), \
                    description = COALESCE($3, description), \
                    comment = CASE WHEN $4 THEN $5 ELSE comment END, \
                    updated_at = $6 \
              WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(changes.rating)
            .bind(changes.description)
            .bind(changes.comment.is_some())
            .bind(changes.comment.flatten())
            .bind(now)
            .fetch_optional(&self.db)
            .await?;
        Ok(review)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
