use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::ApiError,
    reviews::{
        dto::{CreateReviewRequest, UpdateReviewRequest},
        repo::ReviewStore,
        repo_types::Review,
    },
};

pub const REVIEW_NOT_FOUND: &str = "review not found";
pub const NOT_OWNER: &str = "not allowed to access this review";
pub const ALREADY_REVIEWED: &str = "game already reviewed";
pub const REVIEW_DELETED: &str = "review deleted";

/// Loads a review and checks it belongs to `owner`: absent is 404, someone else's is 403.
async fn owned(reviews: &dyn ReviewStore, id: Uuid, owner: Uuid) -> Result<Review, ApiError> {
    let review = reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(REVIEW_NOT_FOUND.into()))?;
    if review.user_id != owner {
        warn!(review_id = %id, caller = %owner, "review owned by another user");
        return Err(ApiError::Forbidden(NOT_OWNER.into()));
    }
    Ok(review)
}

pub async fn list(
    reviews: &dyn ReviewStore,
    owner: Uuid,
    search: Option<String>,
) -> Result<Vec<Review>, ApiError> {
    Ok(reviews.list_by_user(owner, search.as_deref()).await?)
}

pub async fn create(
    reviews: &dyn ReviewStore,
    owner: Uuid,
    req: CreateReviewRequest,
) -> Result<Review, ApiError> {
    let new = req.validate(owner).map_err(ApiError::Validation)?;
    let game_id = new.game_id;
    match reviews.create(new).await {
        Ok(review) => {
            info!(review_id = %review.id, user_id = %owner, game_id, "review created");
            Ok(review)
        }
        Err(StoreError::UniqueViolation) => {
            warn!(user_id = %owner, game_id, "game already reviewed");
            Err(ApiError::Conflict(ALREADY_REVIEWED.into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get(reviews: &dyn ReviewStore, id: Uuid, owner: Uuid) -> Result<Review, ApiError> {
    owned(reviews, id, owner).await
}

/// Applies the owner's partial edit and refreshes `updated_at`.
pub async fn update(
    reviews: &dyn ReviewStore,
    id: Uuid,
    owner: Uuid,
    req: UpdateReviewRequest,
) -> Result<Review, ApiError> {
    let changes = req.validate().map_err(ApiError::Validation)?;
    owned(reviews, id, owner).await?;
    let review = reviews
        .update(id, changes, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| ApiError::NotFound(REVIEW_NOT_FOUND.into()))?;
    info!(review_id = %id, "review updated");
    Ok(review)
}

pub async fn delete(reviews: &dyn ReviewStore, id: Uuid, owner: Uuid) -> Result<(), ApiError> {
    owned(reviews, id, owner).await?;
    if !reviews.delete(id).await? {
        return Err(ApiError::NotFound(REVIEW_NOT_FOUND.into()));
    }
    info!(review_id = %id, "review deleted");
    Ok(())
}
