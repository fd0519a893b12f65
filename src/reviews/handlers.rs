use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiJson},
    reviews::{
        dto::{CreateReviewRequest, DeletedResponse, ListQuery, UpdateReviewRequest},
        repo_types::Review,
        services::{self, REVIEW_DELETED, REVIEW_NOT_FOUND},
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/:id",
            get(get_review).put(update_review).delete(delete_review),
        )
}

/// Ids that are not UUIDs cannot name a stored review.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(REVIEW_NOT_FOUND.into()))
}

#[instrument(skip(state, query))]
pub async fn list_reviews(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = services::list(state.reviews.as_ref(), user_id, query.search()).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = services::create(state.reviews.as_ref(), user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Review>, ApiError> {
    let review = services::get(state.reviews.as_ref(), parse_id(&id)?, user_id).await?;
    Ok(Json(review))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = services::update(state.reviews.as_ref(), parse_id(&id)?, user_id, payload).await?;
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    services::delete(state.reviews.as_ref(), parse_id(&id)?, user_id).await?;
    Ok(Json(DeletedResponse {
        message: REVIEW_DELETED.into(),
    }))
}
