use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::FieldError;
use crate::reviews::repo_types::{NewReview, ReviewChanges};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

/// Keeps an explicit `null` (`Some(Value::Null)`) apart from an absent field (`None`).
fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// JSON integers, or strings holding one (`"2"`).
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn int_field(
    value: Option<Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    match value {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
        Some(v) => {
            let parsed = as_int(&v);
            if parsed.is_none() {
                errors.push(FieldError::new(field, format!("{field} must be an integer")));
            }
            parsed
        }
    }
}

fn check_rating(value: &Value, errors: &mut Vec<FieldError>) -> Option<i32> {
    match as_int(value) {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => Some(r as i32),
        _ => {
            errors.push(FieldError::new(
                "rating",
                format!("rating must be an integer between {MIN_RATING} and {MAX_RATING}"),
            ));
            None
        }
    }
}

/// Non-blank string, trimmed.
fn required_text(
    value: Option<Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
        Some(_) => {
            errors.push(FieldError::new(field, format!("{field} must be a string")));
            None
        }
    }
}

/// `null` clears the comment, a string sets it.
fn comment_field(value: Value, errors: &mut Vec<FieldError>) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s)),
        _ => {
            errors.push(FieldError::new("comment", "comment must be a string"));
            None
        }
    }
}

/// Query string for `GET /reviews`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

impl ListQuery {
    /// Blank searches count as no search.
    pub fn search(self) -> Option<String> {
        self.search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Body of `POST /reviews`. Also accepts the catalog's `rawg_game_*` field names.
/// Fields stay untyped until `validate` so a bad value is reported against its own name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default, deserialize_with = "present", alias = "rawg_game_id")]
    pub game_id: Option<Value>,
    #[serde(default, deserialize_with = "present", alias = "rawg_game_slug")]
    pub slug: Option<Value>,
    #[serde(default, deserialize_with = "present", alias = "rawg_game_name")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub comment: Option<Value>,
}

impl CreateReviewRequest {
    pub fn validate(self, user_id: Uuid) -> Result<NewReview, Vec<FieldError>> {
        let mut errors = Vec::new();

        let game_id = int_field(self.game_id, "gameId", &mut errors);
        let game_slug = required_text(self.slug, "slug", &mut errors);
        let game_name = required_text(self.name, "name", &mut errors);
        let rating = match self.rating {
            None | Some(Value::Null) => {
                errors.push(FieldError::new("rating", "rating is required"));
                None
            }
            Some(v) => check_rating(&v, &mut errors),
        };
        let description = required_text(self.description, "description", &mut errors);
        let comment = self
            .comment
            .and_then(|c| comment_field(c, &mut errors))
            .flatten();

        match (game_id, game_slug, game_name, rating, description) {
            (Some(game_id), Some(game_slug), Some(game_name), Some(rating), Some(description))
                if errors.is_empty() =>
            {
                Ok(NewReview {
                    user_id,
                    game_id,
                    game_slug,
                    game_name,
                    rating,
                    description,
                    comment,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Body of `PUT /reviews/:id`. Absent fields stay as they are; `comment: null`
/// clears the comment, while `null` for rating or description is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub comment: Option<Value>,
}

impl UpdateReviewRequest {
    pub fn validate(self) -> Result<ReviewChanges, Vec<FieldError>> {
        let mut errors = Vec::new();

        let rating = self.rating.and_then(|r| check_rating(&r, &mut errors));
        let description = match self.description {
            None => None,
            Some(Value::String(d)) if !d.trim().is_empty() => Some(d.trim().to_string()),
            Some(_) => {
                errors.push(FieldError::new(
                    "description",
                    "description must be a non-empty string",
                ));
                None
            }
        };
        let comment = self.comment.and_then(|c| comment_field(c, &mut errors));

        if errors.is_empty() {
            Ok(ReviewChanges {
                rating,
                description,
                comment,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}
