//! In-process store used by unit tests. Enforces the same unique keys as the
//! Postgres schema so conflict paths can be exercised without a database.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    db::StoreError,
    reviews::{
        repo::ReviewStore,
        repo_types::{NewReview, Review, ReviewChanges},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    reviews: Mutex<Vec<Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Moves a stored reset expiry, for exercising expired tokens.
    pub fn set_reset_expiry(&self, email: &str, expires: OffsetDateTime) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.reset_password_expires = Some(expires);
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            avatar_url: None,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.user_by_email(email))
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.reset_password_token = Some(token_hash.to_string());
            user.reset_password_expires = Some(expires);
        }
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token_hash)
                    && u.reset_password_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn complete_reset(
        &self,
        user_id: Uuid,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.id == user_id && u.reset_password_token.as_deref() == Some(token_hash))
        {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.reset_password_token = None;
                user.reset_password_expires = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Review>, StoreError> {
        let needle = search.map(str::to_lowercase);
        let mut rows: Vec<Review> = self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| match &needle {
                Some(n) => {
                    r.game_name.to_lowercase().contains(n) || r.game_slug.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn create(&self, new: NewReview) -> Result<Review, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        if reviews
            .iter()
            .any(|r| r.user_id == new.user_id && r.game_id == new.game_id)
        {
            return Err(StoreError::UniqueViolation);
        }
        // created_at stays strictly increasing
        let mut now = OffsetDateTime::now_utc();
        if let Some(latest) = reviews.iter().map(|r| r.created_at).max() {
            if now <= latest {
                now = latest + time::Duration::nanoseconds(1);
            }
        }
        let review = Review {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            game_id: new.game_id,
            game_slug: new.game_slug,
            game_name: new.game_name,
            rating: new.rating,
            description: new.description,
            comment: new.comment,
            created_at: now,
            updated_at: now,
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ReviewChanges,
        now: OffsetDateTime,
    ) -> Result<Option<Review>, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        let Some(review) = reviews.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }
        if let Some(description) = changes.description {
            review.description = description;
        }
        if let Some(comment) = changes.comment {
            review.comment = comment;
        }
        review.updated_at = now;
        Ok(Some(review.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        Ok(reviews.len() != before)
    }
}
