use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
            ResetPasswordRequest,
        },
        jwt::JwtKeys,
        password::{generate_reset_token, hash_password, hash_reset_token, verify_password},
        repo::UserStore,
        repo_types::NewUser,
    },
    db::StoreError,
    error::ApiError,
};

pub const EMAIL_TAKEN: &str = "email already registered";
pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const RESET_REQUESTED: &str =
    "if the email is registered, password reset instructions have been sent";
pub const INVALID_RESET_TOKEN: &str = "invalid or expired token";
pub const PASSWORD_UPDATED: &str = "password updated";

const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Creates the account and returns a session token for it.
pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    mut req: RegisterRequest,
) -> Result<String, ApiError> {
    ApiError::check(req.validate())?;

    if users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = match users
        .create(NewUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        // lost a race against a concurrent registration
        Err(StoreError::UniqueViolation) => return Err(ApiError::BadRequest(EMAIL_TAKEN.into())),
        Err(e) => return Err(e.into()),
    };

    let token = keys.issue(&user)?;
    info!(user_id = %user.id, "user registered");
    Ok(token)
}

/// Returns a session token; unknown email and wrong password fail identically.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    mut req: LoginRequest,
) -> Result<String, ApiError> {
    ApiError::check(req.validate())?;

    let Some(user) = users.find_by_email(&req.email).await? else {
        warn!("login unknown email");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let token = keys.issue(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Stores a fresh reset-token digest for a known email. The response carries the
/// same message either way; the plaintext token is attached only when
/// `expose_token` is set, standing in for an email channel.
pub async fn forgot_password(
    users: &dyn UserStore,
    expose_token: bool,
    mut req: ForgotPasswordRequest,
) -> Result<MessageResponse, ApiError> {
    ApiError::check(req.validate())?;

    let mut response = MessageResponse::new(RESET_REQUESTED);
    let Some(user) = users.find_by_email(&req.email).await? else {
        return Ok(response);
    };

    let (token, digest) = generate_reset_token();
    let expires = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
    users.set_reset_token(user.id, &digest, expires).await?;
    info!(user_id = %user.id, "password reset requested");

    if expose_token {
        response.token = Some(token);
    }
    Ok(response)
}

/// Consumes a reset token and replaces the password.
pub async fn reset_password(
    users: &dyn UserStore,
    mut req: ResetPasswordRequest,
) -> Result<(), ApiError> {
    ApiError::check(req.validate())?;

    let digest = hash_reset_token(&req.token);
    let Some(user) = users
        .find_by_reset_token(&digest, OffsetDateTime::now_utc())
        .await?
    else {
        warn!("invalid or expired reset token");
        return Err(ApiError::BadRequest(INVALID_RESET_TOKEN.into()));
    };

    let password_hash = hash_password(&req.password)?;
    if !users.complete_reset(user.id, &digest, &password_hash).await? {
        warn!(user_id = %user.id, "reset token consumed concurrently");
        return Err(ApiError::BadRequest(INVALID_RESET_TOKEN.into()));
    }

    info!(user_id = %user.id, "password reset");
    Ok(())
}
