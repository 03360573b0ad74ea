/// Authentication endpoints
///
/// - `POST /api/auth/signup` - create an account, returns user + token
/// - `POST /api/auth/signin` - verify credentials, returns user + token
/// - `GET  /api/auth/me`     - current user from the bearer token
/// - `POST /api/auth/logout` - stateless; the client discards its token
use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, PublicUser, User},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Payload for signup/signin responses
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: PublicUser,
}

/// Registers a new account
///
/// # Errors
///
/// - `400` validation or password-strength failure
/// - `409` email already registered
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    req.validate().map_err(|e| validation_error(&e))?;
    password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_lowercase(),
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "Account created successfully",
            AuthPayload {
                user: user.public_profile(),
                token,
            },
        ),
    ))
}

/// Verifies credentials and issues a token
///
/// A wrong email and a wrong password answer identically so the endpoint
/// does not leak which accounts exist.
pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> ApiResult<Json<ApiResponse<AuthPayload>>> {
    req.validate().map_err(|e| validation_error(&e))?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())
        .map_err(ApiError::from)?;

    Ok(ApiResponse::ok(
        "Signed in successfully",
        AuthPayload {
            user: user.public_profile(),
            token,
        },
    ))
}

/// Returns the account behind the bearer token
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserPayload>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "User retrieved successfully",
        UserPayload {
            user: user.public_profile(),
        },
    ))
}

/// Logout acknowledgment; tokens are stateless so nothing is revoked
pub async fn logout() -> Json<ApiResponse<()>> {
    ApiResponse::message("Logged out successfully")
}
