/// User profile and settings endpoints
///
/// - `GET    /api/users/profile`
/// - `PUT    /api/users/profile`  - email change checks for collisions
/// - `DELETE /api/users/profile`  - owned rows are removed via FK cascade
/// - `GET    /api/users/settings`
/// - `PUT    /api/users/settings`
use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    auth::middleware::AuthContext,
    models::user::{PublicUser, UpdateProfile, UpdateSettings, User, UserSettings},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub notifications: Option<NotificationsRequest>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsRequest {
    pub email: Option<bool>,
    pub push: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct SettingsPayload {
    pub settings: UserSettings,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserPayload>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Profile retrieved successfully",
        UserPayload {
            user: user.public_profile(),
        },
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserPayload>>> {
    req.validate().map_err(|e| validation_error(&e))?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Changing email requires the new address to be free.
    let email = match req.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if !email.eq_ignore_ascii_case(&user.email) {
                if User::find_by_email(&state.db, &email).await?.is_some() {
                    return Err(ApiError::Conflict("Email is already taken".to_string()));
                }
            }
            Some(email)
        }
        None => None,
    };

    let updated = User::update_profile(
        &state.db,
        auth.user_id,
        UpdateProfile {
            first_name: req.first_name.map(|v| v.trim().to_string()),
            last_name: req.last_name.map(|v| v.trim().to_string()),
            email,
            avatar: req.avatar.map(Some),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Profile updated successfully",
        UserPayload {
            user: updated.public_profile(),
        },
    ))
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<SettingsPayload>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Settings retrieved successfully",
        SettingsPayload {
            settings: user.settings(),
        },
    ))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<ApiResponse<SettingsPayload>>> {
    if let Some(theme) = req.theme.as_deref() {
        if !matches!(theme, "light" | "dark") {
            return Err(ApiError::BadRequest("Invalid theme value".to_string()));
        }
    }

    let (email_notifications, push_notifications) = match &req.notifications {
        Some(n) => (n.email, n.push),
        None => (None, None),
    };

    let updated = User::update_settings(
        &state.db,
        auth.user_id,
        UpdateSettings {
            theme: req.theme,
            language: req.language,
            timezone: req.timezone,
            email_notifications,
            push_notifications,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Settings updated successfully",
        SettingsPayload {
            settings: updated.settings(),
        },
    ))
}

/// Deletes the account; tasks, events, memberships, and owned projects go
/// with it through the FK cascade rules
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = User::delete(&state.db, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(ApiResponse::message("Profile deleted successfully"))
}
