/// User model and database operations
///
/// Accounts are looked up by email for signin; the `email` column is CITEXT
/// so uniqueness and lookups are case-insensitive. Passwords are stored as
/// Argon2id hashes, never in plaintext. Per-user preference columns back the
/// settings endpoints.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     avatar VARCHAR(512),
///     theme VARCHAR(20) NOT NULL DEFAULT 'light',
///     language VARCHAR(10) NOT NULL DEFAULT 'en',
///     timezone VARCHAR(50) NOT NULL DEFAULT 'UTC',
///     email_notifications BOOLEAN NOT NULL DEFAULT TRUE,
///     push_notifications BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, avatar, theme, \
     language, timezone, email_notifications, push_notifications, created_at, updated_at, \
     last_login_at";

/// User account row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    /// Optional avatar URL
    pub avatar: Option<String>,

    /// UI theme preference ("light" or "dark")
    pub theme: String,

    /// Locale code, e.g. "en"
    pub language: String,

    /// IANA timezone name
    pub timezone: String,

    pub email_notifications: bool,
    pub push_notifications: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// User shape returned over the wire; never includes the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-user preferences returned by the settings endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: String,
    pub language: String,
    pub timezone: String,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
}

/// Profile fields updatable via PUT /users/profile; None fields are skipped
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<Option<String>>,
}

/// Settings fields updatable via PUT /users/settings; None fields are skipped
#[derive(Debug, Clone, Default)]
pub struct UpdateSettings {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}

impl User {
    /// Wire shape for this account
    pub fn public_profile(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at,
        }
    }

    /// Current preference values for the settings endpoint
    pub fn settings(&self) -> UserSettings {
        UserSettings {
            theme: self.theme.clone(),
            language: self.language.clone(),
            timezone: self.timezone.clone(),
            notifications: NotificationSettings {
                email: self.email_notifications,
                push: self.push_notifications,
            },
        }
    }

    /// Creates a new user
    ///
    /// Fails with a unique-constraint violation if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.first_name)
            .bind(data.last_name)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Updates profile fields; only non-None fields are written
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.avatar.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(avatar) = data.avatar {
            q = q.bind(avatar);
        }

        q.fetch_optional(pool).await
    }

    /// Updates preference fields; only non-None fields are written
    pub async fn update_settings(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSettings,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.theme.is_some() {
            bind_count += 1;
            query.push_str(&format!(", theme = ${}", bind_count));
        }
        if data.language.is_some() {
            bind_count += 1;
            query.push_str(&format!(", language = ${}", bind_count));
        }
        if data.timezone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", timezone = ${}", bind_count));
        }
        if data.email_notifications.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email_notifications = ${}", bind_count));
        }
        if data.push_notifications.is_some() {
            bind_count += 1;
            query.push_str(&format!(", push_notifications = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);
        if let Some(theme) = data.theme {
            q = q.bind(theme);
        }
        if let Some(language) = data.language {
            q = q.bind(language);
        }
        if let Some(timezone) = data.timezone {
            q = q.bind(timezone);
        }
        if let Some(email_notifications) = data.email_notifications {
            q = q.bind(email_notifications);
        }
        if let Some(push_notifications) = data.push_notifications {
            q = q.bind(push_notifications);
        }

        q.fetch_optional(pool).await
    }

    /// Stamps last_login_at, called on every successful signin
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Searches users by name or email for the member picker
    ///
    /// Case-insensitive substring match, capped at 10 rows. When
    /// `exclude_members_of` is given, users already on that project's
    /// member list are filtered out in the query.
    pub async fn search(
        pool: &PgPool,
        term: &str,
        exclude_members_of: Option<Uuid>,
    ) -> Result<Vec<PublicUser>, sqlx::Error> {
        let pattern = format!("%{}%", term);

        let users = match exclude_members_of {
            Some(project_id) => {
                let query = format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE (first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1) \
                       AND id NOT IN (SELECT user_id FROM project_members WHERE project_id = $2) \
                     LIMIT 10"
                );
                sqlx::query_as::<_, User>(&query)
                    .bind(&pattern)
                    .bind(project_id)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1 \
                     LIMIT 10"
                );
                sqlx::query_as::<_, User>(&query)
                    .bind(&pattern)
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(users.iter().map(User::public_profile).collect())
    }

    /// Deletes a user account
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            avatar: None,
            theme: "dark".to_string(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            email_notifications: true,
            push_notifications: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_public_profile_hides_password_hash() {
        let user = sample_user();
        let json = serde_json::to_value(user.public_profile()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["email"], "jane@example.com");
    }

    #[test]
    fn test_settings_shape() {
        let user = sample_user();
        let json = serde_json::to_value(user.settings()).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["notifications"]["email"], true);
        assert_eq!(json["notifications"]["push"], false);
    }
}
