/// Project membership model and database operations
///
/// Links users to projects with a role and a permission set. A (project,
/// user) pair is unique; removing a member flips `is_active` off instead of
/// deleting the row, and re-adding a previously removed member reactivates
/// it. Only active rows participate in the ownership union and access
/// checks.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('Owner', 'Manager', 'Developer', 'Tester', 'Viewer');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'Developer',
///     permissions JSONB NOT NULL,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::PublicUser;

const MEMBER_COLUMNS: &str =
    "id, project_id, user_id, role, permissions, joined_at, is_active, created_at, updated_at";

/// Role a user holds on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role")]
pub enum MemberRole {
    Owner,
    Manager,
    Developer,
    Tester,
    Viewer,
}

impl MemberRole {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Owner" => Some(MemberRole::Owner),
            "Manager" => Some(MemberRole::Manager),
            "Developer" => Some(MemberRole::Developer),
            "Tester" => Some(MemberRole::Tester),
            "Viewer" => Some(MemberRole::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "Owner",
            MemberRole::Manager => "Manager",
            MemberRole::Developer => "Developer",
            MemberRole::Tester => "Tester",
            MemberRole::Viewer => "Viewer",
        }
    }
}

/// Per-member permission flags stored as JSONB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPermissions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_invite: bool,
    pub can_manage_tasks: bool,
    pub can_view_reports: bool,
}

impl Default for MemberPermissions {
    fn default() -> Self {
        Self {
            can_edit: true,
            can_delete: false,
            can_invite: false,
            can_manage_tasks: true,
            can_view_reports: true,
        }
    }
}

impl MemberPermissions {
    /// Full permission set granted to the project owner
    pub fn owner() -> Self {
        Self {
            can_edit: true,
            can_delete: true,
            can_invite: true,
            can_manage_tasks: true,
            can_view_reports: true,
        }
    }

    /// Defaults for a freshly added member of the given role
    pub fn for_role(role: MemberRole) -> Self {
        match role {
            MemberRole::Owner => Self::owner(),
            MemberRole::Manager => Self {
                can_invite: true,
                ..Self::default()
            },
            MemberRole::Viewer => Self {
                can_edit: false,
                can_manage_tasks: false,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

/// Membership row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub permissions: Json<MemberPermissions>,
    pub joined_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership row joined with the member's public profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    pub id: Uuid,
    pub role: MemberRole,
    pub permissions: MemberPermissions,
    pub joined_at: DateTime<Utc>,
    pub is_active: bool,
    pub user: PublicUser,
}

impl ProjectMember {
    /// Adds a user to a project with role-appropriate default permissions
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_members (project_id, user_id, role, permissions) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(role)
            .bind(Json(MemberPermissions::for_role(role)))
            .fetch_one(pool)
            .await
    }

    /// Finds the membership row for a (project, user) pair, active or not
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members \
             WHERE project_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Active members of a project with their profiles, oldest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        let rows: Vec<(
            Uuid,
            MemberRole,
            Json<MemberPermissions>,
            DateTime<Utc>,
            bool,
            Uuid,
            String,
            String,
            String,
            Option<String>,
            DateTime<Utc>,
        )> = sqlx::query_as(
            "SELECT m.id, m.role, m.permissions, m.joined_at, m.is_active, \
                    u.id, u.first_name, u.last_name, u.email, u.avatar, u.created_at \
             FROM project_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.project_id = $1 AND m.is_active \
             ORDER BY m.joined_at ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    role,
                    permissions,
                    joined_at,
                    is_active,
                    user_id,
                    first_name,
                    last_name,
                    email,
                    avatar,
                    user_created_at,
                )| MemberWithUser {
                    id,
                    role,
                    permissions: permissions.0,
                    joined_at,
                    is_active,
                    user: PublicUser {
                        id: user_id,
                        first_name,
                        last_name,
                        email,
                        avatar,
                        created_at: user_created_at,
                    },
                },
            )
            .collect())
    }

    /// Reactivates a previously removed membership with a new role
    pub async fn reactivate(
        pool: &PgPool,
        id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE project_members \
             SET is_active = TRUE, role = $2, permissions = $3, joined_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(id)
            .bind(role)
            .bind(Json(MemberPermissions::for_role(role)))
            .fetch_optional(pool)
            .await
    }

    /// Soft-removes a member; the row stays for history and reactivation
    pub async fn deactivate(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE project_members SET is_active = FALSE, updated_at = NOW() \
             WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for label in ["Owner", "Manager", "Developer", "Tester", "Viewer"] {
            let role = MemberRole::parse(label).unwrap();
            assert_eq!(role.as_str(), label);
        }
        assert!(MemberRole::parse("Admin").is_none());
    }

    #[test]
    fn test_owner_permissions_are_full() {
        let p = MemberPermissions::owner();
        assert!(p.can_edit && p.can_delete && p.can_invite && p.can_manage_tasks && p.can_view_reports);
    }

    #[test]
    fn test_default_member_cannot_delete_or_invite() {
        let p = MemberPermissions::default();
        assert!(p.can_edit);
        assert!(!p.can_delete);
        assert!(!p.can_invite);
    }

    #[test]
    fn test_viewer_is_read_only() {
        let p = MemberPermissions::for_role(MemberRole::Viewer);
        assert!(!p.can_edit);
        assert!(!p.can_manage_tasks);
        assert!(p.can_view_reports);
    }

    #[test]
    fn test_permissions_wire_shape() {
        let json = serde_json::to_value(MemberPermissions::default()).unwrap();
        assert_eq!(json["canEdit"], true);
        assert_eq!(json["canDelete"], false);
        assert_eq!(json["canManageTasks"], true);
    }
}
