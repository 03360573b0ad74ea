/// Project model and database operations
///
/// A user's visible projects are the ownership union: projects they own,
/// manage, or are an active member of. The union is expressed as a single
/// predicate so rows are deduplicated by construction and counting,
/// pagination, and statistics all agree:
///
/// ```sql
/// owner_id = $1 OR manager_id = $1
///     OR id IN (SELECT project_id FROM project_members
///               WHERE user_id = $1 AND is_active)
/// ```
///
/// A project entering `Completed` gets `end_date` stamped if it was unset;
/// the rest of the row is a plain CRUD record.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('Planning', 'In Progress', 'On Hold', 'Completed', 'Cancelled');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'Planning',
///     priority priority_level NOT NULL DEFAULT 'Medium',
///     start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     end_date TIMESTAMPTZ,
///     due_date TIMESTAMPTZ,
///     progress INTEGER NOT NULL DEFAULT 0,
///     category VARCHAR(100),
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::task::TaskPriority;
use crate::query::{order_by_clause, resolve_sort_column, SortOrder};
use crate::reports::completion_rate;

const PROJECT_COLUMNS: &str = "id, name, description, status, priority, start_date, end_date, \
     due_date, progress, category, tags, owner_id, manager_id, created_at, updated_at";

/// Ownership-union predicate; $1 is the requesting user
const OWNERSHIP_UNION: &str = "(owner_id = $1 OR manager_id = $1 \
     OR id IN (SELECT project_id FROM project_members WHERE user_id = $1 AND is_active))";

/// Wire sort keys accepted by the project list, mapped to their columns
const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("dueDate", "due_date"),
    ("startDate", "start_date"),
    ("name", "name"),
    ("status", "status"),
    ("priority", "priority"),
    ("progress", "progress"),
];

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status")]
pub enum ProjectStatus {
    Planning,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "On Hold")]
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Planning" => Some(ProjectStatus::Planning),
            "In Progress" => Some(ProjectStatus::InProgress),
            "On Hold" => Some(ProjectStatus::OnHold),
            "Completed" => Some(ProjectStatus::Completed),
            "Cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }
}

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: TaskPriority,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Percent complete, 0..=100
    pub progress: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub owner_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task roll-up attached to each project listing row
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTaskStats {
    pub total: i64,
    pub completed: i64,
    /// round(100 * completed / total), 0 when there are no tasks
    pub progress: i64,
}

/// Listing row: the project plus its task roll-up
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithStats {
    #[serde(flatten)]
    pub project: Project,
    pub task_stats: ProjectTaskStats,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: TaskPriority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub owner_id: Uuid,
    pub manager_id: Option<Uuid>,
}

/// Input for updating a project; None fields are skipped, Some(None) clears
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<TaskPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub progress: Option<i32>,
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub manager_id: Option<Option<Uuid>>,
}

/// Parsed filter/sort/pagination options for the project list
#[derive(Debug, Clone)]
pub struct ProjectListFilter {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ProjectListFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            sort_column: "updated_at",
            sort_order: SortOrder::Desc,
            limit: 10,
            offset: 0,
        }
    }
}

/// Aggregate counts for GET /projects/stats, over the ownership union
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_members: i64,
    pub completion_rate: i64,
    pub task_completion_rate: i64,
}

/// Stamps end_date when a project enters Completed without one
///
/// Leaving Completed does not clear an already-set end date.
pub fn resolve_end_date(
    status: ProjectStatus,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if status == ProjectStatus::Completed && end_date.is_none() {
        Some(now)
    } else {
        end_date
    }
}

/// Resolves the wire sort key for projects; None for unknown keys
pub fn sort_column(requested: Option<&str>) -> Option<&'static str> {
    resolve_sort_column(requested, SORTABLE, "updated_at")
}

/// Builds the WHERE clause shared by the list and count queries
fn filter_clause(filter: &ProjectListFilter) -> String {
    let mut clause = format!("WHERE {OWNERSHIP_UNION}");
    let mut bind_count = 1;

    if filter.status.is_some() {
        bind_count += 1;
        clause.push_str(&format!(" AND status = ${}", bind_count));
    }
    if filter.search.is_some() {
        bind_count += 1;
        clause.push_str(&format!(
            " AND (name ILIKE ${0} OR description ILIKE ${0})",
            bind_count
        ));
    }

    clause
}

impl Project {
    /// Creates a project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description, status, priority, start_date, end_date, \
             due_date, progress, category, tags, owner_id, manager_id) \
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.due_date)
            .bind(data.progress)
            .bind(data.category)
            .bind(data.tags)
            .bind(data.owner_id)
            .bind(data.manager_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a project by id (no access scoping; callers check access)
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user may read this project (owner, manager, or active member)
    pub async fn user_has_access(
        &self,
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        if self.owner_id == user_id || self.manager_id == Some(user_id) {
            return Ok(true);
        }
        let (is_member,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM project_members \
             WHERE project_id = $1 AND user_id = $2 AND is_active)",
        )
        .bind(self.id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(is_member)
    }

    /// Whether the user may edit this project (owner or manager)
    pub fn user_can_edit(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.manager_id == Some(user_id)
    }

    /// Lists one page of the user's ownership union
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: &ProjectListFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let where_clause = filter_clause(filter);
        let order_clause = order_by_clause(filter.sort_column, filter.sort_order);
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects {where_clause} {order_clause} \
             LIMIT {} OFFSET {}",
            filter.limit, filter.offset
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(user_id);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", search));
        }

        q.fetch_all(pool).await
    }

    /// Counts the user's ownership union under the filter
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: &ProjectListFilter,
    ) -> Result<i64, sqlx::Error> {
        let where_clause = filter_clause(filter);
        let query = format!("SELECT COUNT(*) FROM projects {where_clause}");

        let mut q = sqlx::query_as::<_, (i64,)>(&query).bind(user_id);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", search));
        }

        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    /// Attaches task roll-ups to a page of projects with one grouped query
    pub async fn attach_task_stats(
        pool: &PgPool,
        projects: Vec<Project>,
    ) -> Result<Vec<ProjectWithStats>, sqlx::Error> {
        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

        let rows: Vec<(Uuid, i64, i64)> = sqlx::query_as(
            "SELECT project_id, COUNT(*), \
                    COUNT(*) FILTER (WHERE status = 'Completed') \
             FROM tasks WHERE project_id = ANY($1) GROUP BY project_id",
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let by_project: HashMap<Uuid, (i64, i64)> = rows
            .into_iter()
            .map(|(id, total, completed)| (id, (total, completed)))
            .collect();

        Ok(projects
            .into_iter()
            .map(|project| {
                let (total, completed) =
                    by_project.get(&project.id).copied().unwrap_or((0, 0));
                ProjectWithStats {
                    project,
                    task_stats: ProjectTaskStats {
                        total,
                        completed,
                        progress: completion_rate(completed, total),
                    },
                }
            })
            .collect())
    }

    /// Updates a project, stamping end_date on completion
    pub async fn update(
        pool: &PgPool,
        current: &Project,
        mut data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let effective_status = data.status.unwrap_or(current.status);
        let effective_end = match data.end_date {
            Some(explicit) => explicit,
            None => current.end_date,
        };

        let final_end = resolve_end_date(effective_status, effective_end, Utc::now());
        if final_end != current.end_date || data.end_date.is_some() {
            data.end_date = Some(final_end);
        }

        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        macro_rules! push_set {
            ($field:expr, $column:literal) => {
                if $field.is_some() {
                    bind_count += 1;
                    query.push_str(&format!(concat!(", ", $column, " = ${}"), bind_count));
                }
            };
        }

        push_set!(data.name, "name");
        push_set!(data.description, "description");
        push_set!(data.status, "status");
        push_set!(data.priority, "priority");
        push_set!(data.start_date, "start_date");
        push_set!(data.end_date, "end_date");
        push_set!(data.due_date, "due_date");
        push_set!(data.progress, "progress");
        push_set!(data.category, "category");
        push_set!(data.tags, "tags");
        push_set!(data.manager_id, "manager_id");

        query.push_str(&format!(" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(current.id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(progress) = data.progress {
            q = q.bind(progress);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(manager_id) = data.manager_id {
            q = q.bind(manager_id);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a project; related members and tasks follow the FK rules
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aggregate statistics over the user's ownership union
    pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<ProjectStats, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE status = 'In Progress'), \
                    COUNT(*) FILTER (WHERE status = 'Completed') \
             FROM projects WHERE {OWNERSHIP_UNION}"
        );
        let (total, active, completed): (i64, i64, i64) =
            sqlx::query_as(&query).bind(user_id).fetch_one(pool).await?;

        let task_query = format!(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'Completed') \
             FROM tasks WHERE project_id IN \
               (SELECT id FROM projects WHERE {OWNERSHIP_UNION})"
        );
        let (total_tasks, completed_tasks): (i64, i64) = sqlx::query_as(&task_query)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let member_query = format!(
            "SELECT COUNT(*) FROM project_members \
             WHERE is_active AND project_id IN \
               (SELECT id FROM projects WHERE {OWNERSHIP_UNION})"
        );
        let (total_members,): (i64,) = sqlx::query_as(&member_query)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(ProjectStats {
            total_projects: total,
            active_projects: active,
            completed_projects: completed,
            total_tasks,
            completed_tasks,
            total_members,
            completion_rate: completion_rate(completed, total),
            task_completion_rate: completion_rate(completed_tasks, total_tasks),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for label in ["Planning", "In Progress", "On Hold", "Completed", "Cancelled"] {
            let status = ProjectStatus::parse(label).unwrap();
            assert_eq!(status.as_str(), label);
        }
        assert!(ProjectStatus::parse("Paused").is_none());
    }

    #[test]
    fn test_multiword_wire_labels() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::OnHold).unwrap(),
            "\"On Hold\""
        );
        assert_eq!(
            serde_json::to_string(&ProjectStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
    }

    #[test]
    fn test_completion_stamps_end_date() {
        let now = Utc::now();
        assert_eq!(resolve_end_date(ProjectStatus::Completed, None, now), Some(now));
    }

    #[test]
    fn test_existing_end_date_kept() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::days(10);
        assert_eq!(
            resolve_end_date(ProjectStatus::Completed, Some(earlier), now),
            Some(earlier)
        );
    }

    #[test]
    fn test_non_completed_leaves_end_date_unset() {
        let now = Utc::now();
        assert_eq!(resolve_end_date(ProjectStatus::InProgress, None, now), None);
    }

    #[test]
    fn test_filter_clause_contains_union_once() {
        let filter = ProjectListFilter {
            status: Some(ProjectStatus::Planning),
            search: Some("api".to_string()),
            ..Default::default()
        };
        let clause = filter_clause(&filter);
        // One union predicate, so counting and pagination see each project once.
        assert_eq!(clause.matches("owner_id = $1").count(), 1);
        assert!(clause.contains("manager_id = $1"));
        assert!(clause.contains("user_id = $1 AND is_active"));
        assert!(clause.contains("AND status = $2"));
        assert!(clause.contains("name ILIKE $3 OR description ILIKE $3"));
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column(None), Some("updated_at"));
        assert_eq!(sort_column(Some("name")), Some("name"));
        assert_eq!(sort_column(Some("owner_id")), None);
    }

    #[test]
    fn test_can_edit_requires_owner_or_manager() {
        let owner = Uuid::new_v4();
        let manager = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let project = Project {
            id: Uuid::new_v4(),
            name: "Rollout".to_string(),
            description: None,
            status: ProjectStatus::Planning,
            priority: TaskPriority::Medium,
            start_date: Utc::now(),
            end_date: None,
            due_date: None,
            progress: 0,
            category: None,
            tags: vec![],
            owner_id: owner,
            manager_id: Some(manager),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(project.user_can_edit(owner));
        assert!(project.user_can_edit(manager));
        assert!(!project.user_can_edit(stranger));
    }
}
