/// Task model and database operations
///
/// Tasks are always scoped to their creator: every list, read, update, and
/// delete filters on `creator_id`, so one user can never see another's rows.
/// List queries support status/priority equality filters, a case-insensitive
/// substring search over title and description, whitelisted single-column
/// sort (with `id` as tie-break), and offset pagination.
///
/// Completion is a field coupling, not a state machine: an update that lands
/// progress at 100 forces `Completed` and stamps `completed_date`; an update
/// that sets `Completed` without a completion date stamps one.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('Pending', 'In Progress', 'Completed', 'Cancelled');
/// CREATE TYPE priority_level AS ENUM ('Low', 'Medium', 'High', 'Urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'Pending',
///     priority priority_level NOT NULL DEFAULT 'Medium',
///     due_date TIMESTAMPTZ,
///     start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_date TIMESTAMPTZ,
///     estimated_hours DOUBLE PRECISION,
///     actual_hours DOUBLE PRECISION,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     progress INTEGER NOT NULL DEFAULT 0,
///     is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
///     recurring_pattern VARCHAR(10),
///     recurring_end_date TIMESTAMPTZ,
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::query::{order_by_clause, resolve_sort_column, SortOrder};

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, start_date, \
     completed_date, estimated_hours, actual_hours, tags, progress, is_recurring, \
     recurring_pattern, recurring_end_date, creator_id, assignee_id, project_id, created_at, \
     updated_at";

/// Wire sort keys accepted by the task list, mapped to their columns
const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("dueDate", "due_date"),
    ("startDate", "start_date"),
    ("title", "title"),
    ("status", "status"),
    ("priority", "priority"),
    ("progress", "progress"),
];

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    Pending,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(TaskStatus::Pending),
            "In Progress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            "Cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority_level")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(TaskPriority::Low),
            "Medium" => Some(TaskPriority::Medium),
            "High" => Some(TaskPriority::High),
            "Urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
        }
    }
}

/// Recurring schedule labels accepted on the wire
pub const RECURRING_PATTERNS: &[&str] = &["daily", "weekly", "monthly", "yearly"];

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Vec<String>,
    /// Percent complete, 0..=100
    pub progress: i32,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub tags: Vec<String>,
    pub progress: i32,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

/// Input for updating a task; None fields are skipped, Some(None) clears
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_date: Option<Option<DateTime<Utc>>>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
    pub tags: Option<Vec<String>>,
    pub progress: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurring_pattern: Option<Option<String>>,
    pub recurring_end_date: Option<Option<DateTime<Utc>>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub project_id: Option<Option<Uuid>>,
}

/// Parsed filter/sort/pagination options for the task list
#[derive(Debug, Clone)]
pub struct TaskListFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub sort_column: &'static str,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TaskListFilter {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            sort_column: "created_at",
            sort_order: SortOrder::Desc,
            limit: 10,
            offset: 0,
        }
    }
}

/// Aggregate counts for GET /tasks/stats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub status_stats: Vec<StatusCount>,
    pub priority_stats: Vec<PriorityCount>,
    pub overdue_tasks: i64,
    pub due_today_tasks: i64,
    pub total_tasks: i64,
    pub completed_this_month: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

/// Resolves the completion field coupling for an update
///
/// Takes the effective (post-merge) status, progress, and completion date,
/// and returns the final status and completion date to persist:
/// progress 100 forces `Completed`; entering `Completed` stamps the date.
/// Reopening a task does not clear an existing completion date.
pub fn resolve_completion(
    status: TaskStatus,
    progress: i32,
    completed_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (TaskStatus, Option<DateTime<Utc>>) {
    if progress == 100 && status != TaskStatus::Completed {
        return (TaskStatus::Completed, completed_date.or(Some(now)));
    }
    if status == TaskStatus::Completed && completed_date.is_none() {
        return (TaskStatus::Completed, Some(now));
    }
    (status, completed_date)
}

/// Resolves the wire sort key for tasks; None for unknown keys
pub fn sort_column(requested: Option<&str>) -> Option<&'static str> {
    resolve_sort_column(requested, SORTABLE, "created_at")
}

/// Builds the WHERE clause shared by the list and count queries
///
/// `$1` is always the creator; optional filters take the following
/// positions in declaration order.
fn filter_clause(filter: &TaskListFilter) -> String {
    let mut clause = String::from("WHERE creator_id = $1");
    let mut bind_count = 1;

    if filter.status.is_some() {
        bind_count += 1;
        clause.push_str(&format!(" AND status = ${}", bind_count));
    }
    if filter.priority.is_some() {
        bind_count += 1;
        clause.push_str(&format!(" AND priority = ${}", bind_count));
    }
    if filter.search.is_some() {
        bind_count += 1;
        clause.push_str(&format!(
            " AND (title ILIKE ${0} OR description ILIKE ${0})",
            bind_count
        ));
    }

    clause
}

impl Task {
    /// Creates a task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, priority, due_date, start_date, \
             completed_date, estimated_hours, tags, progress, is_recurring, recurring_pattern, \
             recurring_end_date, creator_id, assignee_id, project_id) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()), $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.start_date)
            .bind(data.completed_date)
            .bind(data.estimated_hours)
            .bind(data.tags)
            .bind(data.progress)
            .bind(data.is_recurring)
            .bind(data.recurring_pattern)
            .bind(data.recurring_end_date)
            .bind(data.creator_id)
            .bind(data.assignee_id)
            .bind(data.project_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by id, scoped to its creator
    pub async fn find_by_id_and_creator(
        pool: &PgPool,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND creator_id = $2");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(creator_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the creator's tasks for one page of the given filter
    pub async fn list_by_creator(
        pool: &PgPool,
        creator_id: Uuid,
        filter: &TaskListFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let where_clause = filter_clause(filter);
        let order_clause = order_by_clause(filter.sort_column, filter.sort_order);
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks {where_clause} {order_clause} LIMIT {} OFFSET {}",
            filter.limit, filter.offset
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(creator_id);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", search));
        }

        q.fetch_all(pool).await
    }

    /// Counts rows matching the filter, ignoring pagination
    pub async fn count_by_creator(
        pool: &PgPool,
        creator_id: Uuid,
        filter: &TaskListFilter,
    ) -> Result<i64, sqlx::Error> {
        let where_clause = filter_clause(filter);
        let query = format!("SELECT COUNT(*) FROM tasks {where_clause}");

        let mut q = sqlx::query_as::<_, (i64,)>(&query).bind(creator_id);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", search));
        }

        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    /// Updates a task, applying the completion coupling
    ///
    /// `current` must be the row as previously fetched for the ownership
    /// check; it seeds the effective values the coupling is resolved
    /// against. Only fields present in `data` are written.
    pub async fn update(
        pool: &PgPool,
        current: &Task,
        mut data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let effective_status = data.status.unwrap_or(current.status);
        let effective_progress = data.progress.unwrap_or(current.progress);
        let effective_completed = match data.completed_date {
            Some(explicit) => explicit,
            None => current.completed_date,
        };

        let (final_status, final_completed) = resolve_completion(
            effective_status,
            effective_progress,
            effective_completed,
            Utc::now(),
        );
        if final_status != current.status || data.status.is_some() {
            data.status = Some(final_status);
        }
        if final_completed != current.completed_date || data.completed_date.is_some() {
            data.completed_date = Some(final_completed);
        }

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        macro_rules! push_set {
            ($field:expr, $column:literal) => {
                if $field.is_some() {
                    bind_count += 1;
                    query.push_str(&format!(concat!(", ", $column, " = ${}"), bind_count));
                }
            };
        }

        push_set!(data.title, "title");
        push_set!(data.description, "description");
        push_set!(data.status, "status");
        push_set!(data.priority, "priority");
        push_set!(data.due_date, "due_date");
        push_set!(data.start_date, "start_date");
        push_set!(data.completed_date, "completed_date");
        push_set!(data.estimated_hours, "estimated_hours");
        push_set!(data.actual_hours, "actual_hours");
        push_set!(data.tags, "tags");
        push_set!(data.progress, "progress");
        push_set!(data.is_recurring, "is_recurring");
        push_set!(data.recurring_pattern, "recurring_pattern");
        push_set!(data.recurring_end_date, "recurring_end_date");
        push_set!(data.assignee_id, "assignee_id");
        push_set!(data.project_id, "project_id");

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(current.id);
        if let Some(title) = data.title {
            q = q.bind(title);
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
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(completed_date) = data.completed_date {
            q = q.bind(completed_date);
        }
        if let Some(estimated_hours) = data.estimated_hours {
            q = q.bind(estimated_hours);
        }
        if let Some(actual_hours) = data.actual_hours {
            q = q.bind(actual_hours);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(progress) = data.progress {
            q = q.bind(progress);
        }
        if let Some(is_recurring) = data.is_recurring {
            q = q.bind(is_recurring);
        }
        if let Some(recurring_pattern) = data.recurring_pattern {
            q = q.bind(recurring_pattern);
        }
        if let Some(recurring_end_date) = data.recurring_end_date {
            q = q.bind(recurring_end_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task, scoped to its creator
    pub async fn delete(pool: &PgPool, id: Uuid, creator_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Tasks due within a calendar date range, earliest first
    pub async fn list_due_between(
        pool: &PgPool,
        creator_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE creator_id = $1 AND due_date::date BETWEEN $2 AND $3 \
             ORDER BY due_date ASC, id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(creator_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Aggregate counts for the creator's tasks
    pub async fn stats(pool: &PgPool, creator_id: Uuid) -> Result<TaskStats, sqlx::Error> {
        let status_rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM tasks WHERE creator_id = $1 GROUP BY status",
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await?;

        let priority_rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
            "SELECT priority, COUNT(*) FROM tasks WHERE creator_id = $1 GROUP BY priority",
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await?;

        let (overdue,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks \
             WHERE creator_id = $1 AND due_date < NOW() \
               AND status NOT IN ('Completed', 'Cancelled')",
        )
        .bind(creator_id)
        .fetch_one(pool)
        .await?;

        let (due_today,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks \
             WHERE creator_id = $1 \
               AND due_date >= date_trunc('day', NOW()) \
               AND due_date < date_trunc('day', NOW()) + interval '1 day' \
               AND status NOT IN ('Completed', 'Cancelled')",
        )
        .bind(creator_id)
        .fetch_one(pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE creator_id = $1")
                .bind(creator_id)
                .fetch_one(pool)
                .await?;

        let (completed_this_month,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks \
             WHERE creator_id = $1 AND status = 'Completed' \
               AND completed_date >= date_trunc('month', NOW())",
        )
        .bind(creator_id)
        .fetch_one(pool)
        .await?;

        Ok(TaskStats {
            status_stats: status_rows
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            priority_stats: priority_rows
                .into_iter()
                .map(|(priority, count)| PriorityCount { priority, count })
                .collect(),
            overdue_tasks: overdue,
            due_today_tasks: due_today,
            total_tasks: total,
            completed_this_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for label in ["Pending", "In Progress", "Completed", "Cancelled"] {
            let status = TaskStatus::parse(label).unwrap();
            assert_eq!(status.as_str(), label);
        }
        assert!(TaskStatus::parse("Done").is_none());
        assert!(TaskStatus::parse("pending").is_none());
    }

    #[test]
    fn test_priority_parse_roundtrip() {
        for label in ["Low", "Medium", "High", "Urgent"] {
            let priority = TaskPriority::parse(label).unwrap();
            assert_eq!(priority.as_str(), label);
        }
        assert!(TaskPriority::parse("Critical").is_none());
    }

    #[test]
    fn test_status_wire_label_has_space() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: TaskStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column(None), Some("created_at"));
        assert_eq!(sort_column(Some("dueDate")), Some("due_date"));
        assert_eq!(sort_column(Some("priority")), Some("priority"));
        assert_eq!(sort_column(Some("creator_id")), None);
        assert_eq!(sort_column(Some("1; DROP TABLE tasks")), None);
    }

    #[test]
    fn test_filter_clause_bind_positions() {
        let filter = TaskListFilter {
            status: Some(TaskStatus::Completed),
            search: Some("call".to_string()),
            ..Default::default()
        };
        // Priority absent: search takes $3, not $4.
        assert_eq!(
            filter_clause(&filter),
            "WHERE creator_id = $1 AND status = $2 AND (title ILIKE $3 OR description ILIKE $3)"
        );

        let unfiltered = TaskListFilter::default();
        assert_eq!(filter_clause(&unfiltered), "WHERE creator_id = $1");
    }

    #[test]
    fn test_progress_100_forces_completed() {
        let now = Utc::now();
        let (status, completed) =
            resolve_completion(TaskStatus::InProgress, 100, None, now);
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(completed, Some(now));
    }

    #[test]
    fn test_completed_status_stamps_date() {
        let now = Utc::now();
        let (status, completed) = resolve_completion(TaskStatus::Completed, 40, None, now);
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(completed, Some(now));
    }

    #[test]
    fn test_existing_completion_date_not_restamped() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::days(3);
        let (status, completed) =
            resolve_completion(TaskStatus::Completed, 100, Some(earlier), now);
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(completed, Some(earlier));
    }

    #[test]
    fn test_partial_progress_leaves_status_alone() {
        let now = Utc::now();
        let (status, completed) = resolve_completion(TaskStatus::InProgress, 60, None, now);
        assert_eq!(status, TaskStatus::InProgress);
        assert_eq!(completed, None);
    }

    #[test]
    fn test_reopening_keeps_completion_date() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::days(1);
        let (status, completed) =
            resolve_completion(TaskStatus::Pending, 50, Some(earlier), now);
        assert_eq!(status, TaskStatus::Pending);
        assert_eq!(completed, Some(earlier));
    }
}
