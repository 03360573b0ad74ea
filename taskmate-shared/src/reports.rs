/// Time-windowed analytics
///
/// Every report takes a symbolic rolling window (week/month/quarter/year),
/// turns it into a start timestamp by subtracting the matching calendar
/// interval from now, and recomputes aggregates from the user's rows in that
/// window on every request. There is no caching and no incremental
/// maintenance; the window rarely holds more than a few hundred rows.
///
/// Scoping matches the rest of the API: task aggregates cover rows the user
/// created, project aggregates cover the ownership union (owned, managed,
/// or actively joined), deduplicated by construction through a single union
/// predicate.
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::ProjectStatus;
use crate::models::task::{TaskPriority, TaskStatus};

/// How many recent rows of each kind feed the activity merge
const RECENT_FETCH_LIMIT: i64 = 5;

/// Upper bound on the merged recent-activity feed
const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Ownership-union predicate over projects; $1 is the requesting user
const OWNERSHIP_UNION: &str = "(owner_id = $1 OR manager_id = $1 \
     OR id IN (SELECT project_id FROM project_members WHERE user_id = $1 AND is_active))";

/// Symbolic rolling window for report queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimeRange {
    /// Parses the wire label, falling back to the month window
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("week") => TimeRange::Week,
            Some("month") => TimeRange::Month,
            Some("quarter") => TimeRange::Quarter,
            Some("year") => TimeRange::Year,
            _ => TimeRange::Month,
        }
    }

    /// Start of the window ending at `now`
    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Week => now - Duration::days(7),
            TimeRange::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            TimeRange::Quarter => now.checked_sub_months(Months::new(3)).unwrap_or(now),
            TimeRange::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }
}

/// round(100 * completed / total); 0 when the set is empty
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    }
}

/// Task priority distribution, reported over the three headline levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    #[serde(rename = "High")]
    pub high: i64,
    #[serde(rename = "Medium")]
    pub medium: i64,
    #[serde(rename = "Low")]
    pub low: i64,
}

/// Builds the priority distribution from grouped counts
pub fn priority_distribution(rows: &[(TaskPriority, i64)]) -> PriorityDistribution {
    let count_of = |p: TaskPriority| {
        rows.iter()
            .filter(|(priority, _)| *priority == p)
            .map(|(_, count)| count)
            .sum()
    };
    PriorityDistribution {
        high: count_of(TaskPriority::High),
        medium: count_of(TaskPriority::Medium),
        low: count_of(TaskPriority::Low),
    }
}

/// Task status distribution over the non-terminal-failure states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    #[serde(rename = "Pending")]
    pub pending: i64,
    #[serde(rename = "In Progress")]
    pub in_progress: i64,
    #[serde(rename = "Completed")]
    pub completed: i64,
}

fn status_count(rows: &[(TaskStatus, i64)], status: TaskStatus) -> i64 {
    rows.iter()
        .filter(|(s, _)| *s == status)
        .map(|(_, count)| count)
        .sum()
}

/// Builds the task status distribution from grouped counts
pub fn status_distribution(rows: &[(TaskStatus, i64)]) -> StatusDistribution {
    StatusDistribution {
        pending: status_count(rows, TaskStatus::Pending),
        in_progress: status_count(rows, TaskStatus::InProgress),
        completed: status_count(rows, TaskStatus::Completed),
    }
}

/// Project status distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatusDistribution {
    #[serde(rename = "Planning")]
    pub planning: i64,
    #[serde(rename = "In Progress")]
    pub in_progress: i64,
    #[serde(rename = "On Hold")]
    pub on_hold: i64,
    #[serde(rename = "Completed")]
    pub completed: i64,
}

fn project_status_count(rows: &[(ProjectStatus, i64)], status: ProjectStatus) -> i64 {
    rows.iter()
        .filter(|(s, _)| *s == status)
        .map(|(_, count)| count)
        .sum()
}

/// Builds the project status distribution from grouped counts
pub fn project_status_distribution(
    rows: &[(ProjectStatus, i64)],
) -> ProjectStatusDistribution {
    ProjectStatusDistribution {
        planning: project_status_count(rows, ProjectStatus::Planning),
        in_progress: project_status_count(rows, ProjectStatus::InProgress),
        on_hold: project_status_count(rows, ProjectStatus::OnHold),
        completed: project_status_count(rows, ProjectStatus::Completed),
    }
}

/// One row of the merged recent-activity feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: Uuid,
    pub title: String,
    /// "task" or "project"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Merges task and project activity, newest first, capped at ten entries
pub fn merge_recent_activity(
    tasks: Vec<ActivityItem>,
    projects: Vec<ActivityItem>,
) -> Vec<ActivityItem> {
    let mut merged: Vec<ActivityItem> = tasks.into_iter().chain(projects).collect();
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged.truncate(RECENT_ACTIVITY_LIMIT);
    merged
}

/// Headline numbers for the dashboard report
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub total_projects: i64,
    pub completed_projects: i64,
    pub active_projects: i64,
    pub task_completion_rate: i64,
    pub project_completion_rate: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDistributions {
    pub priority: PriorityDistribution,
    pub status: StatusDistribution,
    pub project_status: ProjectStatusDistribution,
}

/// GET /reports/dashboard payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub summary: DashboardSummary,
    pub distributions: DashboardDistributions,
    pub recent_activity: Vec<ActivityItem>,
}

/// GET /reports/tasks payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub summary: TaskReportSummary,
    pub distributions: TaskReportDistributions,
    pub tasks: Vec<TaskReportItem>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReportSummary {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completion_rate: i64,
    /// Mean days from creation to completion, rounded; 0 with no samples
    pub average_completion_time: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReportDistributions {
    pub priority: PriorityDistribution,
    pub status: StatusDistribution,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskReportItem {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
}

/// GET /reports/projects payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub summary: ProjectReportSummary,
    pub distributions: ProjectReportDistributions,
    pub projects: Vec<ProjectReportItem>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReportSummary {
    pub total_projects: i64,
    pub completed_projects: i64,
    pub active_projects: i64,
    pub planning_projects: i64,
    pub on_hold_projects: i64,
    pub completion_rate: i64,
    pub average_team_size: i64,
    pub average_tasks_per_project: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReportDistributions {
    pub status: ProjectStatusDistribution,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReportItem {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
    pub task_count: i64,
}

/// Mean whole days from creation to completion, rounded; 0 with no samples
pub fn average_completion_days(samples: &[(DateTime<Utc>, DateTime<Utc>)]) -> i64 {
    if samples.is_empty() {
        return 0;
    }
    let total_ms: i64 = samples
        .iter()
        .map(|(created, completed)| (*completed - *created).num_milliseconds())
        .sum();
    let mean_days = total_ms as f64 / samples.len() as f64 / (1000.0 * 60.0 * 60.0 * 24.0);
    mean_days.round() as i64
}

/// Rounded mean of `total` spread over `count` groups; 0 with no groups
pub fn rounded_average(total: i64, count: i64) -> i64 {
    if count > 0 {
        (total as f64 / count as f64).round() as i64
    } else {
        0
    }
}

/// Builds the dashboard report for a user over the window
pub async fn dashboard(
    pool: &PgPool,
    user_id: Uuid,
    range: TimeRange,
) -> Result<DashboardReport, sqlx::Error> {
    let start = range.start_from(Utc::now());

    let task_status_rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM tasks \
         WHERE creator_id = $1 AND created_at >= $2 GROUP BY status",
    )
    .bind(user_id)
    .bind(start)
    .fetch_all(pool)
    .await?;

    let task_priority_rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
        "SELECT priority, COUNT(*) FROM tasks \
         WHERE creator_id = $1 AND created_at >= $2 GROUP BY priority",
    )
    .bind(user_id)
    .bind(start)
    .fetch_all(pool)
    .await?;

    let project_query = format!(
        "SELECT status, COUNT(*) FROM projects \
         WHERE {OWNERSHIP_UNION} AND created_at >= $2 GROUP BY status"
    );
    let project_status_rows: Vec<(ProjectStatus, i64)> = sqlx::query_as(&project_query)
        .bind(user_id)
        .bind(start)
        .fetch_all(pool)
        .await?;

    let total_tasks: i64 = task_status_rows.iter().map(|(_, c)| c).sum();
    let completed_tasks = status_count(&task_status_rows, TaskStatus::Completed);
    let pending_tasks = status_count(&task_status_rows, TaskStatus::Pending);
    let in_progress_tasks = status_count(&task_status_rows, TaskStatus::InProgress);

    let total_projects: i64 = project_status_rows.iter().map(|(_, c)| c).sum();
    let completed_projects =
        project_status_count(&project_status_rows, ProjectStatus::Completed);
    let active_projects =
        project_status_count(&project_status_rows, ProjectStatus::InProgress);

    let recent_tasks: Vec<(Uuid, String, TaskStatus, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, title, status, created_at FROM tasks \
         WHERE creator_id = $1 AND created_at >= $2 \
         ORDER BY created_at DESC LIMIT $3",
    )
    .bind(user_id)
    .bind(start)
    .bind(RECENT_FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_projects_query = format!(
        "SELECT id, name, status, created_at FROM projects \
         WHERE {OWNERSHIP_UNION} AND created_at >= $2 \
         ORDER BY created_at DESC LIMIT $3"
    );
    let recent_projects: Vec<(Uuid, String, ProjectStatus, DateTime<Utc>)> =
        sqlx::query_as(&recent_projects_query)
            .bind(user_id)
            .bind(start)
            .bind(RECENT_FETCH_LIMIT)
            .fetch_all(pool)
            .await?;

    let recent_activity = merge_recent_activity(
        recent_tasks
            .into_iter()
            .map(|(id, title, status, created_at)| ActivityItem {
                id,
                title,
                kind: "task",
                status: status.as_str().to_string(),
                created_at,
            })
            .collect(),
        recent_projects
            .into_iter()
            .map(|(id, name, status, created_at)| ActivityItem {
                id,
                title: name,
                kind: "project",
                status: status.as_str().to_string(),
                created_at,
            })
            .collect(),
    );

    Ok(DashboardReport {
        summary: DashboardSummary {
            total_tasks,
            completed_tasks,
            pending_tasks,
            in_progress_tasks,
            total_projects,
            completed_projects,
            active_projects,
            task_completion_rate: completion_rate(completed_tasks, total_tasks),
            project_completion_rate: completion_rate(completed_projects, total_projects),
        },
        distributions: DashboardDistributions {
            priority: priority_distribution(&task_priority_rows),
            status: status_distribution(&task_status_rows),
            project_status: project_status_distribution(&project_status_rows),
        },
        recent_activity,
    })
}

/// Builds the task report for a user over the window
///
/// When `project_id` is given, only tasks attached to that project count.
pub async fn task_report(
    pool: &PgPool,
    user_id: Uuid,
    range: TimeRange,
    project_id: Option<Uuid>,
) -> Result<TaskReport, sqlx::Error> {
    let start = range.start_from(Utc::now());

    let mut query = String::from(
        "SELECT id, title, status, priority, created_at, completed_date FROM tasks \
         WHERE creator_id = $1 AND created_at >= $2",
    );
    if project_id.is_some() {
        query.push_str(" AND project_id = $3");
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as::<_, TaskReportItem>(&query)
        .bind(user_id)
        .bind(start);
    if let Some(project_id) = project_id {
        q = q.bind(project_id);
    }
    let tasks = q.fetch_all(pool).await?;

    let status_rows: Vec<(TaskStatus, i64)> = count_grouped(&tasks, |t| t.status);
    let priority_rows: Vec<(TaskPriority, i64)> = count_grouped(&tasks, |t| t.priority);

    let total_tasks = tasks.len() as i64;
    let completed_tasks = status_count(&status_rows, TaskStatus::Completed);

    let completion_samples: Vec<(DateTime<Utc>, DateTime<Utc>)> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.completed_date.map(|done| (t.created_at, done)))
        .collect();

    Ok(TaskReport {
        summary: TaskReportSummary {
            total_tasks,
            completed_tasks,
            pending_tasks: status_count(&status_rows, TaskStatus::Pending),
            in_progress_tasks: status_count(&status_rows, TaskStatus::InProgress),
            completion_rate: completion_rate(completed_tasks, total_tasks),
            average_completion_time: average_completion_days(&completion_samples),
        },
        distributions: TaskReportDistributions {
            priority: priority_distribution(&priority_rows),
            status: status_distribution(&status_rows),
        },
        tasks,
    })
}

/// Builds the project report over the user's ownership union in the window
pub async fn project_report(
    pool: &PgPool,
    user_id: Uuid,
    range: TimeRange,
) -> Result<ProjectReport, sqlx::Error> {
    let start = range.start_from(Utc::now());

    let query = format!(
        "SELECT p.id, p.name, p.status, p.progress, p.created_at, \
                (SELECT COUNT(*) FROM project_members m \
                 WHERE m.project_id = p.id AND m.is_active) AS member_count, \
                (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count \
         FROM projects p \
         WHERE {OWNERSHIP_UNION} AND p.created_at >= $2 \
         ORDER BY p.created_at DESC"
    );
    let projects: Vec<ProjectReportItem> = sqlx::query_as(&query)
        .bind(user_id)
        .bind(start)
        .fetch_all(pool)
        .await?;

    let status_rows: Vec<(ProjectStatus, i64)> = count_grouped(&projects, |p| p.status);

    let total_projects = projects.len() as i64;
    let completed_projects = project_status_count(&status_rows, ProjectStatus::Completed);
    let total_members: i64 = projects.iter().map(|p| p.member_count).sum();
    let total_tasks: i64 = projects.iter().map(|p| p.task_count).sum();

    Ok(ProjectReport {
        summary: ProjectReportSummary {
            total_projects,
            completed_projects,
            active_projects: project_status_count(&status_rows, ProjectStatus::InProgress),
            planning_projects: project_status_count(&status_rows, ProjectStatus::Planning),
            on_hold_projects: project_status_count(&status_rows, ProjectStatus::OnHold),
            completion_rate: completion_rate(completed_projects, total_projects),
            average_team_size: rounded_average(total_members, total_projects),
            average_tasks_per_project: rounded_average(total_tasks, total_projects),
        },
        distributions: ProjectReportDistributions {
            status: project_status_distribution(&status_rows),
        },
        projects,
    })
}

/// Counts rows per key, preserving first-seen order
fn count_grouped<T, K: Copy + PartialEq>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<(K, i64)> {
    let mut counts: Vec<(K, i64)> = Vec::new();
    for row in rows {
        let k = key(row);
        match counts.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, count)) => *count += 1,
            None => counts.push((k, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!(TimeRange::parse_or_default(Some("week")), TimeRange::Week);
        assert_eq!(TimeRange::parse_or_default(Some("year")), TimeRange::Year);
        // Unknown and missing values fall back to a month.
        assert_eq!(TimeRange::parse_or_default(Some("decade")), TimeRange::Month);
        assert_eq!(TimeRange::parse_or_default(None), TimeRange::Month);
    }

    #[test]
    fn test_time_range_start() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(
            TimeRange::Week.start_from(now),
            Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Month.start_from(now),
            Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Quarter.start_from(now),
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Year.start_from(now),
            Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_completion_rate_bounds() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(0, 10), 0);
        assert_eq!(completion_rate(10, 10), 100);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
    }

    #[test]
    fn test_priority_distribution_example() {
        // Three tasks: High, High, Low.
        let rows = vec![(TaskPriority::High, 2), (TaskPriority::Low, 1)];
        let dist = priority_distribution(&rows);
        assert_eq!(dist.high, 2);
        assert_eq!(dist.medium, 0);
        assert_eq!(dist.low, 1);
    }

    #[test]
    fn test_priority_distribution_wire_keys() {
        let json = serde_json::to_value(priority_distribution(&[(TaskPriority::High, 2)])).unwrap();
        assert_eq!(json["High"], 2);
        assert_eq!(json["Medium"], 0);
        assert_eq!(json["Low"], 0);
    }

    #[test]
    fn test_status_distribution() {
        let rows = vec![
            (TaskStatus::Pending, 3),
            (TaskStatus::Completed, 2),
            (TaskStatus::Cancelled, 4),
        ];
        let dist = status_distribution(&rows);
        assert_eq!(dist.pending, 3);
        assert_eq!(dist.in_progress, 0);
        assert_eq!(dist.completed, 2);
    }

    #[test]
    fn test_recent_activity_merges_newest_first() {
        let make = |kind, title: &str, ts: &str| ActivityItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            kind,
            status: "Pending".to_string(),
            created_at: at(ts),
        };
        let tasks = vec![
            make("task", "t1", "2024-06-01T10:00:00Z"),
            make("task", "t2", "2024-06-03T10:00:00Z"),
        ];
        let projects = vec![make("project", "p1", "2024-06-02T10:00:00Z")];

        let merged = merge_recent_activity(tasks, projects);
        let titles: Vec<&str> = merged.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["t2", "p1", "t1"]);
    }

    #[test]
    fn test_recent_activity_caps_at_ten() {
        let items: Vec<ActivityItem> = (0..8)
            .map(|i| ActivityItem {
                id: Uuid::new_v4(),
                title: format!("t{i}"),
                kind: "task",
                status: "Pending".to_string(),
                created_at: at("2024-06-01T10:00:00Z") + Duration::hours(i),
            })
            .collect();
        let merged = merge_recent_activity(items.clone(), items);
        assert_eq!(merged.len(), 10);
    }

    #[test]
    fn test_activity_item_wire_shape() {
        let item = ActivityItem {
            id: Uuid::new_v4(),
            title: "Ship it".to_string(),
            kind: "project",
            status: "In Progress".to_string(),
            created_at: at("2024-06-01T10:00:00Z"),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["createdAt"], "2024-06-01T10:00:00Z");
    }

    #[test]
    fn test_average_completion_days() {
        assert_eq!(average_completion_days(&[]), 0);
        let samples = vec![
            (at("2024-06-01T00:00:00Z"), at("2024-06-03T00:00:00Z")),
            (at("2024-06-01T00:00:00Z"), at("2024-06-05T00:00:00Z")),
        ];
        // (2 + 4) / 2 = 3 days.
        assert_eq!(average_completion_days(&samples), 3);
    }

    #[test]
    fn test_rounded_average() {
        assert_eq!(rounded_average(0, 0), 0);
        assert_eq!(rounded_average(10, 4), 3);
        assert_eq!(rounded_average(10, 3), 3);
        assert_eq!(rounded_average(11, 2), 6);
    }

    #[test]
    fn test_count_grouped() {
        let rows = vec![1, 1, 2, 1, 3];
        let counts = count_grouped(&rows, |v| *v);
        assert_eq!(counts, vec![(1, 3), (2, 1), (3, 1)]);
    }
}
