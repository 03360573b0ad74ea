/// Task endpoints
///
/// - `GET    /api/tasks`          - filtered, sorted, paginated list
/// - `POST   /api/tasks`
/// - `GET    /api/tasks/stats`    - aggregate counts for the creator
/// - `GET    /api/tasks/calendar` - tasks due in a date range
/// - `GET    /api/tasks/:id`
/// - `PUT    /api/tasks/:id`      - applies the completion coupling
/// - `DELETE /api/tasks/:id`
///
/// Every operation is scoped to the authenticated creator.
use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    auth::middleware::AuthContext,
    models::{
        project::Project,
        task::{
            resolve_completion, sort_column, CreateTask, Task, TaskListFilter, TaskPriority,
            TaskStats, TaskStatus, UpdateTask, RECURRING_PATTERNS,
        },
        user::User,
    },
    query::{ListParams, Pagination, SortOrder},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(max = 200, message = "Task title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Estimated hours must be non-negative"))]
    pub estimated_hours: Option<f64>,

    pub tags: Option<Vec<String>>,
    pub progress: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurring_pattern: Option<String>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200, message = "Task title must be at most 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Estimated hours must be non-negative"))]
    pub estimated_hours: Option<f64>,

    #[validate(range(min = 0.0, message = "Actual hours must be non-negative"))]
    pub actual_hours: Option<f64>,

    pub tags: Option<Vec<String>>,
    pub progress: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurring_pattern: Option<String>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
    /// Inclusive range start (defaults to the first of the current month)
    pub start: Option<NaiveDate>,

    /// Inclusive range end (defaults to the last day of the start month)
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct TaskListPayload {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct TaskPayload {
    pub task: Task,
}

fn parse_status(value: Option<&str>) -> ApiResult<Option<TaskStatus>> {
    value
        .map(|s| {
            TaskStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest("Invalid status value".to_string()))
        })
        .transpose()
}

fn parse_priority(value: Option<&str>) -> ApiResult<Option<TaskPriority>> {
    value
        .map(|s| {
            TaskPriority::parse(s)
                .ok_or_else(|| ApiError::BadRequest("Invalid priority value".to_string()))
        })
        .transpose()
}

fn check_recurring_pattern(value: Option<&str>) -> ApiResult<()> {
    if let Some(pattern) = value {
        if !RECURRING_PATTERNS.contains(&pattern) {
            return Err(ApiError::BadRequest("Invalid recurring pattern".to_string()));
        }
    }
    Ok(())
}

/// Verifies referenced rows exist before attaching them to a task
async fn check_references(
    state: &AppState,
    assignee_id: Option<Uuid>,
    project_id: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(assignee_id) = assignee_id {
        if User::find_by_id(&state.db, assignee_id).await?.is_none() {
            return Err(ApiError::BadRequest("Assignee not found".to_string()));
        }
    }
    if let Some(project_id) = project_id {
        if Project::find_by_id(&state.db, project_id).await?.is_none() {
            return Err(ApiError::BadRequest("Project not found".to_string()));
        }
    }
    Ok(())
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<TaskListPayload>>> {
    let sort_column = sort_column(params.sort_by.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Invalid sort column".to_string()))?;
    let sort_order = match params.sort_order.as_deref() {
        None => SortOrder::Desc,
        Some(value) => SortOrder::parse(value)
            .ok_or_else(|| ApiError::BadRequest("Invalid sort order".to_string()))?,
    };

    let filter = TaskListFilter {
        status: parse_status(params.status.as_deref())?,
        priority: parse_priority(params.priority.as_deref())?,
        search: params.search.clone().filter(|s| !s.is_empty()),
        sort_column,
        sort_order,
        limit: params.limit(),
        offset: params.offset(),
    };

    let total = Task::count_by_creator(&state.db, auth.user_id, &filter).await?;
    let tasks = Task::list_by_creator(&state.db, auth.user_id, &filter).await?;

    Ok(ApiResponse::ok(
        "Tasks retrieved successfully",
        TaskListPayload {
            tasks,
            pagination: Pagination::new(total, params.page(), params.limit()),
        },
    ))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TaskPayload>>)> {
    req.validate().map_err(|e| validation_error(&e))?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }

    let status = parse_status(req.status.as_deref())?.unwrap_or(TaskStatus::Pending);
    let priority = parse_priority(req.priority.as_deref())?.unwrap_or(TaskPriority::Medium);
    check_recurring_pattern(req.recurring_pattern.as_deref())?;
    check_references(&state, req.assignee_id, req.project_id).await?;

    let progress = req.progress.unwrap_or(0).clamp(0, 100);
    let (status, completed_date) = resolve_completion(status, progress, None, Utc::now());

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description: req.description.map(|d| d.trim().to_string()),
            status,
            priority,
            due_date: req.due_date,
            start_date: req.start_date,
            completed_date,
            estimated_hours: req.estimated_hours,
            tags: req.tags.unwrap_or_default(),
            progress,
            is_recurring: req.is_recurring.unwrap_or(false),
            recurring_pattern: req.recurring_pattern,
            recurring_end_date: req.recurring_end_date,
            creator_id: auth.user_id,
            assignee_id: req.assignee_id,
            project_id: req.project_id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Task created successfully", TaskPayload { task }),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskPayload>>> {
    let task = Task::find_by_id_and_creator(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Task retrieved successfully",
        TaskPayload { task },
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<TaskPayload>>> {
    req.validate().map_err(|e| validation_error(&e))?;

    let current = Task::find_by_id_and_creator(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let status = parse_status(req.status.as_deref())?;
    let priority = parse_priority(req.priority.as_deref())?;
    check_recurring_pattern(req.recurring_pattern.as_deref())?;
    check_references(&state, req.assignee_id, req.project_id).await?;

    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Task title is required".to_string()));
        }
    }

    let task = Task::update(
        &state.db,
        &current,
        UpdateTask {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description.map(|d| Some(d.trim().to_string())),
            status,
            priority,
            due_date: req.due_date.map(Some),
            start_date: req.start_date,
            completed_date: req.completed_date.map(Some),
            estimated_hours: req.estimated_hours.map(Some),
            actual_hours: req.actual_hours.map(Some),
            tags: req.tags,
            progress: req.progress.map(|p| p.clamp(0, 100)),
            is_recurring: req.is_recurring,
            recurring_pattern: req.recurring_pattern.map(Some),
            recurring_end_date: req.recurring_end_date.map(Some),
            assignee_id: req.assignee_id.map(Some),
            project_id: req.project_id.map(Some),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Task updated successfully",
        TaskPayload { task },
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = Task::delete(&state.db, id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(ApiResponse::message("Task deleted successfully"))
}

pub async fn task_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<TaskStats>>> {
    let stats = Task::stats(&state.db, auth.user_id).await?;

    Ok(ApiResponse::ok(
        "Task statistics retrieved successfully",
        stats,
    ))
}

#[derive(Debug, Serialize)]
pub struct CalendarPayload {
    pub tasks: Vec<Task>,
}

pub async fn calendar_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<CalendarParams>,
) -> ApiResult<Json<ApiResponse<CalendarPayload>>> {
    let today = Utc::now().date_naive();
    let start = params
        .start
        .unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let end = params.end.unwrap_or_else(|| {
        let next_month = start.checked_add_months(Months::new(1)).unwrap_or(start);
        next_month.pred_opt().unwrap_or(next_month)
    });

    if end < start {
        return Err(ApiError::BadRequest(
            "Range end must not precede range start".to_string(),
        ));
    }

    let tasks = Task::list_due_between(&state.db, auth.user_id, start, end).await?;

    Ok(ApiResponse::ok(
        "Calendar tasks retrieved successfully",
        CalendarPayload { tasks },
    ))
}
