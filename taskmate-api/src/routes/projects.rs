/// Project endpoints
///
/// - `GET    /api/projects`              - ownership-union list with task roll-ups
/// - `POST   /api/projects`              - creator becomes owner + first member
/// - `GET    /api/projects/stats`
/// - `GET    /api/projects/users/search` - member picker
/// - `GET    /api/projects/:id`          - owner/manager/member only
/// - `PUT    /api/projects/:id`          - owner/manager only
/// - `DELETE /api/projects/:id`          - owner only
/// - `POST   /api/projects/:id/members`
/// - `DELETE /api/projects/:id/members/:user_id`
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
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    auth::middleware::AuthContext,
    models::{
        project::{
            resolve_end_date, sort_column, CreateProject, Project, ProjectListFilter,
            ProjectStats, ProjectStatus, ProjectWithStats, UpdateProject,
        },
        project_member::{MemberRole, MemberWithUser, ProjectMember},
        task::TaskPriority,
        user::{PublicUser, User},
    },
    query::{ListParams, Pagination, SortOrder},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(max = 200, message = "Project name must be at most 200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(max = 200, message = "Project name must be at most 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<i32>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersParams {
    pub query: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListPayload {
    pub projects: Vec<ProjectWithStats>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProjectPayload {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailPayload {
    pub project: Project,
    pub members: Vec<MemberWithUser>,
}

#[derive(Debug, Serialize)]
pub struct MembersPayload {
    pub members: Vec<MemberWithUser>,
}

#[derive(Debug, Serialize)]
pub struct UsersPayload {
    pub users: Vec<PublicUser>,
}

fn parse_status(value: Option<&str>) -> ApiResult<Option<ProjectStatus>> {
    value
        .map(|s| {
            ProjectStatus::parse(s)
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

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<ProjectListPayload>>> {
    let sort_column = sort_column(params.sort_by.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Invalid sort column".to_string()))?;
    let sort_order = match params.sort_order.as_deref() {
        None => SortOrder::Desc,
        Some(value) => SortOrder::parse(value)
            .ok_or_else(|| ApiError::BadRequest("Invalid sort order".to_string()))?,
    };

    // The UI sends "all" for an unfiltered listing.
    let status = match params.status.as_deref() {
        None | Some("all") => None,
        other => parse_status(other)?,
    };

    let filter = ProjectListFilter {
        status,
        search: params.search.clone().filter(|s| !s.is_empty()),
        sort_column,
        sort_order,
        limit: params.limit(),
        offset: params.offset(),
    };

    let total = Project::count_for_user(&state.db, auth.user_id, &filter).await?;
    let projects = Project::list_for_user(&state.db, auth.user_id, &filter).await?;
    let projects = Project::attach_task_stats(&state.db, projects).await?;

    Ok(ApiResponse::ok(
        "Projects retrieved successfully",
        ProjectListPayload {
            projects,
            pagination: Pagination::new(total, params.page(), params.limit()),
        },
    ))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProjectPayload>>)> {
    req.validate().map_err(|e| validation_error(&e))?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    let status = parse_status(req.status.as_deref())?.unwrap_or(ProjectStatus::Planning);
    let priority = parse_priority(req.priority.as_deref())?.unwrap_or(TaskPriority::Medium);

    if let Some(manager_id) = req.manager_id {
        if User::find_by_id(&state.db, manager_id).await?.is_none() {
            return Err(ApiError::BadRequest("Manager not found".to_string()));
        }
    }

    let end_date = resolve_end_date(status, req.end_date, Utc::now());

    let project = Project::create(
        &state.db,
        CreateProject {
            name,
            description: req.description.map(|d| d.trim().to_string()),
            status,
            priority,
            start_date: req.start_date,
            end_date,
            due_date: req.due_date,
            progress: req.progress.unwrap_or(0).clamp(0, 100),
            category: req.category,
            tags: req.tags.unwrap_or_default(),
            owner_id: auth.user_id,
            manager_id: req.manager_id,
        },
    )
    .await?;

    // The creator joins their own project as its Owner member.
    ProjectMember::create(&state.db, project.id, auth.user_id, MemberRole::Owner).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Project created successfully", ProjectPayload { project }),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ProjectDetailPayload>>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !project.user_has_access(&state.db, auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "Access denied to this project".to_string(),
        ));
    }

    let members = ProjectMember::list_by_project(&state.db, id).await?;

    Ok(ApiResponse::ok(
        "Project retrieved successfully",
        ProjectDetailPayload { project, members },
    ))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ApiResponse<ProjectPayload>>> {
    req.validate().map_err(|e| validation_error(&e))?;

    let current = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !current.user_can_edit(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to edit this project".to_string(),
        ));
    }

    let status = parse_status(req.status.as_deref())?;
    let priority = parse_priority(req.priority.as_deref())?;

    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Project name is required".to_string()));
        }
    }

    if let Some(manager_id) = req.manager_id {
        if User::find_by_id(&state.db, manager_id).await?.is_none() {
            return Err(ApiError::BadRequest("Manager not found".to_string()));
        }
    }

    let project = Project::update(
        &state.db,
        &current,
        UpdateProject {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description.map(|d| Some(d.trim().to_string())),
            status,
            priority,
            start_date: req.start_date,
            end_date: req.end_date.map(Some),
            due_date: req.due_date.map(Some),
            progress: req.progress.map(|p| p.clamp(0, 100)),
            category: req.category.map(Some),
            tags: req.tags,
            manager_id: req.manager_id.map(Some),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Project updated successfully",
        ProjectPayload { project },
    ))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.owner_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the project owner can delete this project".to_string(),
        ));
    }

    Project::delete(&state.db, id).await?;

    Ok(ApiResponse::message("Project deleted successfully"))
}

pub async fn project_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<ProjectStats>>> {
    let stats = Project::stats(&state.db, auth.user_id).await?;

    Ok(ApiResponse::ok(
        "Project statistics retrieved successfully",
        stats,
    ))
}

/// Member-picker search; short queries return an empty list rather than
/// scanning the whole user table
pub async fn search_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(params): Query<SearchUsersParams>,
) -> ApiResult<Json<ApiResponse<UsersPayload>>> {
    let term = params.query.unwrap_or_default();
    if term.trim().len() < 2 {
        return Ok(ApiResponse::ok(
            "Users retrieved successfully",
            UsersPayload { users: vec![] },
        ));
    }

    let users = User::search(&state.db, term.trim(), params.project_id).await?;

    Ok(ApiResponse::ok(
        "Users retrieved successfully",
        UsersPayload { users },
    ))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ApiResponse<MembersPayload>>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !project.user_can_edit(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to add members to this project".to_string(),
        ));
    }

    if User::find_by_id(&state.db, req.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let role = match req.role.as_deref() {
        None => MemberRole::Developer,
        Some(value) => MemberRole::parse(value)
            .ok_or_else(|| ApiError::BadRequest("Invalid role value".to_string()))?,
    };

    match ProjectMember::find(&state.db, id, req.user_id).await? {
        Some(existing) if existing.is_active => {
            return Err(ApiError::BadRequest(
                "User is already a member of this project".to_string(),
            ));
        }
        Some(existing) => {
            // Previously removed: bring the row back instead of violating
            // the (project, user) uniqueness.
            ProjectMember::reactivate(&state.db, existing.id, role).await?;
        }
        None => {
            ProjectMember::create(&state.db, id, req.user_id, role).await?;
        }
    }

    let members = ProjectMember::list_by_project(&state.db, id).await?;

    Ok(ApiResponse::ok(
        "Member added successfully",
        MembersPayload { members },
    ))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if !project.user_can_edit(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to remove members from this project".to_string(),
        ));
    }

    if project.owner_id == user_id {
        return Err(ApiError::BadRequest(
            "Cannot remove the project owner".to_string(),
        ));
    }

    let removed = ProjectMember::deactivate(&state.db, id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "User is not a member of this project".to_string(),
        ));
    }

    Ok(ApiResponse::message("Member removed successfully"))
}
