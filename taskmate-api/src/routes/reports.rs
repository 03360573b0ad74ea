/// Analytics endpoints
///
/// - `GET /api/reports/dashboard` - combined task/project summary
/// - `GET /api/reports/tasks`     - task analytics, optional ?projectId=
/// - `GET /api/reports/projects`  - project analytics over the ownership union
///
/// All three accept `?timeRange=week|month|quarter|year` (default month) and
/// recompute from the window's rows on every request.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskmate_shared::{
    auth::middleware::AuthContext,
    reports::{self, DashboardReport, ProjectReport, TaskReport, TimeRange},
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub time_range: Option<String>,

    /// Task report only; "all" means no filter
    pub project_id: Option<String>,
}

impl ReportParams {
    fn range(&self) -> TimeRange {
        TimeRange::parse_or_default(self.time_range.as_deref())
    }

    fn project_filter(&self) -> ApiResult<Option<Uuid>> {
        match self.project_id.as_deref() {
            None | Some("all") => Ok(None),
            Some(raw) => raw
                .parse::<Uuid>()
                .map(Some)
                .map_err(|_| ApiError::BadRequest("Invalid project id".to_string())),
        }
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Json<ApiResponse<DashboardReport>>> {
    let report = reports::dashboard(&state.db, auth.user_id, params.range()).await?;

    Ok(ApiResponse::ok("Analytics retrieved successfully", report))
}

pub async fn tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Json<ApiResponse<TaskReport>>> {
    let project_id = params.project_filter()?;
    let report =
        reports::task_report(&state.db, auth.user_id, params.range(), project_id).await?;

    Ok(ApiResponse::ok(
        "Task analytics retrieved successfully",
        report,
    ))
}

pub async fn projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Json<ApiResponse<ProjectReport>>> {
    let report = reports::project_report(&state.db, auth.user_id, params.range()).await?;

    Ok(ApiResponse::ok(
        "Project analytics retrieved successfully",
        report,
    ))
}
