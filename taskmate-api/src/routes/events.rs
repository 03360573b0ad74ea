/// Calendar event endpoints
///
/// - `GET    /api/events`     - creator's events, optional ?from=&to= range
/// - `POST   /api/events`
/// - `GET    /api/events/:id`
/// - `PUT    /api/events/:id`
/// - `DELETE /api/events/:id`
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
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    auth::middleware::AuthContext,
    models::event::{
        is_valid_time, CreateEvent, Event, EventPriority, EventType, UpdateEvent,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(max = 200, message = "Event title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub date: NaiveDate,
    pub time: String,

    #[validate(range(min = 0, message = "Duration must be non-negative"))]
    pub duration: Option<i32>,

    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub priority: Option<String>,
    pub location: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(max = 200, message = "Event title must be at most 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub date: Option<NaiveDate>,
    pub time: Option<String>,

    #[validate(range(min = 0, message = "Duration must be non-negative"))]
    pub duration: Option<i32>,

    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub priority: Option<String>,
    pub location: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EventListParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EventListPayload {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct EventPayload {
    pub event: Event,
}

fn parse_type(value: Option<&str>) -> ApiResult<Option<EventType>> {
    value
        .map(|s| {
            EventType::parse(s)
                .ok_or_else(|| ApiError::BadRequest("Invalid event type".to_string()))
        })
        .transpose()
}

fn parse_priority(value: Option<&str>) -> ApiResult<Option<EventPriority>> {
    value
        .map(|s| {
            EventPriority::parse(s)
                .ok_or_else(|| ApiError::BadRequest("Invalid priority value".to_string()))
        })
        .transpose()
}

fn check_time(time: &str) -> ApiResult<()> {
    if !is_valid_time(time) {
        return Err(ApiError::BadRequest(
            "Time must be in HH:MM format".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<EventListParams>,
) -> ApiResult<Json<ApiResponse<EventListPayload>>> {
    let events =
        Event::list_by_creator(&state.db, auth.user_id, params.from, params.to).await?;

    Ok(ApiResponse::ok(
        "Events retrieved successfully",
        EventListPayload { events },
    ))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EventPayload>>)> {
    req.validate().map_err(|e| validation_error(&e))?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Event title is required".to_string()));
    }
    check_time(&req.time)?;

    let event_type = parse_type(req.event_type.as_deref())?.unwrap_or(EventType::Event);
    let priority = parse_priority(req.priority.as_deref())?.unwrap_or(EventPriority::Medium);

    let event = Event::create(
        &state.db,
        CreateEvent {
            title,
            description: req.description.map(|d| d.trim().to_string()),
            date: req.date,
            time: req.time,
            duration: req.duration.unwrap_or(60),
            event_type,
            priority,
            location: req.location,
            creator_id: auth.user_id,
            project_id: req.project_id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Event created successfully", EventPayload { event }),
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<EventPayload>>> {
    let event = Event::find_by_id_and_creator(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Event retrieved successfully",
        EventPayload { event },
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<ApiResponse<EventPayload>>> {
    req.validate().map_err(|e| validation_error(&e))?;

    Event::find_by_id_and_creator(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if let Some(time) = req.time.as_deref() {
        check_time(time)?;
    }
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Event title is required".to_string()));
        }
    }

    let event_type = parse_type(req.event_type.as_deref())?;
    let priority = parse_priority(req.priority.as_deref())?;

    let event = Event::update(
        &state.db,
        id,
        UpdateEvent {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description.map(|d| Some(d.trim().to_string())),
            date: req.date,
            time: req.time,
            duration: req.duration,
            event_type,
            priority,
            location: req.location.map(Some),
            project_id: req.project_id.map(Some),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(ApiResponse::ok(
        "Event updated successfully",
        EventPayload { event },
    ))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = Event::delete(&state.db, id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    Ok(ApiResponse::message("Event deleted successfully"))
}
