/// Application state and router builder
///
/// # Route map
///
/// ```text
/// /
/// ├── /health                                  # public
/// └── /api/
///     ├── /auth/        POST signup|signin (public), GET me, POST logout
///     ├── /users/       GET|PUT|DELETE profile, GET|PUT settings
///     ├── /tasks/       list/create, stats, calendar, GET|PUT|DELETE /:id
///     ├── /projects/    list/create, stats, users/search, GET|PUT|DELETE /:id,
///     │                 POST /:id/members, DELETE /:id/members/:user_id
///     ├── /events/      list/create, GET|PUT|DELETE /:id
///     └── /reports/     GET dashboard|tasks|projects
/// ```
///
/// Everything under `/api` except signup/signin requires a bearer token;
/// the middleware validates it and injects an `AuthContext` extension.
use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskmate_shared::auth::{jwt, middleware::AuthContext};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// JWT signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signin", post(routes::auth::signin))
        .merge(
            Router::new()
                .route("/me", get(routes::auth::me))
                .route("/logout", post(routes::auth::logout))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    jwt_auth_layer,
                )),
        );

    let user_routes = Router::new()
        .route(
            "/profile",
            get(routes::users::get_profile)
                .put(routes::users::update_profile)
                .delete(routes::users::delete_profile),
        )
        .route(
            "/settings",
            get(routes::users::get_settings).put(routes::users::update_settings),
        );

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route("/stats", get(routes::tasks::task_stats))
        .route("/calendar", get(routes::tasks::calendar_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/stats", get(routes::projects::project_stats))
        .route("/users/search", get(routes::projects::search_users))
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/members", post(routes::projects::add_member))
        .route("/:id/members/:user_id", delete(routes::projects::remove_member));

    let event_routes = Router::new()
        .route(
            "/",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        );

    let report_routes = Router::new()
        .route("/dashboard", get(routes::reports::dashboard))
        .route("/tasks", get(routes::reports::tasks))
        .route("/projects", get(routes::reports::projects));

    // All resource routes sit behind the bearer-token middleware.
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/projects", project_routes)
        .nest("/events", event_routes)
        .nest("/reports", report_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api = Router::new().nest("/auth", auth_routes).merge(protected);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token middleware
///
/// Validates the Authorization header and injects an `AuthContext` into the
/// request extensions for handlers to extract.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_jwt(claims.sub));

    Ok(next.run(req).await)
}
