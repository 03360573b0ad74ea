/// Shared infrastructure for API integration tests
///
/// Builds the full router against a lazily-connected pool, so tests that
/// exercise the middleware, validation, and error envelope run without a
/// live database. `DATABASE_URL` is honored when set, letting the same
/// tests run against a real instance.
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use taskmate_api::app::{build_router, AppState};
use taskmate_api::config::{ApiConfig, Config, DatabaseSettings, JwtConfig};
use taskmate_shared::auth::jwt::{create_token, Claims};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseSettings {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/taskmate_test".to_string()),
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
    }
}

/// Builds the application with a lazy pool (no connection until first query)
pub fn test_app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_lazy(&config.database.url)
        .expect("valid database url");
    build_router(AppState::new(pool, config))
}

/// Bearer header for a fresh user id signed with the test secret
pub fn auth_header() -> String {
    auth_header_for(Uuid::new_v4())
}

pub fn auth_header_for(user_id: Uuid) -> String {
    let token = create_token(&Claims::new(user_id), TEST_JWT_SECRET).expect("token signs");
    format!("Bearer {token}")
}

/// Reads a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}
