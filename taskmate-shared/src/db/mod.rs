/// Database connectivity
///
/// - `pool`: connection pool construction and configuration
/// - `migrations`: embedded sqlx migration runner
pub mod migrations;
pub mod pool;
