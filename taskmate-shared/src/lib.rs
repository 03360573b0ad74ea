//! # TaskMate Shared Library
//!
//! Types and business logic shared by the TaskMate API server:
//!
//! - `models`: database models and their SQL
//! - `auth`: JWT, password hashing, and the authenticated-request context
//! - `db`: connection pool and migrations
//! - `query`: list filtering, sorting, and pagination plumbing
//! - `reports`: time-windowed analytics

pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod reports;

/// Current version of the TaskMate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
