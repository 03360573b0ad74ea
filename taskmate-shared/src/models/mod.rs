/// Database models
///
/// Each model owns its SQL: a `sqlx::FromRow` struct plus associated
/// functions for the operations the API exposes.
///
/// - `user`: accounts, profiles, settings, and the member-picker search
/// - `task`: creator-scoped tasks with filtered listing and stats
/// - `project`: ownership-union projects with task roll-ups
/// - `project_member`: user↔project links with roles and soft removal
/// - `event`: calendar entries
pub mod event;
pub mod project;
pub mod project_member;
pub mod task;
pub mod user;
