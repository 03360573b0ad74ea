/// API route handlers, one module per resource
///
/// - `health`: liveness/database check
/// - `auth`: signup, signin, me, logout
/// - `users`: profile and settings
/// - `tasks`: task CRUD, stats, calendar
/// - `projects`: project CRUD, members, stats, user search
/// - `events`: calendar event CRUD
/// - `reports`: time-windowed analytics
pub mod auth;
pub mod events;
pub mod health;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod users;
