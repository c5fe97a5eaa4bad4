/// API route handlers
///
/// - `health`: liveness and database connectivity
/// - `auth`: register, login, refresh, logout
/// - `tasks`: owner-scoped task listing and mutations
/// - `admin`: statistics and user management

pub mod admin;
pub mod auth;
pub mod health;
pub mod tasks;
