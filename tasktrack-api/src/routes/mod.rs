/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: The caller's own profile
/// - `teams`: Teams and their membership
/// - `tasks`: Tasks, assignment and status

pub mod auth;
pub mod health;
pub mod tasks;
pub mod teams;
pub mod users;
