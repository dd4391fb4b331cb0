/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Session endpoints (register, login, refresh, logout, me)

pub mod auth;
pub mod health;
