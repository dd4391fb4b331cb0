/// PostgreSQL plumbing
///
/// - `pool`: connection pool construction, health check and statistics
/// - `migrations`: embedded schema migrations
///
/// The collaborator implementations that use the pool live in `crate::models`.

pub mod migrations;
pub mod pool;
