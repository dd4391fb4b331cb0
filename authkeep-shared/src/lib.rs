//! # AuthKeep Shared Library
//!
//! Token lifecycle core used by the AuthKeep API server and the janitor.
//!
//! ## Module Organization
//!
//! - `auth`: token minting, validation, password hashing and the orchestrator
//! - `store`: collaborator traits plus in-memory implementations
//! - `models`: PostgreSQL implementations of the collaborator traits
//! - `db`: connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the AuthKeep shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
