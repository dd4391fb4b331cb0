//! # AuthKeep Janitor Library
//!
//! Periodic removal of refresh token records that can no longer be used.
//!
//! ## Modules
//!
//! - `janitor`: configuration and the sweep loop

pub mod janitor;
