//! # TaskTrack Shared Library
//!
//! Domain core of the TaskTrack service: models, session tokens, the
//! permission engine, the persistence interface, and the services that tie
//! them together. The HTTP layer lives in `tasktrack-api`.
//!
//! ## Module Organization
//!
//! - `models`: User, Team, and Task snapshots
//! - `auth`: credential hashing, token codec, identity resolution, permissions
//! - `store`: transactional persistence interface with memory and PostgreSQL backends
//! - `db`: connection pool and migrations
//! - `services`: mutation orchestrators
//! - `error`: the service error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TaskTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
