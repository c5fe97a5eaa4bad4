//! # TaskDeck Shared Library
//!
//! Types, persistence, and authentication primitives shared by the TaskDeck
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Token service, password hashing, session middleware and admin gate
//! - `db`: Connection pool and schema migrations
//! - `models`: Users, tasks, the task query engine, and admin statistics

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
