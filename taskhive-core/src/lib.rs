//! # TaskHive Core
//!
//! Domain logic for the TaskHive task-tracking API, shared by the HTTP
//! server and the test suites.
//!
//! ## Module Organization
//!
//! - `models`: users, task lists, tasks
//! - `auth`: tokens, passwords, the access-control policy, sessions
//! - `store`: persistence abstraction with in-memory and Postgres backends
//! - `tasks`: the task↔list consistency manager

pub mod auth;
pub mod models;
pub mod store;
pub mod tasks;

/// Current version of the TaskHive core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
