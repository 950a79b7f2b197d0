//! # QConvert Shared Library
//!
//! Domain types, persistence and business rules used by the QConvert API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Passwords, tokens, identity resolution and ownership checks
//! - `db`: Connection pool and embedded migrations
//! - `catalog`: Immutable plan, template and provider catalogs
//! - `usage`: Usage accounting against plan limits
//! - `convert`: Code converter collaborator and persistence policies
//! - `files`: Upload storage, parsing and export views
//! - `best_effort`: Outcome type for side effects that never fail a request

pub mod auth;
pub mod best_effort;
pub mod catalog;
pub mod convert;
pub mod db;
pub mod files;
pub mod models;
pub mod usage;

/// Current version of the QConvert shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
