//! # QConvert API Server Library
//!
//! HTTP surface of the QConvert platform: authentication, billing, data
//! files, workflows, code conversion and catalogs.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors that reject through `ApiError`
//! - `middleware`: Authentication gates and security headers
//! - `response`: Success envelope and pagination
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
