/// Middleware modules for the API server
///
/// - `auth`: Strict and optional bearer-token gates
/// - `security`: Security response headers

pub mod auth;
pub mod security;
