/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, profile and mock OAuth
/// - `billing`: Subscription, plans, invoices and billing address
/// - `payment_methods`: Payment method management
/// - `convert`: Code conversion and the library list
/// - `history`: Conversion history
/// - `workflows`: Workflows and templates
/// - `data_clean`: Data files and their derived views
/// - `files`: Raw file upload
/// - `benchmark`: Benchmark provider catalog
/// - `users`: Per-user statistics
/// - `libraries`: Quantum library catalog

pub mod auth;
pub mod benchmark;
pub mod billing;
pub mod convert;
pub mod data_clean;
pub mod files;
pub mod health;
pub mod history;
pub mod libraries;
pub mod payment_methods;
pub mod users;
pub mod workflows;
