/// Blog Service Library
///
/// A small blogging platform: authors publish short text posts, optionally
/// in a thematic group and with an image, comment on posts and follow each
/// other to get a personalised feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers (JSON)
/// - `domain`: Entities, forms and the request identity
/// - `services`: Business logic layer
/// - `repository`: Entity store trait with Postgres and in-memory backends
/// - `cache`: Feed caching and invalidation
/// - `pagination`: Fixed-size paging of feeds
/// - `storage`: Post image storage
/// - `middleware`: Bearer token identity resolution
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod repository;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::{configure, AppState};
pub use config::Config;
pub use error::{AppError, Result};
