//! Dialogues microservice library.
//!
//! Create/read access to the `dialogues` table over HTTP, a deferred write
//! path with pollable task status, and a per-request log written to the
//! `logs` table.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod request_log;
pub mod store;
pub mod tasks;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
