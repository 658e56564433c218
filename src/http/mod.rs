//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request id → trace span
//!     → middleware/request_log.rs (timer starts)
//!     → CORS (preflights answered here) → timeout → handlers.rs
//!     → store / tasks
//!     → extract.rs rejections | response.rs bodies | error.rs mapping
//!     → request_log.rs writes the log entry
//!     → Send to client
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
