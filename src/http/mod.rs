//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → middleware/rate_limit.rs (admit or 429)
//!     → handlers.rs (sanitize → validate → verdict)
//!     → error.rs (unreadable bodies)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, HEALTH_PATH, VALIDATE_PATH};
