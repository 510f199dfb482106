//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP token bucket, checked by the HTTP middleware)
//!     → sanitize.rs (strip markup from the ssn field)
//!     → Pass to the validator
//! ```
//!
//! # Design Decisions
//! - Rate limit key is the TCP peer address; forwarding headers are not trusted
//! - Limiter state is bounded: idle expiry plus a hard key cap
//! - Sanitizing is a pre-filter; the format check is the real gate

pub mod clock;
pub mod rate_limit;
pub mod sanitize;

pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limit::{Decision, RateLimiter};
pub use sanitize::Sanitizer;
