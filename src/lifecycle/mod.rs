//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast → server stops accepting, sweeper exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger()
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
