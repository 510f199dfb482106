//! SSN validation rules.
//!
//! Pure and synchronous: a string goes in, a `Verdict` comes out. No I/O and
//! no error type; every outcome, including "nothing supplied", is a verdict.

pub mod validator;

pub use validator::{SsnValidator, Verdict, Violation};
