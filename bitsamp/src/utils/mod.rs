//! Utility functions and supporting infrastructure.
//!
//! Provides the residual-carrying bit primitives shared by both engines,
//! the byte-source abstraction they read from, and error types.

pub mod bits;
pub mod errors;
pub mod source;
