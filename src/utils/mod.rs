//! Utilities
//!
//! The application error type and default file locations.

pub mod error;
pub mod paths;

#[cfg(test)]
pub mod test_support;

pub use error::*;
pub use paths::*;
