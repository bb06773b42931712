//! Data Models
//!
//! Configuration and command response structures used throughout the
//! application. Domain types live in `ghostwriter-core`.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;
