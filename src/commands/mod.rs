//! Commands
//!
//! Call-style entry points over [`crate::state::AppState`]. Every command
//! returns a [`crate::models::CommandResponse`] envelope.

pub mod article;
pub mod interview;
pub mod knowledge;
pub mod settings;
pub mod structured_output;

pub use article::*;
pub use interview::*;
pub use knowledge::*;
pub use settings::*;
pub use structured_output::*;
