//! Structured Output Recovery
//!
//! Extraction and repair of near-JSON model output into validated values.

pub mod recovery;
pub mod repair;
pub mod shape;

pub use recovery::{recover, recover_value, RecoveredStructure, RecoveryFailure, RecoveryStage};
pub use shape::{RequiredShape, ShapeViolation};
