//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod article;
pub mod interview;
pub mod knowledge;
pub mod prompt_builder;
pub mod structured_output;

pub use article::{ArticleDraft, ArticleDrafter};
pub use interview::{InterviewMachine, TurnInput, TurnResult};
pub use knowledge::{AssembledContext, AssemblyRequest, KnowledgeContextAssembler};
pub use structured_output::{recover, recover_value, RecoveredStructure, RequiredShape};
