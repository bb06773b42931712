//! Knowledge Context
//!
//! Selection, authorization and budgeting of knowledge fragments for prompts.

pub mod assembler;
pub mod render;

pub use assembler::{AssembledContext, AssemblyRequest, ContextBudgets, KnowledgeContextAssembler};
