//! Integration Tests Module
//!
//! End-to-end tests for the Ghostwriter backend through its public API:
//! knowledge assembly against real stores, full interview turns, structured
//! output recovery and article drafting. Text generation is scripted; no
//! network calls are made.

// Shared scripted generator and fixtures
mod support;

// Knowledge context assembly over SQLite and in-memory stores
mod knowledge_test;

// Interview turns through AppState and the command functions
mod interview_test;

// Structured output recovery scenarios
mod structured_output_test;

// Article drafting and revision
mod article_test;
