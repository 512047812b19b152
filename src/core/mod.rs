// Public modules
pub mod catalog;
pub mod docs_audit;
pub mod engine;
pub mod error;
pub mod git;
pub mod refactor;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
