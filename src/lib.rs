//! Tramite Core Library
//!
//! Workflow engine for a government certificate-request service:
//! - Request lifecycle state machine and transition validation
//! - Atomic status updates with an append-only audit trail
//! - Document intake with failure cleanup
//! - Lazy, idempotent certificate generation coordination
//! - Database models and store abstractions
//! - Configuration management and error types

pub mod certificates;
pub mod config;
pub mod db;
pub mod errors;
pub mod storage;
pub mod workflow;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, MemoryStore, Repository, RequestStore};
pub use errors::{AppError, Result};
pub use storage::{FileStore, LocalFileStore};
pub use workflow::{RequestStatus, WorkflowService};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for generated request numbers
pub const REQUEST_NUMBER_PREFIX: &str = "DOC";
