//! toolaudit - maintenance toolkit for an MCP tool server
//!
//! Scrapes the server source for its tool registry and dispatch switch,
//! reconciles them against each other and against the API documentation,
//! smoke-tests the hosted API, and prepares patched copies of the source
//! and package manifest.

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod patch;
pub mod reconcile;
pub mod smoke;

// Re-export key types for convenience
pub use config::{Config, LogFormat};
pub use error::{AppError, Result};
pub use extract::{extract_dispatch, extract_registry, DispatchTable, Registry};
pub use reconcile::{reconcile, reconcile_source, ReconciliationReport, ReportStatus};
pub use smoke::{SmokeReport, SmokeRunner};
