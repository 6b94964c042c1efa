//! Extraction of tool declarations and dispatch cases from MCP server source.
//!
//! Both extractors are tolerant text scanners over TypeScript source. They
//! never guess: a missing structure is reported as
//! `AppError::StructureNotFound` so callers can degrade explicitly.

pub mod dispatch;
pub mod registry;
pub mod rules;
pub mod scan;
pub mod types;

pub use dispatch::{endpoint_map, extract_dispatch, unique_endpoint_paths};
pub use registry::{birth_data_parameters, extract_registry};
pub use types::{
    DispatchCase, DispatchTable, HttpMethod, ParamType, ParameterSpec, Registry, ToolDeclaration,
};
