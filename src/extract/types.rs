//! Type definitions for the extraction module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Declared JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
}

impl ParamType {
    /// Map a schema `type` literal onto the four supported kinds.
    ///
    /// `integer` folds into `Number` and `array` into `Object`; anything
    /// unrecognised falls back to `String`.
    pub fn from_schema(raw: &str) -> Self {
        match raw {
            "string" => Self::String,
            "number" | "integer" => Self::Number,
            "boolean" => Self::Boolean,
            "object" | "array" => Self::Object,
            other => {
                tracing::debug!(schema_type = other, "Unknown parameter type, using string");
                Self::String
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
}

impl ParameterSpec {
    pub fn new(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
        }
    }
}

/// A tool as declared in the server's registry array.
///
/// `name` is the identifier matched against dispatch case labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub required: BTreeSet<String>,
    /// Whether the schema spreads the shared birth-data parameters.
    #[serde(default)]
    pub inherits_birth_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A routing rule from the dispatch switch: a case label and the backend
/// path its body assigns to `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCase {
    pub case_label: String,
    pub endpoint_path: String,
    pub http_method: HttpMethod,
    pub transforms_input: bool,
    /// Human-readable notes on recognised payload rewrites.
    pub transform_details: Vec<String>,
}

/// Tool names found in the registry block.
///
/// `names` comes from the loose `name: "..."` scan and is what the
/// reconciler counts; `tools` holds the fully parsed declarations, which
/// may be fewer when a tool object is formatted unusually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registry {
    pub names: Vec<String>,
    pub tools: Vec<ToolDeclaration>,
}

/// Both case-label scans of the dispatch switch.
///
/// The two sequences intentionally differ in length when some case bodies
/// do not assign `endpoint` inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchTable {
    pub case_labels: Vec<String>,
    pub cases: Vec<DispatchCase>,
}
