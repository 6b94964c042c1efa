//! Registry extraction: turns the server's `const tools = [...]` array into
//! [`ToolDeclaration`] records.

use crate::error::{AppError, Result};
use crate::extract::scan::{matching_close, unescape_literal};
use crate::extract::types::{ParamType, ParameterSpec, Registry, ToolDeclaration};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Spread marker that stands for the shared birth-data parameters.
pub const BIRTH_DATA_SHORTHAND: &str = "...birthDataSchema";

static TOOLS_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)const tools.*?\[(.*?)\];").expect("valid regex"));

static TOOL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name:\s*"([^"]+)""#).expect("valid regex"));

static TOOL_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\s*name:\s*"([^"]+)",\s*description:\s*"((?:[^"\\]|\\.)*)",\s*inputSchema:\s*\{"#,
    )
    .expect("valid regex")
});

static PROPERTIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"properties:\s*\{").expect("valid regex"));

static PROPERTY_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\s*\{").expect("valid regex"));

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"type:\s*"([^"]+)""#).expect("valid regex"));

static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"description:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex"));

static REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)required:\s*\[(.*?)\]").expect("valid regex"));

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));

/// The six parameters `...birthDataSchema` expands to.
pub fn birth_data_parameters() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new("name", ParamType::String, "Person's name"),
        ParameterSpec::new(
            "datetime",
            ParamType::String,
            "Birth date and time (ISO 8601)",
        ),
        ParameterSpec::new("latitude", ParamType::Number, "Birth latitude"),
        ParameterSpec::new("longitude", ParamType::Number, "Birth longitude"),
        ParameterSpec::new("location", ParamType::String, "Birth location"),
        ParameterSpec::new("timezone", ParamType::String, "Timezone (e.g. Europe/Moscow)"),
    ]
}

/// Extract the tool registry from raw server source.
///
/// # Errors
/// Returns `AppError::StructureNotFound` when no `const tools ... [ ... ];`
/// block exists. Callers must read that as "cannot analyze", never as
/// "zero tools".
pub fn extract_registry(source: &str) -> Result<Registry> {
    let block = TOOLS_BLOCK_RE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            AppError::StructureNotFound("tool registry array `const tools = [...]`".to_string())
        })?;

    let names: Vec<String> = TOOL_NAME_RE
        .captures_iter(block)
        .map(|caps| caps[1].to_string())
        .collect();

    let mut tools = Vec::new();
    for header in TOOL_HEADER_RE.captures_iter(block) {
        let Some(whole) = header.get(0) else {
            continue;
        };
        let schema_open = whole.end() - 1;
        let Some(schema_close) = matching_close(block, schema_open) else {
            tracing::warn!(tool = &header[1], "Unbalanced inputSchema, skipping tool");
            continue;
        };
        let schema = &block[schema_open + 1..schema_close];
        tools.push(parse_tool(&header[1], &header[2], schema));
    }

    if tools.len() != names.len() {
        tracing::debug!(
            names = names.len(),
            parsed = tools.len(),
            "Some registry entries did not match the full tool layout"
        );
    }

    tracing::debug!(tools = names.len(), "Registry extraction complete");

    Ok(Registry { names, tools })
}

fn parse_tool(name: &str, description: &str, schema: &str) -> ToolDeclaration {
    let mut parameters = Vec::new();
    let mut inherits_birth_data = false;
    let mut rest = schema;

    if let Some(props) = PROPERTIES_RE.find(schema) {
        let open = props.end() - 1;
        if let Some(close) = matching_close(schema, open) {
            let body = &schema[open + 1..close];
            if body.contains(BIRTH_DATA_SHORTHAND) {
                inherits_birth_data = true;
                parameters = birth_data_parameters();
            }
            for param in parse_properties(body) {
                match parameters.iter_mut().find(|p| p.name == param.name) {
                    Some(existing) => *existing = param,
                    None => parameters.push(param),
                }
            }
            rest = &schema[close + 1..];
        }
    }

    ToolDeclaration {
        name: name.to_string(),
        description: unescape_literal(description),
        parameters,
        required: parse_required(rest),
        inherits_birth_data,
    }
}

/// Top-level `<ident>: { type: "...", description: "..." }` entries.
fn parse_properties(body: &str) -> Vec<ParameterSpec> {
    let mut params = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = PROPERTY_ENTRY_RE.captures_at(body, cursor) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let open = whole.end() - 1;
        let Some(close) = matching_close(body, open) else {
            break;
        };
        let entry = &body[open + 1..close];
        cursor = close + 1;

        // Only the leading `type` belongs to the entry; nested `items` carry their own.
        let Some(type_caps) = TYPE_RE.captures(entry) else {
            continue;
        };
        let description = DESCRIPTION_RE
            .captures(entry)
            .map(|c| unescape_literal(&c[1]))
            .unwrap_or_default();

        params.push(ParameterSpec::new(
            &caps[1],
            ParamType::from_schema(&type_caps[1]),
            description,
        ));
    }

    params
}

fn parse_required(schema_tail: &str) -> BTreeSet<String> {
    REQUIRED_RE
        .captures(schema_tail)
        .map(|caps| {
            QUOTED_RE
                .captures_iter(&caps[1])
                .map(|q| q[1].to_string())
                .collect()
        })
        .unwrap_or_default()
}
