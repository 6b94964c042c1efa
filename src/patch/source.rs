//! Insertion of tool declarations and dispatch cases into server source.
//!
//! Everything here is `text -> text`; callers decide whether to persist.

use crate::error::{AppError, Result};
use crate::extract::registry::{birth_data_parameters, BIRTH_DATA_SHORTHAND};
use crate::extract::types::{HttpMethod, ToolDeclaration};
use crate::extract::{extract_dispatch, extract_registry};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A dispatch case to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSpec {
    pub label: String,
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
}

fn default_method() -> HttpMethod {
    HttpMethod::Post
}

/// Tools and cases to insert ahead of an existing tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPatch {
    /// Existing tool whose declaration and case the new blocks go before.
    pub anchor_tool: String,
    pub tools: Vec<ToolDeclaration>,
    pub cases: Vec<CaseSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchOutcome {
    pub text: String,
    pub tools_added: Vec<String>,
    pub cases_added: Vec<String>,
    /// Tools or cases left out because the source already has them.
    pub already_present: Vec<String>,
    /// Anchors that could not be located; the matching insertion was skipped.
    pub missing_anchors: Vec<String>,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        !self.tools_added.is_empty() || !self.cases_added.is_empty()
    }
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn insert_at(text: &str, at: usize, insertion: &str) -> String {
    let mut out = String::with_capacity(text.len() + insertion.len());
    out.push_str(&text[..at]);
    out.push_str(insertion);
    out.push_str(&text[at..]);
    out
}

/// Insert `insertion` at the start of the line holding the first `anchor`.
///
/// # Errors
/// Returns `AppError::AnchorNotFound` when `anchor` does not occur.
pub fn insert_before_anchor(text: &str, anchor: &str, insertion: &str) -> Result<String> {
    let pos = text
        .find(anchor)
        .ok_or_else(|| AppError::AnchorNotFound(anchor.to_string()))?;
    Ok(insert_at(text, line_start(text, pos), insertion))
}

/// Position of the first match of `pattern`, tolerant of whitespace the
/// extractors also tolerate.
fn find_pattern(text: &str, pattern: &str, label: &str) -> Result<usize> {
    let re = Regex::new(pattern).map_err(|_| AppError::AnchorNotFound(label.to_string()))?;
    re.find(text)
        .map(|m| m.start())
        .ok_or_else(|| AppError::AnchorNotFound(label.to_string()))
}

fn tool_anchor(name: &str) -> String {
    format!("name: \"{}\"", name)
}

fn case_anchor(label: &str) -> String {
    format!("case \"{}\":", label)
}

/// Insert before the line opening the registry object that declares `tool`.
fn insert_before_tool(text: &str, tool: &str, insertion: &str) -> Result<String> {
    let pattern = format!(r#"name:\s*"{}""#, regex::escape(tool));
    let pos = find_pattern(text, &pattern, &tool_anchor(tool))?;
    let open = text[..pos]
        .rfind('{')
        .ok_or_else(|| AppError::AnchorNotFound(format!("object enclosing {}", tool)))?;
    Ok(insert_at(text, line_start(text, open), insertion))
}

/// Insert before the line holding `case "<label>":`.
fn insert_before_case(text: &str, label: &str, insertion: &str) -> Result<String> {
    let pattern = format!(r#"case\s*"{}":"#, regex::escape(label));
    let pos = find_pattern(text, &pattern, &case_anchor(label))?;
    Ok(insert_at(text, line_start(text, pos), insertion))
}

/// Add the patch's tools to the registry and its cases to the switch.
///
/// Presence is decided by the extractors, so a tool or case counts as
/// present however the source formats it, and applying a patch twice
/// changes nothing the second time. A missing anchor skips that half of
/// the patch and is reported in the outcome.
pub fn add_tool_blocks(text: &str, patch: &ToolPatch) -> PatchOutcome {
    let mut outcome = PatchOutcome {
        text: text.to_string(),
        ..Default::default()
    };

    let mut declared: BTreeSet<String> = extract_registry(text)
        .map(|registry| registry.names.into_iter().collect())
        .unwrap_or_default();
    let mut routed: BTreeSet<String> = extract_dispatch(text)
        .map(|table| table.case_labels.into_iter().collect())
        .unwrap_or_default();

    let mut tool_text = String::new();
    for tool in &patch.tools {
        if !declared.insert(tool.name.clone()) {
            outcome.already_present.push(tool.name.clone());
            continue;
        }
        tool_text.push_str(&render_tool_block(tool));
        outcome.tools_added.push(tool.name.clone());
    }

    let mut case_text = String::new();
    for case in &patch.cases {
        if !routed.insert(case.label.clone()) {
            outcome.already_present.push(format!("case {}", case.label));
            continue;
        }
        case_text.push_str(&render_case_block(case));
        outcome.cases_added.push(case.label.clone());
    }

    if !tool_text.is_empty() {
        match insert_before_tool(&outcome.text, &patch.anchor_tool, &tool_text) {
            Ok(patched) => outcome.text = patched,
            Err(e) => {
                tracing::warn!(error = %e, "Tool anchor missing, tools not inserted");
                outcome.missing_anchors.push(tool_anchor(&patch.anchor_tool));
                outcome.tools_added.clear();
            }
        }
    }

    if !case_text.is_empty() {
        match insert_before_case(&outcome.text, &patch.anchor_tool, &case_text) {
            Ok(patched) => outcome.text = patched,
            Err(e) => {
                tracing::warn!(error = %e, "Case anchor missing, cases not inserted");
                outcome.missing_anchors.push(case_anchor(&patch.anchor_tool));
                outcome.cases_added.clear();
            }
        }
    }

    tracing::info!(
        tools = outcome.tools_added.len(),
        cases = outcome.cases_added.len(),
        skipped = outcome.already_present.len(),
        "Tool patch prepared"
    );

    outcome
}

/// Escape `raw` for a TypeScript string literal delimited by `quote`.
fn escape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Registry entry for `tool`, two-space indented, with a trailing comma.
pub fn render_tool_block(tool: &ToolDeclaration) -> String {
    let birth: Vec<String> = birth_data_parameters().into_iter().map(|p| p.name).collect();
    let mut fields = Vec::new();
    if tool.inherits_birth_data {
        fields.push(format!("        {}", BIRTH_DATA_SHORTHAND));
    }
    for param in &tool.parameters {
        if tool.inherits_birth_data && birth.contains(&param.name) {
            continue;
        }
        fields.push(format!(
            "        {}: {{ type: \"{}\", description: \"{}\" }}",
            param.name,
            param.param_type,
            escape(&param.description, '"')
        ));
    }

    // Parameter order first, then any required names not listed as parameters.
    let mut required: Vec<&str> = tool
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| tool.required.contains(*name))
        .collect();
    for name in &tool.required {
        if !required.contains(&name.as_str()) {
            required.push(name);
        }
    }
    let required = required
        .iter()
        .map(|name| format!("\"{}\"", escape(name, '"')))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        concat!(
            "  {{\n",
            "    name: \"{name}\",\n",
            "    description: \"{description}\",\n",
            "    inputSchema: {{\n",
            "      type: \"object\",\n",
            "      properties: {{\n{fields}\n      }},\n",
            "      required: [{required}]\n",
            "    }}\n",
            "  }},\n",
        ),
        name = escape(&tool.name, '"'),
        description = escape(&tool.description, '"'),
        fields = fields.join(",\n"),
        required = required,
    )
}

/// Dispatch case assigning `endpoint`, in the switch's six-space indent.
pub fn render_case_block(case: &CaseSpec) -> String {
    let request = match case.method {
        HttpMethod::Get => "        method = 'GET';\n",
        HttpMethod::Post => "        requestData = args;\n",
    };
    format!(
        "      case \"{label}\":\n        endpoint = '{endpoint}';\n{request}        break;\n\n",
        label = escape(&case.label, '"'),
        endpoint = escape(&case.endpoint, '\''),
        request = request,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::types::{ParamType, ParameterSpec};

    const SOURCE: &str = r#"const tools = [
  {
    name: "calculate_natal_chart",
    description: "Natal chart",
    inputSchema: {
      type: "object",
      properties: {
        ...birthDataSchema
      },
      required: ["name", "datetime"]
    }
  },
  {
    name: "check_api_health",
    description: "Health check",
    inputSchema: {
      type: "object",
      properties: {},
      required: []
    }
  }
];

switch (name) {
      case "calculate_natal_chart":
        endpoint = '/api/natal/chart';
        requestData = args;
        break;

      case "check_api_health":
        endpoint = '/health';
        method = 'GET';
        break;
}
"#;

    fn sample_patch() -> ToolPatch {
        ToolPatch {
            anchor_tool: "check_api_health".to_string(),
            tools: vec![ToolDeclaration {
                name: "bazi_useful_god".to_string(),
                description: "Useful \"god\" element".to_string(),
                parameters: birth_data_parameters()
                    .into_iter()
                    .chain(std::iter::once(ParameterSpec::new(
                        "gender",
                        ParamType::String,
                        "male or female",
                    )))
                    .collect(),
                required: ["name", "gender"].iter().map(|s| s.to_string()).collect(),
                inherits_birth_data: true,
            }],
            cases: vec![CaseSpec {
                label: "bazi_useful_god".to_string(),
                endpoint: "/api/bazi/useful-god".to_string(),
                method: HttpMethod::Post,
            }],
        }
    }

    #[test]
    fn test_insert_before_anchor_line() {
        let out = insert_before_anchor("a\n  b\nc", "b", "X\n").unwrap();
        assert_eq!(out, "a\nX\n  b\nc");
    }

    #[test]
    fn test_insert_before_missing_anchor() {
        let err = insert_before_anchor("abc", "zzz", "X").unwrap_err();
        assert!(matches!(err, AppError::AnchorNotFound(_)));
    }

    #[test]
    fn test_patched_source_still_extracts() {
        let outcome = add_tool_blocks(SOURCE, &sample_patch());
        assert!(outcome.changed());
        assert!(outcome.missing_anchors.is_empty());

        let registry = extract_registry(&outcome.text).unwrap();
        assert_eq!(
            registry.names,
            vec!["calculate_natal_chart", "bazi_useful_god", "check_api_health"]
        );
        let added = &registry.tools[1];
        assert!(added.inherits_birth_data);
        assert_eq!(added.parameters.len(), 7);
        assert_eq!(added.description, r#"Useful "god" element"#);
        let expected: BTreeSet<String> = ["gender", "name"].iter().map(|s| s.to_string()).collect();
        assert_eq!(added.required, expected);

        let dispatch = extract_dispatch(&outcome.text).unwrap();
        assert_eq!(
            dispatch.case_labels,
            vec!["calculate_natal_chart", "bazi_useful_god", "check_api_health"]
        );
        assert_eq!(dispatch.cases[1].endpoint_path, "/api/bazi/useful-god");
    }

    #[test]
    fn test_patch_is_idempotent() {
        let once = add_tool_blocks(SOURCE, &sample_patch());
        let twice = add_tool_blocks(&once.text, &sample_patch());
        assert!(!twice.changed());
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.already_present.len(), 2);
    }

    #[test]
    fn test_missing_anchor_leaves_text_unchanged() {
        let mut patch = sample_patch();
        patch.anchor_tool = "does_not_exist".to_string();
        let outcome = add_tool_blocks(SOURCE, &patch);
        assert_eq!(outcome.text, SOURCE);
        assert!(!outcome.changed());
        assert_eq!(outcome.missing_anchors.len(), 2);
    }

    #[test]
    fn test_render_get_case() {
        let block = render_case_block(&CaseSpec {
            label: "get_bazi_info".to_string(),
            endpoint: "/api/bazi/info".to_string(),
            method: HttpMethod::Get,
        });
        assert!(block.contains("method = 'GET';"));
        assert!(block.starts_with("      case \"get_bazi_info\":\n"));
    }

    #[test]
    fn test_multiline_description_stays_on_one_line() {
        let tool = ToolDeclaration {
            name: "bazi_notes".to_string(),
            description: "line one\nline two\tend".to_string(),
            parameters: vec![ParameterSpec::new("note", ParamType::String, "a\nb")],
            required: BTreeSet::new(),
            inherits_birth_data: false,
        };
        let block = render_tool_block(&tool);
        assert!(block.contains(r#"description: "line one\nline two\tend","#));
        assert!(block.contains(r#"description: "a\nb" }"#));

        let mut patch = sample_patch();
        patch.tools = vec![tool.clone()];
        patch.cases.clear();
        let outcome = add_tool_blocks(SOURCE, &patch);
        let registry = extract_registry(&outcome.text).unwrap();
        let parsed = registry.tools.iter().find(|t| t.name == "bazi_notes").unwrap();
        assert_eq!(parsed.description, tool.description);
        assert_eq!(parsed.parameters[0].description, "a\nb");
    }

    #[test]
    fn test_case_endpoint_quote_is_escaped() {
        let block = render_case_block(&CaseSpec {
            label: "odd".to_string(),
            endpoint: "/api/it's".to_string(),
            method: HttpMethod::Post,
        });
        assert!(block.contains(r#"endpoint = '/api/it\'s';"#));
    }

    #[test]
    fn test_compact_layout_counts_as_present() {
        let source = r#"const tools = [
  {name:"bazi_useful_god",description:"x",inputSchema:{}},
  {
    name:"check_api_health",
    description: "Health",
    inputSchema: {}
  }
];

switch (name) {
      case"bazi_useful_god":
        endpoint = '/api/bazi/useful-god';
        break;
      case  "check_api_health":
        endpoint = '/health';
        break;
}
"#;

        let outcome = add_tool_blocks(source, &sample_patch());
        assert!(!outcome.changed());
        assert_eq!(outcome.text, source);
        assert_eq!(outcome.already_present.len(), 2);
        assert_eq!(
            extract_registry(&outcome.text).unwrap().names,
            vec!["bazi_useful_god", "check_api_health"]
        );
    }

    #[test]
    fn test_compact_anchor_is_found() {
        let source = SOURCE
            .replace("name: \"check_api_health\"", "name:\"check_api_health\"")
            .replace("case \"check_api_health\":", "case\"check_api_health\":");
        let outcome = add_tool_blocks(&source, &sample_patch());
        assert!(outcome.missing_anchors.is_empty());
        assert_eq!(outcome.tools_added, vec!["bazi_useful_god"]);
        assert_eq!(
            extract_dispatch(&outcome.text).unwrap().case_labels,
            vec!["calculate_natal_chart", "bazi_useful_god", "check_api_health"]
        );
    }

    #[test]
    fn test_repeated_tool_in_one_patch_is_added_once() {
        let mut patch = sample_patch();
        patch.tools.push(patch.tools[0].clone());
        let outcome = add_tool_blocks(SOURCE, &patch);
        assert_eq!(outcome.tools_added, vec!["bazi_useful_god"]);
        assert_eq!(outcome.already_present, vec!["bazi_useful_god"]);
    }
}
