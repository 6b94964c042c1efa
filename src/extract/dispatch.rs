//! Dispatch extraction: reads the `switch (name)` routing table.

use crate::error::{AppError, Result};
use crate::extract::rules::{classify_method, classify_transform, transform_details};
use crate::extract::types::{DispatchCase, DispatchTable};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static CASE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"case\s*"([^"]+)":"#).expect("valid regex"));

static ENDPOINT_ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"endpoint\s*=\s*['"]([^'"]+)['"];"#).expect("valid regex"));

static API_ENDPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"endpoint\s*=\s*['"](/api/[^'"]+)['"]"#).expect("valid regex"));

static SWITCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"switch\s*\(\s*name\s*\)\s*\{").expect("valid regex"));

const DEFAULT_LABEL: &str = "default:";
const BREAK_STMT: &str = "break;";

/// Extract both views of the dispatch table from raw server source.
///
/// `case_labels` holds every `case "<label>":` in order. `cases` holds only
/// the labels whose own body assigns a string literal to `endpoint`; a
/// body ends at the next case label or `default:`.
///
/// # Errors
/// Returns `AppError::StructureNotFound` when the text has no case labels.
pub fn extract_dispatch(source: &str) -> Result<DispatchTable> {
    if !SWITCH_RE.is_match(source) {
        tracing::debug!("No `switch (name)` statement found, scanning the whole text");
    }

    let labels: Vec<(String, usize, usize)> = CASE_LABEL_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].to_string(), whole.start(), whole.end()))
        })
        .collect();

    if labels.is_empty() {
        return Err(AppError::StructureNotFound(
            "dispatch `case \"<tool>\":` labels".to_string(),
        ));
    }

    let mut cases = Vec::new();
    for (idx, (label, _, body_start)) in labels.iter().enumerate() {
        let next_label = labels
            .get(idx + 1)
            .map(|(_, start, _)| *start)
            .unwrap_or(source.len());
        let body = &source[*body_start..next_label];
        let body = match body.find(DEFAULT_LABEL) {
            Some(pos) => &body[..pos],
            None => body,
        };

        let Some(assign) = ENDPOINT_ASSIGN_RE.captures(body) else {
            continue;
        };

        let classified = match body.find(BREAK_STMT) {
            Some(pos) => &body[..pos],
            None => body,
        };

        let transforms_input = classify_transform(classified);
        cases.push(DispatchCase {
            case_label: label.clone(),
            endpoint_path: assign[1].to_string(),
            http_method: classify_method(classified),
            transforms_input,
            transform_details: if transforms_input {
                transform_details(classified)
            } else {
                Vec::new()
            },
        });
    }

    if cases.len() != labels.len() {
        tracing::debug!(
            case_labels = labels.len(),
            endpoint_mappings = cases.len(),
            "Not every case assigns an endpoint inline"
        );
    }

    Ok(DispatchTable {
        case_labels: labels.into_iter().map(|(label, _, _)| label).collect(),
        cases,
    })
}

/// Label -> endpoint path. When a label repeats, the last case wins.
pub fn endpoint_map(cases: &[DispatchCase]) -> BTreeMap<String, String> {
    cases
        .iter()
        .map(|case| (case.case_label.clone(), case.endpoint_path.clone()))
        .collect()
}

/// Sorted, de-duplicated `/api/...` paths assigned to `endpoint` anywhere in the text.
pub fn unique_endpoint_paths(source: &str) -> Vec<String> {
    API_ENDPOINT_RE
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// API module of a path: the segment after `/api/`, or `unknown`.
pub fn api_module(path: &str) -> &str {
    path.split('/').nth(2).filter(|s| !s.is_empty()).unwrap_or("unknown")
}

/// Endpoint mappings grouped by API module, modules and tools sorted.
pub fn group_by_api_module(cases: &[DispatchCase]) -> BTreeMap<String, Vec<(String, String)>> {
    let mut modules: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for case in cases {
        modules
            .entry(api_module(&case.endpoint_path).to_string())
            .or_default()
            .push((case.case_label.clone(), case.endpoint_path.clone()));
    }
    for tools in modules.values_mut() {
        tools.sort();
    }
    modules
}
