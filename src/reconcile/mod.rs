//! Reconciliation of declared tools against dispatch cases and documentation.
//!
//! All comparisons are exact, case-sensitive string matches over tool
//! names, case labels and endpoint paths.

pub mod docs;
pub mod grouping;
pub mod report;

pub use docs::{compare_docs, documented_endpoints, percent, DocsComparison, DocumentedEndpoint};
pub use grouping::{group_tools, KeywordBucket, ModuleBucket, DEFAULT_BUCKETS};
pub use report::{EndpointMapping, ReconciliationReport, ReportStatus};

use crate::extract::{extract_dispatch, extract_registry, DispatchTable};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Reconcile declared tool names with a dispatch table, bucketing working
/// tools with [`DEFAULT_BUCKETS`].
pub fn reconcile<S: AsRef<str>>(
    tool_names: &[S],
    dispatch: &DispatchTable,
    docs: Option<&[DocumentedEndpoint]>,
) -> ReconciliationReport {
    reconcile_with_buckets(tool_names, dispatch, docs, DEFAULT_BUCKETS)
}

pub fn reconcile_with_buckets<S: AsRef<str>>(
    tool_names: &[S],
    dispatch: &DispatchTable,
    docs: Option<&[DocumentedEndpoint]>,
    buckets: &[KeywordBucket],
) -> ReconciliationReport {
    let declared: BTreeSet<String> = tool_names.iter().map(|n| n.as_ref().to_string()).collect();
    let labels: BTreeSet<String> = dispatch.case_labels.iter().cloned().collect();

    let working_tools: BTreeSet<String> = declared.intersection(&labels).cloned().collect();
    let tools_without_dispatch: BTreeSet<String> = declared.difference(&labels).cloned().collect();
    let dispatch_without_tool: BTreeSet<String> = labels.difference(&declared).cloned().collect();

    // Declaration order, so buckets read like the source registry.
    let mut seen = BTreeSet::new();
    let working_in_order: Vec<&str> = tool_names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| working_tools.contains(*n) && seen.insert(*n))
        .collect();

    let endpoint_mappings = dispatch
        .cases
        .iter()
        .map(|case| EndpointMapping {
            tool: case.case_label.clone(),
            endpoint: case.endpoint_path.clone(),
            declared: declared.contains(&case.case_label),
        })
        .collect();

    let comparison = docs.map(|docs| compare_docs(docs, &dispatch.cases));
    let (in_both, only_docs, only_dispatch) = match &comparison {
        Some(cmp) => (
            cmp.in_both.iter().map(|(p, _)| p.clone()).collect(),
            cmp.docs_only.iter().map(|(p, _)| p.clone()).collect(),
            cmp.dispatch_only.iter().map(|(p, _)| p.clone()).collect(),
        ),
        None => (BTreeSet::new(), BTreeSet::new(), BTreeSet::new()),
    };

    let report = ReconciliationReport {
        status: ReportStatus::Complete,
        reason: None,
        source_digest: None,
        declared_count: declared.len(),
        case_label_count: dispatch.case_labels.len(),
        endpoint_mapping_count: dispatch.cases.len(),
        coverage_percent: percent(working_tools.len(), declared.len()),
        modules: group_tools(&working_in_order, buckets),
        tools_without_dispatch,
        dispatch_without_tool,
        working_tools,
        endpoint_mappings,
        endpoints_in_both: in_both,
        endpoints_only_in_docs: only_docs,
        endpoints_only_in_dispatch: only_dispatch,
        docs: comparison,
    };

    tracing::info!(
        declared = report.declared_count,
        working = report.working_tools.len(),
        missing = report.tools_without_dispatch.len(),
        orphaned = report.dispatch_without_tool.len(),
        coverage = report.coverage_percent,
        "Reconciliation complete"
    );

    report
}

/// Extract and reconcile in one step.
///
/// When either extractor reports `StructureNotFound` the result is an empty
/// report with `ReportStatus::Degraded`; no partial analysis is attempted.
pub fn reconcile_source(
    source: &str,
    docs: Option<&[DocumentedEndpoint]>,
) -> ReconciliationReport {
    let extracted = extract_registry(source)
        .and_then(|registry| extract_dispatch(source).map(|dispatch| (registry, dispatch)));

    let mut report = match extracted {
        Ok((registry, dispatch)) => reconcile(&registry.names, &dispatch, docs),
        Err(err) => {
            tracing::warn!(error = %err, "Cannot analyze source, returning degraded report");
            ReconciliationReport::degraded(err.to_string())
        }
    };
    report.source_digest = Some(source_digest(source));
    report
}

/// Hex-encoded SHA-256 of the analysed text.
pub fn source_digest(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
