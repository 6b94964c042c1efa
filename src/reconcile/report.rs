//! The reconciliation report and its status flag.

use crate::reconcile::docs::DocsComparison;
use crate::reconcile::grouping::ModuleBucket;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Complete,
    /// Required structure was missing from the source; every set is empty.
    Degraded,
}

/// One routed tool with its backend path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointMapping {
    pub tool: String,
    pub endpoint: String,
    /// Whether the label is also a declared tool.
    pub declared: bool,
}

/// Result of comparing declared tools, dispatch cases and documentation.
///
/// Derived per run and never persisted. Sets are ordered so two runs over
/// the same text serialise identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub status: ReportStatus,
    /// Why the report is degraded, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// SHA-256 of the analysed source text, hex encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,

    pub declared_count: usize,
    /// Every `case "<label>":`, duplicates included.
    pub case_label_count: usize,
    /// Cases whose body assigns `endpoint` inline.
    pub endpoint_mapping_count: usize,

    pub tools_without_dispatch: BTreeSet<String>,
    pub dispatch_without_tool: BTreeSet<String>,
    pub working_tools: BTreeSet<String>,
    pub coverage_percent: f64,
    pub modules: Vec<ModuleBucket>,
    pub endpoint_mappings: Vec<EndpointMapping>,

    pub endpoints_in_both: BTreeSet<String>,
    pub endpoints_only_in_docs: BTreeSet<String>,
    pub endpoints_only_in_dispatch: BTreeSet<String>,
    /// Full documentation comparison when documentation was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<DocsComparison>,
}

impl ReconciliationReport {
    /// An empty report flagged as degraded.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Degraded,
            reason: Some(reason.into()),
            source_digest: None,
            declared_count: 0,
            case_label_count: 0,
            endpoint_mapping_count: 0,
            tools_without_dispatch: BTreeSet::new(),
            dispatch_without_tool: BTreeSet::new(),
            working_tools: BTreeSet::new(),
            coverage_percent: 0.0,
            modules: Vec::new(),
            endpoint_mappings: Vec::new(),
            endpoints_in_both: BTreeSet::new(),
            endpoints_only_in_docs: BTreeSet::new(),
            endpoints_only_in_dispatch: BTreeSet::new(),
            docs: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == ReportStatus::Degraded
    }
}
