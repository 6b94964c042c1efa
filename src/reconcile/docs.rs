//! The hand-maintained API documentation table and its comparison against
//! the endpoints the dispatch switch routes to.

use crate::extract::dispatch::api_module;
use crate::extract::types::HttpMethod::{Get, Post};
use crate::extract::types::{DispatchCase, HttpMethod};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentedEndpoint {
    pub path: String,
    pub http_method: HttpMethod,
    pub description: String,
}

impl DocumentedEndpoint {
    pub fn new(path: &str, http_method: HttpMethod, description: &str) -> Self {
        Self {
            path: path.to_string(),
            http_method,
            description: description.to_string(),
        }
    }
}

const DOCUMENTED: &[(&str, HttpMethod, &str)] = &[
    ("/api/natal/chart", Post, "Calculate natal chart"),
    ("/api/natal/info", Get, "Natal astrology module info"),
    ("/api/jyotish/calculate", Post, "Calculate Vedic chart"),
    ("/api/jyotish/info", Get, "Vedic astrology module info"),
    ("/api/solar/return", Post, "Calculate solar return"),
    ("/api/solar/info", Get, "Solar return module info"),
    ("/api/solar/lunar-return", Post, "Calculate lunar return"),
    ("/api/progressions/secondary", Post, "Calculate secondary progressions"),
    ("/api/progressions/info", Get, "Progressions module info"),
    ("/api/progressions/solar-arc", Post, "Calculate solar arc progressions"),
    ("/api/progressions/tertiary", Post, "Calculate tertiary progressions"),
    ("/api/progressions/compare", Post, "Compare progression methods"),
    ("/api/progressions/timeline", Post, "Progressions timeline"),
    ("/api/progressions/aspects", Post, "Progressed aspects"),
    ("/api/directions/calculate", Post, "Calculate solar arc directions"),
    ("/api/directions/info", Get, "Directions module info"),
    ("/api/relationship/synastry", Post, "Synastry analysis"),
    ("/api/relationship/composite", Post, "Composite chart"),
    ("/api/relationship/info", Get, "Relationship module info"),
    ("/api/astrocartography/world-map", Post, "Astrocartography world map"),
    ("/api/astrocartography/best-places", Post, "Find best places"),
    ("/api/astrocartography/info", Get, "Astrocartography module info"),
    ("/api/electional/find-best-times", Post, "Find favourable dates"),
    ("/api/electional/info", Get, "Electional astrology module info"),
    ("/api/horary/analyze-question", Post, "Analyze horary question"),
    ("/api/horary/info", Get, "Horary astrology module info"),
    ("/api/numerology/calculate", Post, "Numerology analysis"),
    ("/api/numerology/info", Get, "Numerology module info"),
    ("/api/matrix/calculate", Post, "Calculate Matrix of Destiny"),
    ("/api/matrix/info", Get, "Matrix of Destiny module info"),
    ("/api/human-design/calculate", Post, "Calculate Human Design"),
    ("/api/human-design/info", Get, "Human Design module info"),
    ("/api/transits/calculate", Post, "Transits for a given date"),
    ("/api/transits/period", Post, "Transits within a period"),
    ("/api/transits/info", Get, "Transits module info"),
    ("/api/bazi/chart", Post, "Create Bazi chart"),
    ("/api/bazi/personality", Post, "Analyze personality"),
    ("/api/bazi/compatibility", Post, "Analyze compatibility"),
    ("/api/bazi/info", Get, "Get Bazi info"),
    ("/api/bazi/twelve-palaces", Post, "Analyze twelve palaces"),
    ("/api/bazi/life-focus", Post, "Get life focus analysis"),
    ("/api/bazi/symbolic-stars", Post, "Analyze symbolic stars"),
    ("/api/bazi/luck-pillars", Post, "Analyze luck pillars"),
    ("/api/bazi/annual-forecast", Post, "Get annual forecast"),
    ("/api/bazi/career-guidance", Post, "Get career guidance"),
    ("/api/bazi/relationship-guidance", Post, "Get relationship guidance"),
    ("/api/bazi/health-insights", Post, "Get health insights"),
    ("/api/bazi/nayin-analysis", Post, "Get Nayin analysis"),
    ("/api/bazi/useful-god", Post, "Analyze useful god"),
];

/// The documented endpoint catalog, in documentation order.
pub fn documented_endpoints() -> Vec<DocumentedEndpoint> {
    DOCUMENTED
        .iter()
        .map(|(path, method, description)| DocumentedEndpoint::new(path, *method, description))
        .collect()
}

/// How well a module's documented endpoints are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMark {
    Full,
    Partial,
    Poor,
}

impl CoverageMark {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            Self::Full
        } else if percent >= 80.0 {
            Self::Partial
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocsCoverage {
    pub module: String,
    pub total: usize,
    pub covered: usize,
    pub percent: f64,
    pub mark: CoverageMark,
}

/// Documentation versus dispatch, keyed by endpoint path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocsComparison {
    /// `(path, tool)` for paths both documented and routed.
    pub in_both: Vec<(String, String)>,
    /// `(path, description)` for documented paths nothing routes to.
    pub docs_only: Vec<(String, String)>,
    /// `(path, tool)` for routed paths missing from the documentation.
    pub dispatch_only: Vec<(String, String)>,
    /// `|in_both| / (|in_both| + |docs_only|) * 100`, 0 when nothing is documented.
    pub coverage_percent: f64,
    pub modules: Vec<DocsCoverage>,
}

/// Compare documented paths with the paths dispatch cases assign.
///
/// Paths are opaque strings: no trailing-slash, case or query
/// normalisation. When several cases route to one path, the last case
/// names the tool.
pub fn compare_docs(docs: &[DocumentedEndpoint], cases: &[DispatchCase]) -> DocsComparison {
    let routed: BTreeMap<&str, &str> = cases
        .iter()
        .map(|c| (c.endpoint_path.as_str(), c.case_label.as_str()))
        .collect();
    let documented: BTreeMap<&str, &str> = docs
        .iter()
        .map(|d| (d.path.as_str(), d.description.as_str()))
        .collect();

    let mut comparison = DocsComparison::default();
    for (path, description) in &documented {
        match routed.get(path) {
            Some(tool) => comparison.in_both.push((path.to_string(), tool.to_string())),
            None => comparison
                .docs_only
                .push((path.to_string(), description.to_string())),
        }
    }
    for (path, tool) in &routed {
        if !documented.contains_key(path) {
            comparison
                .dispatch_only
                .push((path.to_string(), tool.to_string()));
        }
    }

    comparison.coverage_percent = percent(
        comparison.in_both.len(),
        comparison.in_both.len() + comparison.docs_only.len(),
    );

    let mut per_module: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for path in documented.keys() {
        let entry = per_module.entry(api_module(path)).or_default();
        entry.0 += 1;
        if routed.contains_key(path) {
            entry.1 += 1;
        }
    }
    comparison.modules = per_module
        .into_iter()
        .map(|(module, (total, covered))| {
            let pct = percent(covered, total);
            DocsCoverage {
                module: module.to_string(),
                total,
                covered,
                percent: pct,
                mark: CoverageMark::from_percent(pct),
            }
        })
        .collect();

    tracing::debug!(
        in_both = comparison.in_both.len(),
        docs_only = comparison.docs_only.len(),
        dispatch_only = comparison.dispatch_only.len(),
        "Documentation comparison complete"
    );

    comparison
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
