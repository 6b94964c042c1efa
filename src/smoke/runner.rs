//! Sequential probe runner and result summary.

use crate::extract::types::HttpMethod;
use crate::reconcile::docs::percent;
use crate::smoke::catalog::ProbeTarget;
use crate::smoke::client::HttpProbe;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Maximum error detail kept from a non-JSON error body.
const MAX_ERROR_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success,
    /// The server answered with a non-2xx status.
    HttpFailure,
    /// No HTTP response: connection error or timeout.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub category: String,
    pub tool: String,
    pub endpoint: String,
    pub method: HttpMethod,
    /// HTTP status, or 0 when no response arrived.
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
    pub body_len: usize,
    pub outcome: ProbeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == ProbeOutcome::Success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub succeeded: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate: f64,
    /// Failure count per status code; 0 is a transport error.
    pub failures_by_status: BTreeMap<u16, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyStats>,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokeReport {
    pub base_url: String,
    pub results: Vec<ProbeResult>,
    pub summary: SmokeSummary,
}

/// Probes targets one at a time with a fixed pause between requests.
///
/// Failures are recorded and the batch always runs to completion; nothing
/// is retried.
pub struct SmokeRunner<'a, P: HttpProbe> {
    probe: &'a P,
    base_url: String,
    delay: Duration,
}

impl<'a, P: HttpProbe> SmokeRunner<'a, P> {
    pub fn new(probe: &'a P, base_url: &str, delay: Duration) -> Self {
        Self {
            probe,
            base_url: base_url.trim_end_matches('/').to_string(),
            delay,
        }
    }

    pub fn run(&self, targets: &[ProbeTarget]) -> SmokeReport {
        tracing::info!(
            targets = targets.len(),
            base_url = %self.base_url,
            "Starting smoke test"
        );

        let mut results = Vec::with_capacity(targets.len());
        for (idx, target) in targets.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            let result = self.probe_one(target);
            tracing::info!(
                tool = %result.tool,
                status = result.status_code,
                outcome = ?result.outcome,
                "Probe finished"
            );
            results.push(result);
        }

        let summary = summarize(&results);
        tracing::info!(
            succeeded = summary.succeeded,
            total = summary.total,
            "Smoke test complete"
        );

        SmokeReport {
            base_url: self.base_url.clone(),
            results,
            summary,
        }
    }

    fn probe_one(&self, target: &ProbeTarget) -> ProbeResult {
        let url = format!("{}{}", self.base_url, target.path);
        let start = Instant::now();
        let response = self.probe.send(target.method, &url, target.payload.as_ref());
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut result = ProbeResult {
            category: target.category.clone(),
            tool: target.tool.clone(),
            endpoint: target.path.clone(),
            method: target.method,
            status_code: 0,
            elapsed_ms: None,
            body_len: 0,
            outcome: ProbeOutcome::Transport,
            error: None,
        };

        match response {
            Ok(response) => {
                result.status_code = response.status;
                result.elapsed_ms = Some(elapsed_ms);
                result.body_len = response.body.len();
                if (200..300).contains(&response.status) {
                    result.outcome = ProbeOutcome::Success;
                } else {
                    result.outcome = ProbeOutcome::HttpFailure;
                    result.error = Some(error_detail(&response.body));
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Probe request failed");
                result.error = Some(e.to_string());
            }
        }

        result
    }
}

/// Error text from a failed response: JSON `detail` when present, else a
/// prefix of the raw body.
pub fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return match json.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => json.to_string(),
        };
    }
    if body.is_empty() {
        return "Unknown error".to_string();
    }
    body.chars().take(MAX_ERROR_LENGTH).collect()
}

pub fn summarize(results: &[ProbeResult]) -> SmokeSummary {
    let succeeded = results.iter().filter(|r| r.succeeded()).count();

    let mut failures_by_status = BTreeMap::new();
    for result in results.iter().filter(|r| !r.succeeded()) {
        *failures_by_status.entry(result.status_code).or_insert(0) += 1;
    }

    let times: Vec<f64> = results
        .iter()
        .filter(|r| r.succeeded())
        .filter_map(|r| r.elapsed_ms)
        .collect();
    let latency = if times.is_empty() {
        None
    } else {
        Some(LatencyStats {
            avg_ms: times.iter().sum::<f64>() / times.len() as f64,
            min_ms: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    };

    let mut categories: Vec<CategorySummary> = Vec::new();
    for result in results {
        let idx = match categories.iter().position(|c| c.category == result.category) {
            Some(idx) => idx,
            None => {
                categories.push(CategorySummary {
                    category: result.category.clone(),
                    succeeded: 0,
                    total: 0,
                });
                categories.len() - 1
            }
        };
        categories[idx].total += 1;
        if result.succeeded() {
            categories[idx].succeeded += 1;
        }
    }

    SmokeSummary {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        success_rate: percent(succeeded, results.len()),
        failures_by_status,
        latency,
        categories,
    }
}

/// Short explanation of a failure status code.
pub fn status_label(code: u16) -> &'static str {
    match code {
        0 => "connection error",
        401 => "unauthorized",
        404 => "not found (not implemented)",
        422 => "validation error",
        500 => "server error",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::smoke::catalog::default_targets;
    use crate::smoke::client::ProbeResponse;
    use std::cell::RefCell;

    /// Answers from a fixed script keyed by URL suffix and records calls.
    struct ScriptedProbe {
        calls: RefCell<Vec<(HttpMethod, String, bool)>>,
    }

    impl ScriptedProbe {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpProbe for ScriptedProbe {
        fn send(
            &self,
            method: HttpMethod,
            url: &str,
            body: Option<&Value>,
        ) -> Result<ProbeResponse> {
            self.calls
                .borrow_mut()
                .push((method, url.to_string(), body.is_some()));
            if url.ends_with("/api/bazi/complete-analysis") {
                return Ok(ProbeResponse {
                    status: 404,
                    body: r#"{"detail":"Not Found"}"#.to_string(),
                });
            }
            if url.ends_with("/api/vedic/chart") {
                return Err(AppError::Http("timed out".to_string()));
            }
            if url.ends_with("/api/matrix-destiny/analyze") {
                return Ok(ProbeResponse {
                    status: 500,
                    body: "Internal Server Error".to_string(),
                });
            }
            Ok(ProbeResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let probe = ScriptedProbe::new();
        let runner = SmokeRunner::new(&probe, "https://example.test/", Duration::ZERO);
        let targets = default_targets();

        let report = runner.run(&targets);

        assert_eq!(report.results.len(), targets.len());
        assert_eq!(probe.calls.borrow().len(), targets.len());
        assert_eq!(report.summary.failed, 3);
        assert_eq!(report.summary.succeeded, targets.len() - 3);
        assert_eq!(report.summary.failures_by_status.get(&404), Some(&1));
        assert_eq!(report.summary.failures_by_status.get(&500), Some(&1));
        assert_eq!(report.summary.failures_by_status.get(&0), Some(&1));
    }

    #[test]
    fn test_urls_methods_and_bodies() {
        let probe = ScriptedProbe::new();
        let runner = SmokeRunner::new(&probe, "https://example.test/", Duration::ZERO);
        runner.run(&default_targets());

        let calls = probe.calls.borrow();
        assert_eq!(calls[0].1, "https://example.test/api/natal/chart");
        let info = calls
            .iter()
            .find(|(_, url, _)| url.ends_with("/api/bazi/info"))
            .unwrap();
        assert_eq!(info.0, HttpMethod::Get);
        assert!(!info.2);
    }

    #[test]
    fn test_failure_details() {
        let probe = ScriptedProbe::new();
        let runner = SmokeRunner::new(&probe, "https://example.test", Duration::ZERO);
        let report = runner.run(&default_targets());

        let missing = report
            .results
            .iter()
            .find(|r| r.tool == "get_bazi_complete_analysis")
            .unwrap();
        assert_eq!(missing.outcome, ProbeOutcome::HttpFailure);
        assert_eq!(missing.error.as_deref(), Some("Not Found"));

        let timeout = report
            .results
            .iter()
            .find(|r| r.tool == "calculate_vedic_chart")
            .unwrap();
        assert_eq!(timeout.outcome, ProbeOutcome::Transport);
        assert_eq!(timeout.status_code, 0);
        assert!(timeout.elapsed_ms.is_none());
    }

    #[test]
    fn test_category_summaries_keep_catalog_order() {
        let probe = ScriptedProbe::new();
        let runner = SmokeRunner::new(&probe, "https://example.test", Duration::ZERO);
        let summary = runner.run(&default_targets()).summary;

        let names: Vec<&str> = summary.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Core Astrology", "Progressions", "BaZi System"]);
        assert_eq!(summary.categories[0].succeeded, 4);
        assert_eq!(summary.categories[2].succeeded, 14);
        assert!(summary.latency.is_some());
    }

    #[test]
    fn test_error_detail_fallbacks() {
        assert_eq!(error_detail(r#"{"detail":"bad input"}"#), "bad input");
        assert_eq!(error_detail(r#"{"detail":[1,2]}"#), "[1,2]");
        assert_eq!(error_detail(r#"{"message":"x"}"#), r#"{"message":"x"}"#);
        assert_eq!(error_detail(""), "Unknown error");
        assert_eq!(error_detail(&"e".repeat(500)).len(), MAX_ERROR_LENGTH);
    }

    #[test]
    fn test_empty_run_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.latency.is_none());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(0), "connection error");
        assert_eq!(status_label(404), "not found (not implemented)");
        assert_eq!(status_label(418), "other");
    }
}
