//! Text rendering of reports.
//!
//! Every function here only reads its input. Sections with nothing to show
//! are omitted rather than printed empty.

use crate::error::Result;
use crate::extract::dispatch::group_by_api_module;
use crate::extract::types::{DispatchTable, Registry};
use crate::reconcile::docs::{CoverageMark, DocsComparison};
use crate::reconcile::ReconciliationReport;
use crate::smoke::runner::{status_label, SmokeReport};
use serde::Serialize;
use std::collections::BTreeSet;

const RULE_WIDTH: usize = 60;

fn heading(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push("=".repeat(RULE_WIDTH));
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(title.chars().count()));
}

fn push_set(lines: &mut Vec<String>, title: &str, items: &BTreeSet<String>) {
    if items.is_empty() {
        return;
    }
    section(lines, &format!("{} ({})", title, items.len()));
    lines.extend(items.iter().map(|item| format!("  - {}", item)));
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_reconciliation(report: &ReconciliationReport) -> String {
    let mut lines = Vec::new();
    heading(&mut lines, "Tool / dispatch reconciliation");

    if report.is_degraded() {
        lines.push(format!(
            "Cannot analyze source: {}",
            report.reason.as_deref().unwrap_or("required structure not found")
        ));
        return finish(lines);
    }

    lines.push(format!("Declared tools:        {}", report.declared_count));
    lines.push(format!("Case statements:       {}", report.case_label_count));
    lines.push(format!("Endpoint mappings:     {}", report.endpoint_mapping_count));
    lines.push(format!("Working tools:         {}", report.working_tools.len()));
    lines.push(format!("Coverage:              {:.1}%", report.coverage_percent));

    push_set(&mut lines, "Declared without dispatch", &report.tools_without_dispatch);
    push_set(&mut lines, "Dispatch without declaration", &report.dispatch_without_tool);

    let populated: Vec<_> = report.modules.iter().filter(|m| !m.tools.is_empty()).collect();
    if !populated.is_empty() {
        section(&mut lines, "Working tools by module");
        for bucket in populated {
            lines.push(format!("  {} ({})", bucket.name, bucket.tools.len()));
            lines.extend(bucket.tools.iter().map(|tool| format!("    - {}", tool)));
        }
    }

    if let Some(docs) = &report.docs {
        section(&mut lines, "Documentation");
        lines.push(format!("  In both:           {}", report.endpoints_in_both.len()));
        lines.push(format!("  Only in docs:      {}", report.endpoints_only_in_docs.len()));
        lines.push(format!("  Only in dispatch:  {}", report.endpoints_only_in_dispatch.len()));
        lines.push(format!("  Docs coverage:     {:.1}%", docs.coverage_percent));
    }

    if let Some(digest) = &report.source_digest {
        lines.push(String::new());
        lines.push(format!("Source sha256: {}", digest));
    }

    finish(lines)
}

/// Every parsed tool with its parameters and required fields.
pub fn render_tool_listing(registry: &Registry) -> String {
    let mut lines = Vec::new();
    heading(&mut lines, &format!("Declared tools ({})", registry.names.len()));

    for (index, tool) in registry.tools.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {}", index + 1, tool.name));
        if !tool.description.is_empty() {
            lines.push(format!("   {}", tool.description));
        }
        for param in &tool.parameters {
            let marker = if tool.required.contains(&param.name) { "*" } else { " " };
            lines.push(format!(
                "   {} {} ({}): {}",
                marker, param.name, param.param_type, param.description
            ));
        }
        if tool.inherits_birth_data {
            lines.push("   uses shared birth-data fields".to_string());
        }
    }

    // Names the loose scan saw but the full parse could not.
    let parsed: BTreeSet<&str> = registry.tools.iter().map(|t| t.name.as_str()).collect();
    let unparsed: Vec<&str> = registry
        .names
        .iter()
        .map(String::as_str)
        .filter(|name| !parsed.contains(name))
        .collect();
    if !unparsed.is_empty() {
        section(&mut lines, "Names without a parsed schema");
        lines.extend(unparsed.iter().map(|name| format!("  - {}", name)));
    }

    finish(lines)
}

pub fn render_dispatch_listing(table: &DispatchTable) -> String {
    let mut lines = Vec::new();
    heading(&mut lines, "Dispatch cases");
    lines.push(format!("Case statements:    {}", table.case_labels.len()));
    lines.push(format!("Endpoint mappings:  {}", table.cases.len()));

    section(&mut lines, "Mappings");
    for case in &table.cases {
        let transform = if case.transforms_input { "transformed" } else { "verbatim" };
        lines.push(format!(
            "  {:<4} {} -> {} [{}]",
            case.http_method, case.case_label, case.endpoint_path, transform
        ));
        lines.extend(case.transform_details.iter().map(|d| format!("         {}", d)));
    }

    section(&mut lines, "By API module");
    for (module, tools) in group_by_api_module(&table.cases) {
        lines.push(format!("  {} ({})", module, tools.len()));
        lines.extend(tools.iter().map(|(tool, path)| format!("    {} -> {}", tool, path)));
    }

    finish(lines)
}

fn mark_symbol(mark: CoverageMark) -> &'static str {
    match mark {
        CoverageMark::Full => "[full]",
        CoverageMark::Partial => "[partial]",
        CoverageMark::Poor => "[poor]",
    }
}

pub fn render_docs_comparison(comparison: &DocsComparison) -> String {
    let mut lines = Vec::new();
    heading(&mut lines, "Documentation vs dispatch");
    lines.push(format!("In both:           {}", comparison.in_both.len()));
    lines.push(format!("Only in docs:      {}", comparison.docs_only.len()));
    lines.push(format!("Only in dispatch:  {}", comparison.dispatch_only.len()));
    lines.push(format!("Coverage:          {:.1}%", comparison.coverage_percent));

    if !comparison.docs_only.is_empty() {
        section(&mut lines, "Documented but not routed");
        lines.extend(
            comparison
                .docs_only
                .iter()
                .map(|(path, description)| format!("  - {} ({})", path, description)),
        );
    }
    if !comparison.dispatch_only.is_empty() {
        section(&mut lines, "Routed but not documented");
        lines.extend(
            comparison
                .dispatch_only
                .iter()
                .map(|(path, tool)| format!("  - {} ({})", path, tool)),
        );
    }

    if !comparison.modules.is_empty() {
        section(&mut lines, "Coverage by module");
        for module in &comparison.modules {
            lines.push(format!(
                "  {:<10} {:<16} {}/{} ({:.0}%)",
                mark_symbol(module.mark),
                module.module,
                module.covered,
                module.total,
                module.percent
            ));
        }
    }

    finish(lines)
}

pub fn render_smoke_summary(report: &SmokeReport) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();
    heading(&mut lines, &format!("Smoke test against {}", report.base_url));
    lines.push(format!("Total:       {}", summary.total));
    lines.push(format!("Succeeded:   {}", summary.succeeded));
    lines.push(format!("Failed:      {}", summary.failed));
    lines.push(format!("Success:     {:.1}%", summary.success_rate));

    if !summary.categories.is_empty() {
        section(&mut lines, "By category");
        for category in &summary.categories {
            lines.push(format!(
                "  {:<20} {}/{}",
                category.category, category.succeeded, category.total
            ));
        }
    }

    if !summary.failures_by_status.is_empty() {
        section(&mut lines, "Failures by status");
        for (status, count) in &summary.failures_by_status {
            lines.push(format!("  {:>3} {:<28} {}", status, status_label(*status), count));
        }
        for result in report.results.iter().filter(|r| !r.succeeded()) {
            lines.push(format!(
                "    {} {} ({}): {}",
                result.method,
                result.endpoint,
                result.status_code,
                result.error.as_deref().unwrap_or("")
            ));
        }
    }

    if let Some(latency) = &summary.latency {
        section(&mut lines, "Latency (successful requests)");
        lines.push(format!("  avg {:.0} ms", latency.avg_ms));
        lines.push(format!("  min {:.0} ms", latency.min_ms));
        lines.push(format!("  max {:.0} ms", latency.max_ms));
    }

    finish(lines)
}

/// Pretty-printed JSON of any report.
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}
