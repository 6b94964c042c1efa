//! Probe targets and the payloads sent to them.

use crate::extract::dispatch::api_module;
use crate::extract::types::HttpMethod;
use serde_json::{json, Map, Value};

/// One endpoint to probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub category: String,
    pub tool: String,
    pub path: String,
    pub method: HttpMethod,
    /// JSON body for POST probes; `None` for GET.
    pub payload: Option<Value>,
}

/// Tool -> API path catalog probed by default, grouped by category.
pub const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "Core Astrology",
        &[
            ("calculate_natal_chart", "/api/natal/chart"),
            ("calculate_vedic_chart", "/api/vedic/chart"),
            ("calculate_human_design", "/api/human-design/chart"),
            ("calculate_numerology", "/api/numerology/analyze"),
            ("calculate_matrix_of_destiny", "/api/matrix-destiny/analyze"),
            ("calculate_transits", "/api/transits/calculate"),
        ],
    ),
    (
        "Progressions",
        &[
            ("calculate_secondary_progressions", "/api/progressions/secondary"),
            ("calculate_solar_arc_progressions", "/api/progressions/solar-arc"),
            ("calculate_tertiary_progressions", "/api/progressions/tertiary"),
            ("compare_progressions", "/api/progressions/compare"),
            ("create_progressions_timeline", "/api/progressions/timeline"),
            ("analyze_progressions_aspects", "/api/progressions/aspects"),
            ("get_progressions_info", "/api/progressions/info"),
        ],
    ),
    (
        "BaZi System",
        &[
            ("calculate_bazi_chart", "/api/bazi/chart"),
            ("analyze_bazi_personality", "/api/bazi/personality"),
            ("calculate_bazi_compatibility", "/api/bazi/compatibility"),
            ("get_bazi_info", "/api/bazi/info"),
            ("analyze_bazi_twelve_palaces", "/api/bazi/twelve-palaces"),
            ("analyze_bazi_life_focus", "/api/bazi/life-focus"),
            ("analyze_bazi_symbolic_stars", "/api/bazi/symbolic-stars"),
            ("calculate_bazi_luck_pillars", "/api/bazi/luck-pillars"),
            ("calculate_bazi_annual_forecast", "/api/bazi/annual-forecast"),
            ("get_bazi_complete_analysis", "/api/bazi/complete-analysis"),
            ("get_bazi_career_guidance", "/api/bazi/career-guidance"),
            ("get_bazi_relationship_guidance", "/api/bazi/relationship-guidance"),
            ("get_bazi_health_insights", "/api/bazi/health-insights"),
            ("analyze_bazi_nayin", "/api/bazi/nayin-analysis"),
            ("analyze_bazi_useful_god", "/api/bazi/useful-god"),
        ],
    ),
];

/// Shape of the request body a probe sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// GET with no body.
    Info,
    /// Birth data renamed to `birth_*` plus `target_date`.
    Transits,
    /// Two people flattened into `person1_*` / `person2_*` fields.
    BaziCompatibility,
    /// BaZi birth data plus `year`.
    BaziAnnual,
    /// Birth data plus `gender`.
    Bazi,
    /// Birth data plus `progression_date`.
    Progression,
    /// Plain birth data.
    Birth,
}

/// Ordered `(all fragments must appear, kind)` rules; first match wins.
const PAYLOAD_RULES: &[(&[&str], PayloadKind)] = &[
    (&["info"], PayloadKind::Info),
    (&["transits"], PayloadKind::Transits),
    (&["bazi", "compatibility"], PayloadKind::BaziCompatibility),
    (&["bazi", "annual"], PayloadKind::BaziAnnual),
    (&["bazi"], PayloadKind::Bazi),
    (&["progression"], PayloadKind::Progression),
];

/// Pick the payload for a tool name or path.
pub fn payload_kind(key: &str) -> PayloadKind {
    PAYLOAD_RULES
        .iter()
        .find(|(fragments, _)| fragments.iter().all(|f| key.contains(f)))
        .map(|(_, kind)| *kind)
        .unwrap_or(PayloadKind::Birth)
}

fn birth_data() -> Map<String, Value> {
    let value = json!({
        "name": "Test Analysis",
        "datetime": "1992-01-21T09:50:00",
        "latitude": 52.9651,
        "longitude": 36.0785,
        "location": "Orel, Russia",
        "timezone": "Europe/Moscow"
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn with_fields(mut base: Map<String, Value>, extra: Value) -> Value {
    if let Value::Object(extra) = extra {
        base.extend(extra);
    }
    Value::Object(base)
}

/// Request body for a payload kind; `None` for GET probes.
pub fn build_payload(kind: PayloadKind) -> Option<Value> {
    let person = birth_data();
    let payload = match kind {
        PayloadKind::Info => return None,
        PayloadKind::Transits => json!({
            "birth_datetime": person["datetime"],
            "birth_latitude": person["latitude"],
            "birth_longitude": person["longitude"],
            "birth_location": person["location"],
            "birth_timezone": person["timezone"],
            "target_date": "2025-08-17"
        }),
        PayloadKind::BaziCompatibility => json!({
            "person1_name": "Person 1",
            "person1_datetime": person["datetime"],
            "person1_latitude": person["latitude"],
            "person1_longitude": person["longitude"],
            "person1_location": person["location"],
            "person1_timezone": person["timezone"],
            "person1_gender": "male",
            "person2_name": "Person 2",
            "person2_datetime": "1995-06-15T14:30:00",
            "person2_latitude": 55.7558,
            "person2_longitude": 37.6176,
            "person2_location": "Moscow, Russia",
            "person2_timezone": "Europe/Moscow",
            "person2_gender": "female"
        }),
        PayloadKind::BaziAnnual => with_fields(person, json!({ "gender": "male", "year": 2025 })),
        PayloadKind::Bazi => with_fields(person, json!({ "gender": "male" })),
        PayloadKind::Progression => {
            with_fields(person, json!({ "progression_date": "2025-08-17" }))
        }
        PayloadKind::Birth => Value::Object(person),
    };
    Some(payload)
}

fn target(category: &str, tool: &str, path: &str, key: &str) -> ProbeTarget {
    let payload = build_payload(payload_kind(key));
    ProbeTarget {
        category: category.to_string(),
        tool: tool.to_string(),
        path: path.to_string(),
        method: if payload.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        },
        payload,
    }
}

/// The built-in catalog, in category order. Payloads are chosen by tool name.
pub fn default_targets() -> Vec<ProbeTarget> {
    CATALOG
        .iter()
        .flat_map(|(category, tools)| {
            tools
                .iter()
                .map(move |(tool, path)| target(category, tool, path, tool))
        })
        .collect()
}

/// Targets for paths scraped from source. Payloads are chosen by path and
/// the category is the path's API module.
pub fn targets_from_paths(paths: &[String]) -> Vec<ProbeTarget> {
    paths
        .iter()
        .map(|path| target(api_module(path), path, path, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        let targets = default_targets();
        assert_eq!(targets.len(), 28);
        assert_eq!(targets.iter().filter(|t| t.category == "BaZi System").count(), 15);
        assert_eq!(targets.iter().filter(|t| t.category == "Progressions").count(), 7);
    }

    #[test]
    fn test_payload_rule_order() {
        assert_eq!(payload_kind("get_bazi_info"), PayloadKind::Info);
        assert_eq!(payload_kind("calculate_transits"), PayloadKind::Transits);
        assert_eq!(payload_kind("calculate_bazi_compatibility"), PayloadKind::BaziCompatibility);
        assert_eq!(payload_kind("calculate_bazi_annual_forecast"), PayloadKind::BaziAnnual);
        assert_eq!(payload_kind("analyze_bazi_nayin"), PayloadKind::Bazi);
        assert_eq!(payload_kind("compare_progressions"), PayloadKind::Progression);
        assert_eq!(payload_kind("calculate_natal_chart"), PayloadKind::Birth);
    }

    #[test]
    fn test_info_targets_are_get_without_body() {
        let targets = default_targets();
        let info = targets.iter().find(|t| t.tool == "get_bazi_info").unwrap();
        assert_eq!(info.method, HttpMethod::Get);
        assert!(info.payload.is_none());
    }

    #[test]
    fn test_bazi_payloads_carry_gender_and_year() {
        let annual = build_payload(PayloadKind::BaziAnnual).unwrap();
        assert_eq!(annual["gender"], "male");
        assert_eq!(annual["year"], 2025);
        assert_eq!(annual["timezone"], "Europe/Moscow");

        let compat = build_payload(PayloadKind::BaziCompatibility).unwrap();
        assert_eq!(compat["person2_gender"], "female");
        assert!(compat.get("datetime").is_none());
    }

    #[test]
    fn test_transit_payload_uses_birth_prefix() {
        let transits = build_payload(PayloadKind::Transits).unwrap();
        assert_eq!(transits["birth_datetime"], "1992-01-21T09:50:00");
        assert!(transits.get("datetime").is_none());
        assert_eq!(transits["target_date"], "2025-08-17");
    }

    #[test]
    fn test_targets_from_paths() {
        let targets = targets_from_paths(&[
            "/api/bazi/info".to_string(),
            "/api/progressions/secondary".to_string(),
        ]);
        assert_eq!(targets[0].category, "bazi");
        assert_eq!(targets[0].method, HttpMethod::Get);
        assert_eq!(targets[1].payload.as_ref().unwrap()["progression_date"], "2025-08-17");
    }
}
