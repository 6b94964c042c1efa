//! Keyword bucketing of tool names into astrology modules.

use serde::Serialize;

/// Name of the catch-all bucket for tools no keyword matches.
pub const OTHER_BUCKET: &str = "other";

/// A named bucket and the name fragments that select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordBucket {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Buckets in priority order; the first bucket with a matching fragment wins.
pub const DEFAULT_BUCKETS: &[KeywordBucket] = &[
    KeywordBucket {
        name: "natal",
        keywords: &["natal"],
    },
    KeywordBucket {
        name: "jyotish",
        keywords: &["vedic", "jyotish"],
    },
    KeywordBucket {
        name: "human-design",
        keywords: &["human_design"],
    },
    KeywordBucket {
        name: "numerology",
        keywords: &["numerology"],
    },
    KeywordBucket {
        name: "matrix",
        keywords: &["matrix"],
    },
    KeywordBucket {
        name: "transits",
        keywords: &["transit"],
    },
    KeywordBucket {
        name: "progressions",
        keywords: &["progression"],
    },
    KeywordBucket {
        name: "bazi",
        keywords: &["bazi"],
    },
    KeywordBucket {
        name: "solar",
        keywords: &["solar"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleBucket {
    pub name: String,
    pub tools: Vec<String>,
}

/// Partition `names` into `buckets` plus a trailing `other` bucket.
///
/// Every configured bucket is present in the result, in configuration
/// order, even when empty. Tool order inside a bucket follows `names`.
pub fn group_tools<S: AsRef<str>>(names: &[S], buckets: &[KeywordBucket]) -> Vec<ModuleBucket> {
    let mut grouped: Vec<ModuleBucket> = buckets
        .iter()
        .map(|b| ModuleBucket {
            name: b.name.to_string(),
            tools: Vec::new(),
        })
        .chain(std::iter::once(ModuleBucket {
            name: OTHER_BUCKET.to_string(),
            tools: Vec::new(),
        }))
        .collect();

    for name in names {
        let name = name.as_ref();
        let slot = buckets
            .iter()
            .position(|b| b.keywords.iter().any(|k| name.contains(k)))
            .unwrap_or(buckets.len());
        grouped[slot].tools.push(name.to_string());
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATAL_BAZI: &[KeywordBucket] = &[
        KeywordBucket {
            name: "natal",
            keywords: &["natal"],
        },
        KeywordBucket {
            name: "bazi",
            keywords: &["bazi"],
        },
    ];

    #[test]
    fn test_grouping_with_custom_buckets() {
        let grouped = group_tools(&["natal_chart", "bazi_chart", "other_thing"], NATAL_BAZI);
        assert_eq!(
            grouped,
            vec![
                ModuleBucket { name: "natal".into(), tools: vec!["natal_chart".into()] },
                ModuleBucket { name: "bazi".into(), tools: vec!["bazi_chart".into()] },
                ModuleBucket { name: "other".into(), tools: vec!["other_thing".into()] },
            ]
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both fragments; `natal` is listed first.
        let grouped = group_tools(&["bazi_natal_overlay"], NATAL_BAZI);
        assert_eq!(grouped[0].tools, vec!["bazi_natal_overlay"]);
        assert!(grouped[1].tools.is_empty());
    }

    #[test]
    fn test_default_buckets_cover_module_aliases() {
        let names = [
            "calculate_vedic_chart",
            "calculate_human_design",
            "calculate_solar_return",
            "calculate_secondary_progressions",
            "check_api_health",
        ];
        let grouped = group_tools(&names, DEFAULT_BUCKETS);
        let find = |bucket: &str| {
            grouped
                .iter()
                .find(|b| b.name == bucket)
                .map(|b| b.tools.clone())
                .unwrap_or_default()
        };
        assert_eq!(find("jyotish"), vec!["calculate_vedic_chart"]);
        assert_eq!(find("human-design"), vec!["calculate_human_design"]);
        assert_eq!(find("solar"), vec!["calculate_solar_return"]);
        assert_eq!(find("progressions"), vec!["calculate_secondary_progressions"]);
        assert_eq!(find("other"), vec!["check_api_health"]);
        assert_eq!(grouped.len(), DEFAULT_BUCKETS.len() + 1);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let grouped = group_tools(&["NATAL_CHART"], NATAL_BAZI);
        assert_eq!(grouped[2].tools, vec!["NATAL_CHART"]);
    }
}
