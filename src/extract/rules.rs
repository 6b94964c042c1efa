//! Ordered heuristic tables used to classify dispatch case bodies.
//!
//! Each table is a list of `(predicate, classification)` pairs evaluated in
//! order; the first matching predicate wins and a table-level default
//! applies when nothing matches.

use crate::extract::types::HttpMethod;

/// A substring predicate over a case body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Contains(&'static str),
    ContainsAny(&'static [&'static str]),
}

impl Predicate {
    pub fn matches(&self, body: &str) -> bool {
        match self {
            Predicate::Contains(needle) => body.contains(needle),
            Predicate::ContainsAny(needles) => needles.iter().any(|n| body.contains(n)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuleTable<T: 'static> {
    pub rules: &'static [(Predicate, T)],
    pub default: T,
}

impl<T: Copy> RuleTable<T> {
    pub fn classify(&self, body: &str) -> T {
        self.rules
            .iter()
            .find(|(predicate, _)| predicate.matches(body))
            .map(|(_, value)| *value)
            .unwrap_or(self.default)
    }
}

pub const METHOD_RULES: RuleTable<HttpMethod> = RuleTable {
    rules: &[(
        Predicate::ContainsAny(&["method = 'GET'", "method = \"GET\""]),
        HttpMethod::Get,
    )],
    default: HttpMethod::Post,
};

/// `true` when the case body builds a fresh payload instead of forwarding `args`.
pub const TRANSFORM_RULES: RuleTable<bool> = RuleTable {
    rules: &[
        (Predicate::Contains("requestData = {"), true),
        (Predicate::Contains("requestData = args"), false),
    ],
    default: false,
};

/// Recognised payload rewrites, reported for bodies that transform input.
pub const TRANSFORM_DETAIL_RULES: &[(Predicate, &str)] = &[
    (Predicate::Contains("birth_datetime"), "datetime -> birth_datetime"),
    (
        Predicate::Contains("person1:"),
        "flat fields -> nested person1/person2 objects",
    ),
];

pub fn classify_method(body: &str) -> HttpMethod {
    METHOD_RULES.classify(body)
}

pub fn classify_transform(body: &str) -> bool {
    TRANSFORM_RULES.classify(body)
}

/// Every detail whose predicate matches, in table order.
pub fn transform_details(body: &str) -> Vec<String> {
    TRANSFORM_DETAIL_RULES
        .iter()
        .filter(|(predicate, _)| predicate.matches(body))
        .map(|(_, detail)| detail.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_marker_single_quotes() {
        assert_eq!(classify_method("method = 'GET';\n"), HttpMethod::Get);
    }

    #[test]
    fn test_get_marker_double_quotes() {
        assert_eq!(classify_method(r#"method = "GET";"#), HttpMethod::Get);
    }

    #[test]
    fn test_method_defaults_to_post() {
        assert_eq!(classify_method("requestData = args;"), HttpMethod::Post);
        assert_eq!(classify_method(""), HttpMethod::Post);
    }

    #[test]
    fn test_transform_first_match_wins() {
        // Both markers present: the payload-construction rule is listed first.
        let body = "requestData = args;\nrequestData = { birth_datetime: args.datetime };";
        assert!(classify_transform(body));
    }

    #[test]
    fn test_verbatim_forwarding_is_not_a_transform() {
        assert!(!classify_transform("requestData = args;"));
        assert!(!classify_transform("const x = 1;"));
    }

    #[test]
    fn test_transform_details_in_table_order() {
        let body = "requestData = { person1: {...}, birth_datetime: args.datetime }";
        assert_eq!(
            transform_details(body),
            vec![
                "datetime -> birth_datetime".to_string(),
                "flat fields -> nested person1/person2 objects".to_string(),
            ]
        );
    }
}
