//! Built-in tool patches.

use crate::extract::registry::birth_data_parameters;
use crate::extract::types::{HttpMethod, ParamType, ParameterSpec, ToolDeclaration};
use crate::patch::source::{CaseSpec, ToolPatch};

/// Tool the extended BaZi set is inserted ahead of.
pub const HEALTH_CHECK_TOOL: &str = "check_api_health";

const EXTENDED_BAZI: &[(&str, &str, &str)] = &[
    (
        "bazi_complete_analysis",
        "/api/bazi/complete-analysis",
        "Complete BaZi analysis covering personality, career, relationships and health",
    ),
    (
        "bazi_career_guidance",
        "/api/bazi/career-guidance",
        "BaZi career guidance: suitable professions, working style, leadership",
    ),
    (
        "bazi_relationship_guidance",
        "/api/bazi/relationship-guidance",
        "BaZi relationship guidance: communication style, compatible partner types",
    ),
    (
        "bazi_health_insights",
        "/api/bazi/health-insights",
        "BaZi health insights: constitution, weak organs, dietary advice",
    ),
    (
        "bazi_nayin_analysis",
        "/api/bazi/nayin-analysis",
        "Na Yin melodic element analysis: spiritual practice and career direction",
    ),
    (
        "bazi_useful_god",
        "/api/bazi/useful-god",
        "Useful God analysis: the balancing element and favourable periods",
    ),
    (
        "bazi_twelve_palaces",
        "/api/bazi/twelve-palaces",
        "Twelve Palaces analysis of every life area",
    ),
    (
        "bazi_life_focus_analysis",
        "/api/bazi/life-focus",
        "Life priorities: strong and weak areas, focus for development",
    ),
    (
        "bazi_symbolic_stars",
        "/api/bazi/symbolic-stars",
        "BaZi symbolic stars: special influences and talents",
    ),
    (
        "bazi_luck_pillars",
        "/api/bazi/luck-pillars",
        "Luck Pillars: life cycles, favourable and unfavourable periods",
    ),
    (
        "bazi_annual_forecast",
        "/api/bazi/annual-forecast",
        "Annual BaZi forecast for the current and following year",
    ),
];

/// The eleven extended BaZi tools with inline birth-data fields.
pub fn extended_bazi() -> ToolPatch {
    let mut tools = Vec::with_capacity(EXTENDED_BAZI.len());
    let mut cases = Vec::with_capacity(EXTENDED_BAZI.len());

    for (name, endpoint, description) in EXTENDED_BAZI {
        let mut parameters = birth_data_parameters();
        let required = parameters.iter().map(|p| p.name.clone()).collect();
        if *name == "bazi_annual_forecast" {
            parameters.push(ParameterSpec::new(
                "year",
                ParamType::Number,
                "Forecast year (optional, defaults to the current year)",
            ));
        }

        tools.push(ToolDeclaration {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            required,
            inherits_birth_data: false,
        });
        cases.push(CaseSpec {
            label: name.to_string(),
            endpoint: endpoint.to_string(),
            method: HttpMethod::Post,
        });
    }

    ToolPatch {
        anchor_tool: HEALTH_CHECK_TOOL.to_string(),
        tools,
        cases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_bazi_shape() {
        let patch = extended_bazi();
        assert_eq!(patch.tools.len(), 11);
        assert_eq!(patch.cases.len(), 11);
        assert!(patch
            .tools
            .iter()
            .zip(&patch.cases)
            .all(|(tool, case)| tool.name == case.label));

        let annual = patch.tools.iter().find(|t| t.name == "bazi_annual_forecast").unwrap();
        assert_eq!(annual.parameters.len(), 7);
        assert!(!annual.required.contains("year"));
    }
}
