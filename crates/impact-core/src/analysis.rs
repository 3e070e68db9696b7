use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::area::{AreaKey, SuggestionLevel};

// ---------------------------------------------------------------------------
// Size limits
// ---------------------------------------------------------------------------

/// Maximum characters kept in the sanitized summary.
pub const MAX_SUMMARY_CHARS: usize = 200;
/// Maximum characters kept in the sanitized context.
pub const MAX_CONTEXT_CHARS: usize = 2000;
/// Maximum number of clarifying questions kept.
pub const MAX_QUESTIONS: usize = 4;
/// Maximum number of suggested actions kept.
pub const MAX_ACTIONS: usize = 3;
/// Maximum characters kept in one action description.
pub const MAX_ACTION_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// AreaSuggestions
// ---------------------------------------------------------------------------

/// One suggestion level per impact area.
///
/// A struct with one typed field per area (rather than a map) so the
/// "exactly seven keys" invariant holds structurally: there is no way to
/// build a value with a missing or extra area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSuggestions {
    pub asset_tools: SuggestionLevel,
    pub information_data: SuggestionLevel,
    pub access_privileges: SuggestionLevel,
    pub process_controls: SuggestionLevel,
    pub risk_impact: SuggestionLevel,
    pub policies_docs: SuggestionLevel,
    pub people_awareness: SuggestionLevel,
}

impl AreaSuggestions {
    /// All seven areas set to the same level.
    pub fn uniform(level: SuggestionLevel) -> Self {
        AreaSuggestions {
            asset_tools: level,
            information_data: level,
            access_privileges: level,
            process_controls: level,
            risk_impact: level,
            policies_docs: level,
            people_awareness: level,
        }
    }

    pub fn get(&self, key: AreaKey) -> SuggestionLevel {
        match key {
            AreaKey::AssetTools => self.asset_tools,
            AreaKey::InformationData => self.information_data,
            AreaKey::AccessPrivileges => self.access_privileges,
            AreaKey::ProcessControls => self.process_controls,
            AreaKey::RiskImpact => self.risk_impact,
            AreaKey::PoliciesDocs => self.policies_docs,
            AreaKey::PeopleAwareness => self.people_awareness,
        }
    }

    /// Iterate all areas in canonical order with their levels.
    pub fn iter(&self) -> impl Iterator<Item = (AreaKey, SuggestionLevel)> + '_ {
        AreaKey::all().iter().map(move |k| (*k, self.get(*k)))
    }
}

impl Default for AreaSuggestions {
    fn default() -> Self {
        AreaSuggestions::uniform(SuggestionLevel::ToReview)
    }
}

// ---------------------------------------------------------------------------
// SuggestedAction
// ---------------------------------------------------------------------------

/// A follow-up action proposed by the model. `area_key = None` marks a
/// cross-area (global) action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub description: String,
    pub area_key: Option<AreaKey>,
}

// ---------------------------------------------------------------------------
// ImpactAnalysis
// ---------------------------------------------------------------------------

/// The sanitized result of one model call.
///
/// Values of this type are only produced by [`ImpactAnalysis::from_untrusted`]
/// and [`ImpactAnalysis::neutral`], so every instance satisfies the size
/// bounds above and carries exactly seven area suggestions. Downstream code
/// never sees raw model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub summary: String,
    #[serde(rename = "ai_context")]
    pub context: String,
    pub clarifying_questions: Vec<String>,
    pub area_suggestions: AreaSuggestions,
    pub suggested_actions: Vec<SuggestedAction>,
}

impl ImpactAnalysis {
    /// Sanitize untrusted model output into the guaranteed shape.
    ///
    /// Total: any JSON value (empty object, wrong types, extra keys) yields
    /// a structurally valid analysis. Missing or invalid suggestion levels
    /// default to `to_review`; invalid action area keys become `None`;
    /// strings are truncated to their limits and lists capped.
    pub fn from_untrusted(raw: &Value) -> Self {
        let summary = truncate_chars(str_field(raw, "summary"), MAX_SUMMARY_CHARS);
        let context = truncate_chars(str_field(raw, "ai_context"), MAX_CONTEXT_CHARS);

        let clarifying_questions = raw
            .get("clarifying_questions")
            .and_then(Value::as_array)
            .map(|qs| {
                qs.iter()
                    .take(MAX_QUESTIONS)
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let suggestions = raw.get("area_suggestions");
        let level = |key: AreaKey| -> SuggestionLevel {
            suggestions
                .and_then(|s| s.get(key.as_str()))
                .and_then(Value::as_str)
                .and_then(|v| v.parse().ok())
                .unwrap_or(SuggestionLevel::ToReview)
        };
        let area_suggestions = AreaSuggestions {
            asset_tools: level(AreaKey::AssetTools),
            information_data: level(AreaKey::InformationData),
            access_privileges: level(AreaKey::AccessPrivileges),
            process_controls: level(AreaKey::ProcessControls),
            risk_impact: level(AreaKey::RiskImpact),
            policies_docs: level(AreaKey::PoliciesDocs),
            people_awareness: level(AreaKey::PeopleAwareness),
        };

        let suggested_actions = raw
            .get("suggested_actions")
            .and_then(Value::as_array)
            .map(|actions| {
                actions
                    .iter()
                    .take(MAX_ACTIONS)
                    .map(|a| SuggestedAction {
                        description: truncate_chars(str_field(a, "description"), MAX_ACTION_CHARS),
                        area_key: a
                            .get("area_key")
                            .and_then(Value::as_str)
                            .and_then(|k| k.parse().ok()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ImpactAnalysis {
            summary,
            context,
            clarifying_questions,
            area_suggestions,
            suggested_actions,
        }
    }

    /// Degraded analysis used when the user continues without AI: empty
    /// texts, zero questions, zero actions, all areas `to_review`.
    pub fn neutral() -> Self {
        ImpactAnalysis {
            summary: String::new(),
            context: String::new(),
            clarifying_questions: Vec::new(),
            area_suggestions: AreaSuggestions::uniform(SuggestionLevel::ToReview),
            suggested_actions: Vec::new(),
        }
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> &'a str {
    raw.get(key).and_then(Value::as_str).unwrap_or("")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_empty_object_yields_valid_shape() {
        let analysis = ImpactAnalysis::from_untrusted(&json!({}));
        assert_eq!(analysis.summary, "");
        assert_eq!(analysis.context, "");
        assert!(analysis.clarifying_questions.is_empty());
        assert!(analysis.suggested_actions.is_empty());
        for (_, level) in analysis.area_suggestions.iter() {
            assert_eq!(level, SuggestionLevel::ToReview);
        }
    }

    #[test]
    fn sanitize_wrong_types_yields_valid_shape() {
        let raw = json!({
            "summary": 42,
            "ai_context": ["not", "a", "string"],
            "clarifying_questions": "not an array",
            "area_suggestions": "not an object",
            "suggested_actions": {"not": "an array"},
            "extra_key": true,
        });
        let analysis = ImpactAnalysis::from_untrusted(&raw);
        assert_eq!(analysis.summary, "");
        assert!(analysis.clarifying_questions.is_empty());
        assert!(analysis.suggested_actions.is_empty());
        assert_eq!(analysis.area_suggestions, AreaSuggestions::default());
    }

    #[test]
    fn sanitize_truncates_and_caps() {
        let raw = json!({
            "summary": "s".repeat(500),
            "ai_context": "c".repeat(5000),
            "clarifying_questions": ["q1", "q2", "q3", "q4", "q5", "q6"],
            "suggested_actions": [
                {"description": "d".repeat(1000), "area_key": "asset_tools"},
                {"description": "a2", "area_key": null},
                {"description": "a3", "area_key": "bogus_area"},
                {"description": "a4", "area_key": "risk_impact"},
            ],
        });
        let analysis = ImpactAnalysis::from_untrusted(&raw);
        assert_eq!(analysis.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(analysis.context.chars().count(), 0);
        assert_eq!(analysis.clarifying_questions.len(), MAX_QUESTIONS);
        assert_eq!(analysis.suggested_actions.len(), MAX_ACTIONS);
        assert_eq!(
            analysis.suggested_actions[0].description.chars().count(),
            MAX_ACTION_CHARS
        );
        assert_eq!(
            analysis.suggested_actions[0].area_key,
            Some(AreaKey::AssetTools)
        );
        assert_eq!(analysis.suggested_actions[1].area_key, None);
        // Invalid area key coerced to None (cross-area)
        assert_eq!(analysis.suggested_actions[2].area_key, None);
    }

    #[test]
    fn sanitize_coerces_invalid_levels_to_to_review() {
        let raw = json!({
            "area_suggestions": {
                "asset_tools": "likely_impacted",
                "information_data": "not_sure",
                "access_privileges": "impacted",          // historical variant, invalid
                "process_controls": 17,
                "risk_impact": "to_review",
                // policies_docs missing
                "people_awareness": null,
            },
        });
        let analysis = ImpactAnalysis::from_untrusted(&raw);
        let a = &analysis.area_suggestions;
        assert_eq!(a.asset_tools, SuggestionLevel::LikelyImpacted);
        assert_eq!(a.information_data, SuggestionLevel::NotSure);
        assert_eq!(a.access_privileges, SuggestionLevel::ToReview);
        assert_eq!(a.process_controls, SuggestionLevel::ToReview);
        assert_eq!(a.risk_impact, SuggestionLevel::ToReview);
        assert_eq!(a.policies_docs, SuggestionLevel::ToReview);
        assert_eq!(a.people_awareness, SuggestionLevel::ToReview);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = json!({
            "summary": "Decision: replace Slack with Microsoft Teams.",
            "ai_context": "Chat history must be migrated or archived.",
            "clarifying_questions": ["Who migrates the data?", "When?"],
            "area_suggestions": {
                "asset_tools": "likely_impacted",
                "information_data": "to_review",
                "access_privileges": "to_review",
                "process_controls": "likely_impacted",
                "risk_impact": "not_sure",
                "policies_docs": "to_review",
                "people_awareness": "to_review",
            },
            "suggested_actions": [
                {"description": "Plan the data migration", "area_key": "information_data"},
            ],
        });
        let once = ImpactAnalysis::from_untrusted(&raw);
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = ImpactAnalysis::from_untrusted(&reserialized);
        assert_eq!(once, twice);
    }

    #[test]
    fn neutral_has_all_areas_to_review_and_no_questions() {
        let analysis = ImpactAnalysis::neutral();
        assert!(analysis.clarifying_questions.is_empty());
        assert!(analysis.suggested_actions.is_empty());
        for (_, level) in analysis.area_suggestions.iter() {
            assert_eq!(level, SuggestionLevel::ToReview);
        }
    }

    #[test]
    fn truncation_is_character_based() {
        // Multibyte characters must not be split
        let raw = json!({ "summary": "à".repeat(300) });
        let analysis = ImpactAnalysis::from_untrusted(&raw);
        assert_eq!(analysis.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(analysis.summary.chars().all(|c| c == 'à'));
    }
}
