use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AreaKey
// ---------------------------------------------------------------------------

/// One of the seven fixed areas of organizational impact.
///
/// The set is closed at design time and never extended dynamically. The
/// order of [`AreaKey::all`] is the canonical domain order used everywhere
/// areas are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKey {
    AssetTools,
    InformationData,
    AccessPrivileges,
    ProcessControls,
    RiskImpact,
    PoliciesDocs,
    PeopleAwareness,
}

impl AreaKey {
    /// All seven keys in canonical order.
    pub fn all() -> &'static [AreaKey] {
        &[
            AreaKey::AssetTools,
            AreaKey::InformationData,
            AreaKey::AccessPrivileges,
            AreaKey::ProcessControls,
            AreaKey::RiskImpact,
            AreaKey::PoliciesDocs,
            AreaKey::PeopleAwareness,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AreaKey::AssetTools => "asset_tools",
            AreaKey::InformationData => "information_data",
            AreaKey::AccessPrivileges => "access_privileges",
            AreaKey::ProcessControls => "process_controls",
            AreaKey::RiskImpact => "risk_impact",
            AreaKey::PoliciesDocs => "policies_docs",
            AreaKey::PeopleAwareness => "people_awareness",
        }
    }

    /// Display label for the area.
    pub fn label(self) -> &'static str {
        match self {
            AreaKey::AssetTools => "Assets & Tools",
            AreaKey::InformationData => "Information & Data",
            AreaKey::AccessPrivileges => "Access & Privileges",
            AreaKey::ProcessControls => "Processes & Controls",
            AreaKey::RiskImpact => "Risk & Impact",
            AreaKey::PoliciesDocs => "Policies & Documentation",
            AreaKey::PeopleAwareness => "People & Awareness",
        }
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AreaKey {
    type Err = crate::error::DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset_tools" => Ok(AreaKey::AssetTools),
            "information_data" => Ok(AreaKey::InformationData),
            "access_privileges" => Ok(AreaKey::AccessPrivileges),
            "process_controls" => Ok(AreaKey::ProcessControls),
            "risk_impact" => Ok(AreaKey::RiskImpact),
            "policies_docs" => Ok(AreaKey::PoliciesDocs),
            "people_awareness" => Ok(AreaKey::PeopleAwareness),
            _ => Err(crate::error::DecisionError::InvalidAreaKey(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SuggestionLevel
// ---------------------------------------------------------------------------

/// The model's confidence classification for one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionLevel {
    NotSure,
    ToReview,
    LikelyImpacted,
}

impl SuggestionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionLevel::NotSure => "not_sure",
            SuggestionLevel::ToReview => "to_review",
            SuggestionLevel::LikelyImpacted => "likely_impacted",
        }
    }
}

impl fmt::Display for SuggestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SuggestionLevel {
    type Err = crate::error::DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_sure" => Ok(SuggestionLevel::NotSure),
            "to_review" => Ok(SuggestionLevel::ToReview),
            "likely_impacted" => Ok(SuggestionLevel::LikelyImpacted),
            _ => Err(crate::error::DecisionError::InvalidSuggestionLevel(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// AnswerValue
// ---------------------------------------------------------------------------

/// A user's answer to one clarifying question: either a quick token
/// (`yes`/`no`/`not_sure`) or free-text elaboration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnswerValue {
    Yes,
    No,
    NotSure,
    Text(String),
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        match s.as_str() {
            "yes" => AnswerValue::Yes,
            "no" => AnswerValue::No,
            "not_sure" => AnswerValue::NotSure,
            _ => AnswerValue::Text(s),
        }
    }
}

impl From<AnswerValue> for String {
    fn from(a: AnswerValue) -> Self {
        match a {
            AnswerValue::Yes => "yes".to_string(),
            AnswerValue::No => "no".to_string(),
            AnswerValue::NotSure => "not_sure".to_string(),
            AnswerValue::Text(s) => s,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Yes => f.write_str("yes"),
            AnswerValue::No => f.write_str("no"),
            AnswerValue::NotSure => f.write_str("not_sure"),
            AnswerValue::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
