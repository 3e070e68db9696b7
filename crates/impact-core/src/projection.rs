use serde::Serialize;

use crate::analysis::ImpactAnalysis;
use crate::area::{AreaKey, SuggestionLevel};

/// Label shown for actions that are not tied to a single area.
pub const CROSS_AREA_LABEL: &str = "Cross-area";

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A suggested action annotated with its resolved area for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    pub description: String,
    pub area: Option<AreaKey>,
}

impl ActionView {
    pub fn area_label(&self) -> &'static str {
        self.area.map(AreaKey::label).unwrap_or(CROSS_AREA_LABEL)
    }
}

/// The grouped view of an analysis shown in the summary stage.
///
/// Areas appear in canonical order within each partition; `not_sure` areas
/// are omitted from both lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub impacted: Vec<AreaKey>,
    pub to_review: Vec<AreaKey>,
    pub actions: Vec<ActionView>,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Partition the seven areas by suggestion level and annotate actions.
pub fn project(analysis: &ImpactAnalysis) -> SummaryView {
    let mut impacted = Vec::new();
    let mut to_review = Vec::new();
    for (key, level) in analysis.area_suggestions.iter() {
        match level {
            SuggestionLevel::LikelyImpacted => impacted.push(key),
            SuggestionLevel::ToReview => to_review.push(key),
            SuggestionLevel::NotSure => {}
        }
    }

    let actions = analysis
        .suggested_actions
        .iter()
        .map(|a| ActionView {
            description: a.description.clone(),
            area: a.area_key,
        })
        .collect();

    SummaryView {
        impacted,
        to_review,
        actions,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
