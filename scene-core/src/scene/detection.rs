use serde::{Deserialize, Serialize};

use super::category::Category;

/// One reportable region found during category fusion. Observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub category: Category,
    /// Oracle confidence in [0, 1]
    pub confidence: f32,
    /// Share of the image covered by the region, in [0, 100]
    pub coverage_pct: f32,
}

impl Detection {
    /// `palm tree→cat1(12.5%)`
    pub fn summary(&self) -> String {
        format!(
            "{}→cat{}({:.1}%)",
            self.label,
            self.category.id(),
            self.coverage_pct
        )
    }
}

/// Detection summaries ordered by coverage, largest first.
pub fn summarize(detections: &[Detection]) -> Vec<String> {
    let mut sorted: Vec<&Detection> = detections.iter().collect();
    sorted.sort_by(|a, b| b.coverage_pct.total_cmp(&a.coverage_pct));
    sorted.into_iter().map(Detection::summary).collect()
}
