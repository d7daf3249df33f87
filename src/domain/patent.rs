use serde::{Deserialize, Serialize};

/// One extracted listing entry. Absent scalar fields stay as empty
/// strings so the output schema is stable across a run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patent {
    pub title: String,
    pub patent_number: String,
    pub organization: String,
    pub patent_type: String,
    pub year: String,
    pub date_added: String,
    pub url: String,
    pub description: String,
    pub cited_patents: Vec<String>,
    pub family_members: Vec<String>,
    pub classification_codes: Vec<String>,
    pub prior_art_keywords: Vec<String>,
}

impl Patent {
    /// Minimal-completeness rule: a record is worth emitting iff it has
    /// a title or a patent number. All-empty records are dropped.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() || !self.patent_number.trim().is_empty()
    }
}
