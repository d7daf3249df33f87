use std::collections::HashSet;

use serde::Serialize;

use super::patent::Patent;

/// Outcome of one page's processing, folded into the run aggregate and
/// then discarded.
#[derive(Debug)]
pub struct PageOutcome {
    pub patents: Vec<Patent>,
    pub ready: bool,
    pub attempts: u32,
}

#[derive(Debug, Default)]
pub struct RunResult {
    /// Strictly in page-index order, within a page in encounter order.
    pub patents: Vec<Patent>,
    pub pages_scraped: Vec<u32>,
    pub pages_skipped: u32,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub total_patents: usize,
    pub pages_scraped: Vec<u32>,
    pub pages_skipped: u32,
    pub patents_with_titles: usize,
    pub patents_with_numbers: usize,
    pub patents_with_organizations: usize,
    pub patents_with_descriptions: usize,
    pub unique_organizations: usize,
    pub scrape_date: String,
    pub raw_file: String,
    pub cleaned_file: String,
    pub summary_file: String,
}

impl RunSummary {
    pub fn new(
        result: &RunResult,
        raw_file: String,
        cleaned_file: String,
        summary_file: String,
    ) -> Self {
        let organizations: HashSet<&str> = result
            .patents
            .iter()
            .filter(|p| !p.organization.is_empty())
            .map(|p| p.organization.as_str())
            .collect();

        RunSummary {
            total_patents: result.patents.len(),
            pages_scraped: result.pages_scraped.clone(),
            pages_skipped: result.pages_skipped,
            patents_with_titles: result.patents.iter().filter(|p| !p.title.is_empty()).count(),
            patents_with_numbers: result
                .patents
                .iter()
                .filter(|p| !p.patent_number.is_empty())
                .count(),
            patents_with_organizations: result
                .patents
                .iter()
                .filter(|p| !p.organization.is_empty())
                .count(),
            patents_with_descriptions: result
                .patents
                .iter()
                .filter(|p| !p.description.is_empty())
                .count(),
            unique_organizations: organizations.len(),
            scrape_date: chrono::Local::now().to_rfc3339(),
            raw_file,
            cleaned_file,
            summary_file,
        }
    }
}
