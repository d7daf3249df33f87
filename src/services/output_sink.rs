use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::domain::{Patent, RunResult, RunSummary};

/// Writes the finished record sequence and the run summary as
/// timestamped JSON artifacts. Each write is self-contained; no handle
/// outlives a single call.
pub struct OutputSink {
    output_dir: PathBuf,
}

impl OutputSink {
    pub fn new(output_dir: PathBuf) -> Self {
        OutputSink { output_dir }
    }

    pub fn save_run(&self, result: &RunResult) -> anyhow::Result<RunSummary> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {:?}", self.output_dir)
        })?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let raw_file = format!("raw_patents_{timestamp}.json");
        let cleaned_file = format!("cleaned_patents_{timestamp}.json");
        let summary_file = format!("scrape_summary_{timestamp}.json");

        self.save_patents(&result.patents, &raw_file)?;
        self.save_patents(&result.patents, &cleaned_file)?;

        let summary = RunSummary::new(
            result,
            raw_file,
            cleaned_file,
            summary_file.clone(),
        );
        let filepath = self.output_dir.join(&summary_file);
        fs::write(&filepath, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Failed to write {filepath:?}"))?;
        log::info!("Saved run summary to {:?}", filepath);

        Ok(summary)
    }

    fn save_patents(&self, patents: &[Patent], filename: &str) -> anyhow::Result<()> {
        let filepath = self.output_dir.join(filename);
        fs::write(&filepath, serde_json::to_string_pretty(patents)?)
            .with_context(|| format!("Failed to write {filepath:?}"))?;
        log::info!("Saved {} patents to {:?}", patents.len(), filepath);
        Ok(())
    }
}
