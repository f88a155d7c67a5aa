use anyhow::Result;
use clap::Args;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use motion_segmentation::services::{
    list_recordings, save_json, BatchOutcome, BatchSegmenter, SegmentationPipeline,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::CommandContext;
use crate::output;

#[derive(Args)]
pub struct BatchCommand {
    /// Directory of recordings (*.json)
    dir: PathBuf,

    /// Number of recordings processed in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write one report per recording into this directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a motion_segmentation::SegmentationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a BatchOutcome> for BatchEntry<'a> {
    fn from(outcome: &'a BatchOutcome) -> Self {
        Self {
            name: &outcome.name,
            report: outcome.result.as_ref().ok(),
            error: outcome.result.as_ref().err().map(|err| format!("{:#}", err)),
        }
    }
}

impl BatchCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let files = list_recordings(&self.dir)?;
        if files.is_empty() {
            anyhow::bail!("No recordings found in {}", self.dir.display());
        }
        tracing::info!("Found {} recordings to process", files.len());

        let mut segmenter = BatchSegmenter::new(SegmentationPipeline::from_config(ctx.config.clone()));
        if let Some(jobs) = self.jobs {
            segmenter = segmenter.with_concurrency(jobs);
        }

        let progress = if ctx.json {
            ProgressBar::hidden()
        } else {
            progress_bar(files.len() as u64)?
        };

        let mut outcomes = Vec::with_capacity(files.len());
        let mut stream = Box::pin(segmenter.stream_files(files));
        while let Some(outcome) = stream.next().await {
            progress.set_message(short_name(&outcome.name));
            progress.inc(1);
            outcomes.push(outcome);
        }
        progress.finish_and_clear();

        if let Some(dir) = &self.output {
            write_reports(&outcomes, dir)?;
        }

        if ctx.json {
            let entries: Vec<BatchEntry> = outcomes.iter().map(BatchEntry::from).collect();
            output::print_json(&entries)?;
        } else {
            output::print_batch_summary(&outcomes);
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.is_ok()).count();
        if failed > 0 {
            anyhow::bail!("{} of {} recordings failed", failed, outcomes.len());
        }
        Ok(())
    }
}

fn progress_bar(total: u64) -> Result<ProgressBar> {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

fn short_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|file| file.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn write_reports(outcomes: &[BatchOutcome], dir: &Path) -> Result<()> {
    for outcome in outcomes {
        if let Ok(report) = &outcome.result {
            let stem = Path::new(&outcome.name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| report.id.to_string());
            save_json(report, dir.join(format!("{}.segments.json", stem)))?;
        }
    }
    Ok(())
}
