use anyhow::Result;
use clap::Args;
use motion_segmentation::services::{load_recording, save_json, SegmentationPipeline};
use std::path::PathBuf;

use super::CommandContext;
use crate::output;

#[derive(Args)]
pub struct SegmentCommand {
    /// Recording to segment (JSON)
    recording: PathBuf,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the capture rate used for durations
    #[arg(long)]
    fps: Option<f64>,
}

impl SegmentCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let recording = load_recording(&self.recording)?;
        let fps = self.fps.or(recording.fps);

        let pipeline = SegmentationPipeline::from_config(ctx.config.clone());
        let report = pipeline.run(recording.frames);

        if let Some(path) = &self.output {
            save_json(&report, path)?;
            tracing::info!("Report written to {}", path.display());
        }

        if ctx.json {
            output::print_json(&report)
        } else {
            output::print_report(&self.recording.display().to_string(), &report, fps);
            Ok(())
        }
    }
}
