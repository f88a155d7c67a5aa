use anyhow::{Context, Result};
use clap::Args;
use motion_segmentation::services::{
    load_recording, AngleExtractor, RepetitionCounter, SegmentationPipeline,
};
use std::path::PathBuf;

use super::CommandContext;
use crate::output;

#[derive(Args)]
pub struct RepsCommand {
    /// Recording to analyse (JSON)
    recording: PathBuf,

    /// Exercise whose phases are configured under `[exercises.<name>]`
    #[arg(short, long)]
    exercise: String,
}

impl RepsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let phases = ctx.config.exercise(&self.exercise).with_context(|| {
            let known: Vec<&str> = ctx.config.exercises.keys().map(String::as_str).collect();
            format!(
                "Unknown exercise `{}` (configured: {})",
                self.exercise,
                known.join(", ")
            )
        })?;

        let recording = load_recording(&self.recording)?;
        let pipeline = SegmentationPipeline::from_config(ctx.config.clone());
        let frames = pipeline.prepare(recording.frames);

        let extractor = AngleExtractor::new(&ctx.config.topology)
            .with_min_confidence(ctx.config.segmentation_parameters.min_confidence);
        let mut counter = RepetitionCounter::new(phases);
        let progress: Vec<_> = frames
            .iter()
            .map(|frame| counter.update(frame.frame, &extractor.compute(frame)))
            .collect();

        tracing::info!(
            "Counted {} repetitions of {} over {} frames",
            counter.repetitions(),
            self.exercise,
            frames.len()
        );

        if ctx.json {
            output::print_json(&progress)
        } else {
            output::print_repetitions(&self.exercise, &progress);
            Ok(())
        }
    }
}
