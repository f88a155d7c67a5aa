use anyhow::Result;
use clap::Args;
use motion_segmentation::services::{load_recording, SegmentationPipeline};
use std::path::PathBuf;

use super::CommandContext;
use crate::output;

#[derive(Args)]
pub struct AnglesCommand {
    /// Recording to measure (JSON)
    recording: PathBuf,

    /// Only print these angles
    #[arg(short, long, value_delimiter = ',')]
    angle: Vec<String>,
}

impl AnglesCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        for name in &self.angle {
            if ctx.config.topology.angle(name).is_none() {
                anyhow::bail!("Unknown angle: {}", name);
            }
        }

        let recording = load_recording(&self.recording)?;
        let pipeline = SegmentationPipeline::from_config(ctx.config.clone());
        let frames = pipeline.prepare(recording.frames);
        let series = pipeline.angles(&frames);

        let selected: Vec<usize> = series
            .names()
            .iter()
            .enumerate()
            .filter(|(_, name)| self.angle.is_empty() || self.angle.contains(*name))
            .map(|(column, _)| column)
            .collect();

        if ctx.json {
            let samples: Vec<_> = series
                .samples()
                .filter(|sample| self.angle.is_empty() || self.angle.contains(&sample.name))
                .collect();
            return output::print_json(&samples);
        }

        let header: Vec<&str> = selected
            .iter()
            .map(|&column| series.names()[column].as_str())
            .collect();
        println!("frame,{}", header.join(","));

        for (row_index, frame) in series.frames().iter().enumerate() {
            let Some(row) = series.row(row_index) else {
                continue;
            };
            let values: Vec<String> = selected
                .iter()
                .map(|&column| {
                    let value = row[column];
                    if value.is_nan() {
                        String::new()
                    } else {
                        format!("{:.2}", value)
                    }
                })
                .collect();
            println!("{},{}", frame, values.join(","));
        }
        Ok(())
    }
}
