// Terminal rendering for command results

use colored::Colorize;
use motion_segmentation::models::{JointTopology, Segment};
use motion_segmentation::services::{BatchOutcome, RepetitionProgress, SegmentationReport};
use serde::Serialize;

/// Print any serialisable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_duration(segment: &Segment, fps: Option<f64>) -> String {
    match fps {
        Some(fps) if fps > 0.0 => format!("{:.2}s", segment.duration_secs(fps)),
        _ => "-".to_string(),
    }
}

pub fn print_report(name: &str, report: &SegmentationReport, fps: Option<f64>) {
    println!("{}", format!("Segmentation of {}", name).bold());
    println!("────────────────────────────────");
    println!("Frames:     {}", report.frame_count);
    println!("Channels:   {}", report.channels.join(", "));
    println!("Boundaries: {}", report.boundaries.len());
    println!();

    if report.insufficient_data {
        println!(
            "{}",
            "Recording is shorter than one window; no segments produced".yellow()
        );
        return;
    }

    println!("{:>4}  {:>8}  {:>8}  {:>8}  {:>9}", "#", "start", "end", "frames", "duration");
    for segment in &report.segments {
        println!(
            "{:>4}  {:>8}  {:>8}  {:>8}  {:>9}",
            segment.repetition,
            segment.start_frame,
            segment.end_frame,
            segment.len(),
            format_duration(segment, fps)
        );
    }

    let dead: Vec<&str> = report
        .angles
        .iter()
        .filter(|angle| angle.mean_degrees.is_none() && report.channels.contains(&angle.name))
        .map(|angle| angle.name.as_str())
        .collect();
    if !dead.is_empty() {
        println!();
        println!("{} {}", "⚠ Never measured:".yellow(), dead.join(", "));
    }
}

pub fn print_repetitions(exercise: &str, progress: &[RepetitionProgress]) {
    let total = progress.last().map_or(0, |last| last.repetitions);
    println!("{}", format!("Repetitions of {}", exercise).bold());
    println!("────────────────────────────────");

    let mut counted = 0;
    for step in progress {
        if step.repetitions > counted {
            counted = step.repetitions;
            println!("  {} repetition {} at frame {}", "✓".green(), counted, step.frame);
        }
    }
    println!();
    println!("Total: {}", total.to_string().bold());
}

pub fn print_topology(topology: &JointTopology) {
    println!("{}", "Joints".bold());
    for (index, label) in topology.joints() {
        println!("  {:>3}  {}", index, label);
    }

    println!();
    println!("{}", "Connections".bold());
    let connections = topology.connections();
    for (group, bones) in [("head", &connections.head), ("torso", &connections.torso)] {
        let rendered: Vec<String> = bones
            .iter()
            .map(|[from, to]| format!("{}-{}", from, to))
            .collect();
        println!("  {:<6} {}", group, rendered.join(" "));
    }

    println!();
    println!("{}", "Angles".bold());
    for (name, [a, vertex, c]) in topology.angles() {
        let label = |index: &u32| topology.label(*index).unwrap_or("?").to_string();
        println!(
            "  {:<16} {} → {} → {}",
            name,
            label(a),
            label(vertex).cyan(),
            label(c)
        );
    }
}

pub fn print_batch_summary(outcomes: &[BatchOutcome]) {
    let failed: Vec<&BatchOutcome> = outcomes.iter().filter(|outcome| !outcome.is_ok()).collect();

    println!();
    println!("{}", "Batch Summary".bold());
    println!("────────────────────────────────");
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) if report.insufficient_data => println!(
                "  {} {}: too short to segment",
                "!".yellow(),
                outcome.name
            ),
            Ok(report) => println!(
                "  {} {}: {} segments",
                "✓".green(),
                outcome.name,
                report.segments.len()
            ),
            Err(err) => println!("  {} {}: {:#}", "✗".red(), outcome.name, err),
        }
    }
    println!();
    println!(
        "Processed {} recordings, {} failed",
        outcomes.len(),
        failed.len()
    );
}
