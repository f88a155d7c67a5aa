/// Batch segmentation of many recordings
///
/// Each recording runs on the blocking thread pool; at most `concurrency`
/// run at once and results come back in input order. A failing or
/// panicking recording only fails its own outcome.

use anyhow::{anyhow, Result};
use futures::stream::{self, Stream, StreamExt};
use std::path::PathBuf;

use crate::models::{JointFrame, Recording};
use crate::services::recording_loader::load_recording;
use crate::services::segmentation_pipeline::{SegmentationPipeline, SegmentationReport};

/// Result for one recording of a batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<SegmentationReport>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct BatchSegmenter {
    pipeline: SegmentationPipeline,
    concurrency: usize,
}

impl BatchSegmenter {
    /// Concurrency defaults to the number of available cores
    pub fn new(pipeline: SegmentationPipeline) -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|cores| cores.get())
            .unwrap_or(1);
        Self {
            pipeline,
            concurrency,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Segment recordings from JSON files as they complete, in input order
    pub fn stream_files(&self, paths: Vec<PathBuf>) -> impl Stream<Item = BatchOutcome> + '_ {
        let jobs = paths
            .into_iter()
            .map(|path| (path.display().to_string(), path))
            .collect();
        self.stream_jobs(jobs, |path| load_recording(path).map(|recording| recording.frames))
    }

    /// Segment recordings from JSON files
    pub async fn run_files(&self, paths: Vec<PathBuf>) -> Vec<BatchOutcome> {
        self.stream_files(paths).collect().await
    }

    /// Segment in-memory recordings
    pub async fn run_recordings(&self, recordings: Vec<(String, Recording)>) -> Vec<BatchOutcome> {
        self.stream_jobs(recordings, |recording| Ok(recording.frames))
            .collect()
            .await
    }

    fn stream_jobs<T, F>(&self, jobs: Vec<(String, T)>, load: F) -> impl Stream<Item = BatchOutcome> + '_
    where
        T: Send + 'static,
        F: Fn(T) -> Result<Vec<JointFrame>> + Clone + Send + 'static,
    {
        stream::iter(jobs)
            .map(move |(name, source)| {
                let pipeline = self.pipeline.clone();
                let load = load.clone();
                async move {
                    let result = tokio::task::spawn_blocking(move || -> Result<SegmentationReport> {
                        let frames = load(source)?;
                        Ok(pipeline.run(frames))
                    })
                    .await
                    .unwrap_or_else(|err| Err(anyhow!("Segmentation task failed: {}", err)));

                    if let Err(err) = &result {
                        tracing::warn!("Recording {} failed: {:#}", name, err);
                    }
                    BatchOutcome { name, result }
                }
            })
            .buffered(self.concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Joint;
    use std::fs;
    use tempfile::TempDir;

    fn recording(frames: usize) -> Recording {
        Recording::new(
            (0..frames)
                .map(|frame| {
                    let knee = Joint::new(0.0, 0.0, 0.0, 0.9);
                    let hip = Joint::new(0.0, 1.0, 0.0, 0.9);
                    let ankle = Joint::new((frame as f64 / 5.0).sin(), -1.0, 0.0, 0.9);
                    JointFrame::new(frame, [(23, hip), (25, knee), (27, ankle)])
                })
                .collect(),
        )
    }

    fn segmenter() -> BatchSegmenter {
        BatchSegmenter::new(SegmentationPipeline::from_config(Config::builtin().unwrap()))
            .with_concurrency(2)
    }

    #[tokio::test]
    async fn test_in_memory_batch_keeps_order() {
        let outcomes = segmenter()
            .run_recordings(vec![
                ("long".to_string(), recording(60)),
                ("short".to_string(), recording(2)),
                ("medium".to_string(), recording(30)),
            ])
            .await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["long", "short", "medium"]);
        assert!(outcomes.iter().all(BatchOutcome::is_ok));

        let short = outcomes[1].result.as_ref().unwrap();
        assert!(short.insufficient_data);
        assert_eq!(outcomes[0].result.as_ref().unwrap().frame_count, 60);
    }

    #[tokio::test]
    async fn test_bad_file_does_not_stop_batch() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.json");
        let bad = temp_dir.path().join("bad.json");
        fs::write(&good, serde_json::to_string(&recording(20)).unwrap()).unwrap();
        fs::write(&bad, "{ \"frames\": 12 }").unwrap();
        let missing = temp_dir.path().join("missing.json");

        let outcomes = segmenter().run_files(vec![bad, good, missing]).await;

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert!(!outcomes[2].is_ok());
    }

    #[test]
    fn test_concurrency_floor() {
        assert_eq!(segmenter().with_concurrency(0).concurrency(), 1);
        assert!(BatchSegmenter::new(SegmentationPipeline::from_config(Config::builtin().unwrap())).concurrency() >= 1);
    }
}
