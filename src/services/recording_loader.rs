/// Recording file I/O
///
/// Recordings are JSON, either `{ "fps": 30, "frames": [...] }` or a bare
/// array of frames.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::models::{JointFrame, Recording};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordingFile {
    Full(Recording),
    Frames(Vec<JointFrame>),
}

/// Load a recording from a JSON file
pub fn load_recording(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open recording {}", path.display()))?;

    let parsed: RecordingFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse recording {}", path.display()))?;

    let recording = match parsed {
        RecordingFile::Full(recording) => recording,
        RecordingFile::Frames(frames) => Recording::new(frames),
    };

    tracing::debug!("Loaded {} frames from {}", recording.len(), path.display());
    Ok(recording)
}

/// Write any serialisable value as pretty JSON
pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// JSON recordings in a directory, sorted by file name
pub fn list_recordings(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Joint;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("squat.json");

        let recording = Recording {
            fps: Some(30.0),
            frames: vec![JointFrame::new(0, [(25, Joint::new(0.1, 0.2, 0.3, 0.9))])],
        };
        save_json(&recording, &path)?;

        let loaded = load_recording(&path)?;
        assert_eq!(loaded.fps, Some(30.0));
        assert_eq!(loaded.frames, recording.frames);
        Ok(())
    }

    #[test]
    fn test_bare_frame_array() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("frames.json");
        fs::write(&path, r#"[{ "frame": 4, "joints": [{ "id": 11, "x": 1.0, "y": 2.0 }] }]"#)?;

        let loaded = load_recording(&path)?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.fps, None);
        assert_eq!(loaded.frames[0].frame, 4);
        Ok(())
    }

    #[test]
    fn test_malformed_recording_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_recording(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_list_recordings_only_json() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("b.json"), "[]")?;
        fs::write(temp_dir.path().join("a.json"), "[]")?;
        fs::write(temp_dir.path().join("notes.txt"), "")?;

        let names: Vec<String> = list_recordings(temp_dir.path())?
            .iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
        Ok(())
    }
}
