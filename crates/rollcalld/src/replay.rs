//! File-backed capture and analysis backends for development and
//! diagnostics: a camera-shaped source that replays a directory of
//! images, and an analyzer that embeds the whole frame.

use crate::capture::{CaptureError, Detection, FaceAnalyzer, Frame, VideoSource};
use rollcall_core::{BoundingBox, GridExtractor};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Replays a directory of images as a continuous grayscale frame
/// stream, in file-name order, cycling at the end.
pub struct ReplaySource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    sequence: u32,
    running: bool,
}

impl ReplaySource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
            next: 0,
            sequence: 0,
            running: false,
        }
    }
}

impl VideoSource for ReplaySource {
    fn start(&mut self) -> Result<(), CaptureError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {e}", self.dir.display())))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::Unavailable(format!(
                "no frames in {}",
                self.dir.display()
            )));
        }

        tracing::info!(frames = files.len(), dir = %self.dir.display(), "replay source started");
        self.files = files;
        self.next = 0;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.files.clear();
        tracing::info!("replay source stopped");
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if !self.running || self.files.is_empty() {
            return None;
        }
        let path = self.files[self.next].clone();
        self.next = (self.next + 1) % self.files.len();

        let img = match image::open(&path) {
            Ok(img) => img,
            Err(err) => {
                // Skip this tick; the next one advances to the next file.
                tracing::warn!(file = %path.display(), error = %err, "skipping undecodable frame");
                return None;
            }
        };

        let gray = img.to_luma8();
        let width = gray.width();
        let height = gray.height();
        let frame = Frame {
            data: gray.into_raw(),
            width,
            height,
            timestamp: Instant::now(),
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);
        Some(frame)
    }
}

/// Treats the entire frame as one pre-cropped face and embeds it with
/// the grid extractor. Face localization proper is the deployment's
/// job; this keeps the pipeline exercisable end to end.
pub struct FullFrameAnalyzer;

impl FaceAnalyzer for FullFrameAnalyzer {
    fn detect_and_embed(&mut self, frame: &Frame) -> Vec<Detection> {
        match GridExtractor.embed_raw(&frame.data, frame.width, frame.height) {
            Some(embedding) => vec![Detection {
                region: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: frame.width as f32,
                    height: frame.height as f32,
                },
                embedding,
            }],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_gray(dir: &Path, file: &str, value: u8) {
        let img = image::GrayImage::from_raw(8, 8, vec![value; 64]).unwrap();
        img.save(dir.join(file)).unwrap();
    }

    #[test]
    fn test_start_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ReplaySource::new(&dir.path().join("absent"));
        assert!(matches!(source.start(), Err(CaptureError::Unavailable(_))));
    }

    #[test]
    fn test_start_fails_on_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ReplaySource::new(dir.path());
        assert!(matches!(source.start(), Err(CaptureError::Unavailable(_))));
    }

    #[test]
    fn test_no_frames_before_start_or_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "a.png", 100);

        let mut source = ReplaySource::new(dir.path());
        assert!(source.next_frame().is_none());

        source.start().unwrap();
        assert!(source.next_frame().is_some());

        source.stop();
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_replays_in_order_and_cycles() {
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "a.png", 10);
        save_gray(dir.path(), "b.png", 20);

        let mut source = ReplaySource::new(dir.path());
        source.start().unwrap();

        let first = source.next_frame().unwrap();
        let second = source.next_frame().unwrap();
        let third = source.next_frame().unwrap();

        assert_eq!(first.data[0], 10);
        assert_eq!(second.data[0], 20);
        assert_eq!(third.data[0], 10); // wrapped around
        assert_eq!((first.sequence, second.sequence, third.sequence), (0, 1, 2));
    }

    #[test]
    fn test_undecodable_file_skips_one_tick() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "not an image").unwrap();
        save_gray(dir.path(), "b.png", 42);

        let mut source = ReplaySource::new(dir.path());
        source.start().unwrap();

        assert!(source.next_frame().is_none()); // a.txt
        let frame = source.next_frame().unwrap(); // b.png
        assert_eq!(frame.data[0], 42);
    }

    #[test]
    fn test_analyzer_embeds_full_frame() {
        let frame = Frame {
            data: (0..64u32).map(|i| (i * 3) as u8).collect(),
            width: 8,
            height: 8,
            timestamp: Instant::now(),
            sequence: 0,
        };

        let detections = FullFrameAnalyzer.detect_and_embed(&frame);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].region.width, 8.0);
        assert_eq!(detections[0].region.height, 8.0);
        assert!(detections[0].embedding.dim() > 0);
    }

    #[test]
    fn test_analyzer_reports_nothing_for_black_frame() {
        let frame = Frame {
            data: vec![0u8; 64],
            width: 8,
            height: 8,
            timestamp: Instant::now(),
            sequence: 0,
        };
        assert!(FullFrameAnalyzer.detect_and_embed(&frame).is_empty());
    }
}
