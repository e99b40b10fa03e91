use rollcall_core::{BoundingBox, Embedding};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture source unavailable: {0}")]
    Unavailable(String),
}

/// A grayscale frame handed to the pipeline.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

/// Source of frames. Owned by the pipeline thread; `start` acquires the
/// underlying device or resource, `stop` releases it.
pub trait VideoSource: Send {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self);
    /// Next frame if one is ready. `None` is not an error; the pipeline
    /// simply skips that step.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// One detected face: where it sits in the frame and its embedding.
#[derive(Debug, Clone)]
pub struct Detection {
    pub region: BoundingBox,
    pub embedding: Embedding,
}

/// Face detection plus embedding extraction over a full frame, consumed
/// once per pipeline step.
pub trait FaceAnalyzer: Send {
    fn detect_and_embed(&mut self, frame: &Frame) -> Vec<Detection>;
}
