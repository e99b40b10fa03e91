//! Annotated output handed to the display surface.

use crate::capture::Frame;
use rollcall_core::{BoundingBox, Session};

/// How a face is labeled in the rendered output.
#[derive(Debug, Clone, PartialEq)]
pub enum Marking {
    Known { name: String },
    Unknown,
}

#[derive(Debug, Clone)]
pub struct FaceAnnotation {
    pub region: BoundingBox,
    pub marking: Marking,
    pub session: Session,
}

impl FaceAnnotation {
    /// Text drawn over the face box, e.g. "alice - Morning".
    pub fn label(&self) -> String {
        match &self.marking {
            Marking::Known { name } => format!("{name} - {}", self.session),
            Marking::Unknown => format!("Unknown - {}", self.session),
        }
    }
}

/// One processed frame with its face annotations (possibly none).
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub faces: Vec<FaceAnnotation>,
}

/// Consumer of annotated frames. The production renderer lives in the
/// embedding application's UI; the pipeline only guarantees exactly one
/// frame per processed step.
pub trait DisplaySink: Send {
    fn render(&mut self, frame: AnnotatedFrame);
}

/// Reports annotated faces through the log instead of drawing them.
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn render(&mut self, frame: AnnotatedFrame) {
        for face in &frame.faces {
            tracing::debug!(
                seq = frame.frame.sequence,
                label = %face.label(),
                x = face.region.x,
                y = face.region.y,
                "face"
            );
        }
    }
}
