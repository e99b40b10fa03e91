use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in source-frame pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Face embedding vector. All embeddings compared against each other
/// must come from the same extractor and have the same dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Compute Euclidean distance between two embeddings.
    ///
    /// Lower = more similar. Mismatched dimensions compare over the
    /// shorter prefix, which only arises from mixing extractors.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

/// A known person: display name plus the reference embedding captured
/// at gallery load. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub name: String,
    pub embedding: Embedding,
}

/// Verdict for one probe embedding against the gallery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MatchVerdict {
    /// Best gallery entry within the distance threshold.
    Matched { name: String, distance: f32 },
    /// No gallery entry within the threshold (or the gallery is empty).
    Unknown,
}

/// Strategy for deciding whether a probe embedding belongs to a known
/// identity. Implementations must be pure: no side effects, no gallery
/// mutation, same verdict for same inputs.
pub trait Matcher {
    fn compare(&self, probe: &Embedding, gallery: &[Identity], threshold: f32) -> MatchVerdict;
}

/// Nearest-neighbor matcher over Euclidean distance.
///
/// Scans every gallery entry (no early exit) and keeps the minimum
/// distance. The verdict is `Matched` iff that minimum is within the
/// threshold. Equal distances resolve to the entry encountered first
/// in gallery order.
pub struct NearestMatcher;

impl Matcher for NearestMatcher {
    fn compare(&self, probe: &Embedding, gallery: &[Identity], threshold: f32) -> MatchVerdict {
        let mut best_dist = f32::INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, identity) in gallery.iter().enumerate() {
            let dist = probe.euclidean_distance(&identity.embedding);
            // Strict `<` keeps the earliest entry on ties.
            if dist < best_dist {
                best_dist = dist;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(idx) if best_dist <= threshold => MatchVerdict::Matched {
                name: gallery[idx].name.clone(),
                distance: best_dist,
            },
            _ => MatchVerdict::Unknown,
        }
    }
}
