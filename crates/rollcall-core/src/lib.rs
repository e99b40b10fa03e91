//! rollcall-core — Identity matching engine for face attendance.
//!
//! Holds the gallery of known identities, the nearest-neighbor matcher,
//! the morning/evening session classifier, and the alert throttle. The
//! learned embedding extractor and the camera are external; this crate
//! defines the trait seams they plug into.

use std::path::PathBuf;

pub mod extractor;
pub mod gallery;
pub mod session;
pub mod throttle;
pub mod types;

pub use extractor::GridExtractor;
pub use gallery::{EmbeddingExtractor, Gallery, GalleryLoadError};
pub use session::Session;
pub use throttle::AlertThrottle;
pub use types::{BoundingBox, Embedding, Identity, MatchVerdict, Matcher, NearestMatcher};

/// Default data directory: `$XDG_DATA_HOME/rollcall`, falling back to
/// `~/.local/share/rollcall`. The gallery and the attendance store live
/// here unless configured otherwise.
pub fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
}
