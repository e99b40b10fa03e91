//! Known-identity gallery, loaded once at startup from a directory of
//! reference images (one person per file, file stem = display name).

use crate::types::{Embedding, Identity};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryLoadError {
    #[error("cannot read gallery directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Produces a reference embedding from a gallery image.
///
/// `None` means the image carries no usable face signal and the file
/// should be skipped. Production deployments implement this against a
/// learned model; [`crate::GridExtractor`] is the built-in development
/// backend.
pub trait EmbeddingExtractor {
    fn extract(&self, image: &DynamicImage) -> Option<Embedding>;
}

/// Read-only collection of known identities. Names are unique; when the
/// same name is loaded twice the most recent embedding wins.
pub struct Gallery {
    identities: Vec<Identity>,
}

impl Gallery {
    /// Build a gallery from pre-extracted identities, applying the same
    /// last-wins name dedup as [`Gallery::load`].
    pub fn new(identities: Vec<Identity>) -> Self {
        let mut gallery = Gallery {
            identities: Vec::with_capacity(identities.len()),
        };
        for identity in identities {
            gallery.insert(identity);
        }
        gallery
    }

    /// Load reference images from `dir` and extract one embedding per file.
    ///
    /// Entries are processed in file-name order so gallery order (and
    /// matcher tie-breaking) is stable across runs. A file that fails to
    /// decode or yields no embedding is skipped with a warning; an
    /// unreadable directory is fatal.
    pub fn load(dir: &Path, extractor: &dyn EmbeddingExtractor) -> Result<Self, GalleryLoadError> {
        let entries = std::fs::read_dir(dir).map_err(|source| GalleryLoadError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut gallery = Gallery {
            identities: Vec::with_capacity(paths.len()),
        };

        for path in &paths {
            let Some(stem) = path.file_stem() else {
                continue;
            };
            let name = stem.to_string_lossy().into_owned();

            let img = match image::open(path) {
                Ok(img) => img,
                Err(err) => {
                    tracing::warn!(file = %path.display(), error = %err, "skipping file: not a decodable image");
                    continue;
                }
            };

            let Some(embedding) = extractor.extract(&img) else {
                tracing::warn!(file = %path.display(), "skipping file: no embedding extracted");
                continue;
            };

            gallery.insert(Identity { name, embedding });
        }

        tracing::info!(
            identities = gallery.len(),
            dir = %dir.display(),
            "gallery loaded"
        );

        Ok(gallery)
    }

    fn insert(&mut self, identity: Identity) {
        if identity.name.is_empty() {
            tracing::warn!("skipping identity with an empty name");
            return;
        }
        if let Some(existing) = self
            .identities
            .iter_mut()
            .find(|i| i.name == identity.name)
        {
            tracing::warn!(
                name = %identity.name,
                "duplicate identity name; keeping the most recently loaded embedding"
            );
            existing.embedding = identity.embedding;
        } else {
            self.identities.push(identity);
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identity> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Embeds an image as its mean brightness; treats near-black images
    /// as carrying no signal.
    struct MeanExtractor;

    impl EmbeddingExtractor for MeanExtractor {
        fn extract(&self, image: &DynamicImage) -> Option<Embedding> {
            let gray = image.to_luma8();
            let n = (gray.width() * gray.height()) as f64;
            if n == 0.0 {
                return None;
            }
            let mean = (gray.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n) as f32;
            if mean < 1.0 {
                None
            } else {
                Some(Embedding { values: vec![mean] })
            }
        }
    }

    fn save_gray(dir: &Path, file: &str, value: u8) {
        let img = image::GrayImage::from_raw(8, 8, vec![value; 64]).unwrap();
        img.save(dir.join(file)).unwrap();
    }

    #[test]
    fn test_load_names_from_file_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "bob.png", 100);
        save_gray(dir.path(), "alice.png", 150);

        let gallery = Gallery::load(dir.path(), &MeanExtractor).unwrap();
        let names: Vec<&str> = gallery.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_load_skips_non_image_files() {
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "alice.png", 150);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let gallery = Gallery::load(dir.path(), &MeanExtractor).unwrap();
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.identities()[0].name, "alice");
    }

    #[test]
    fn test_load_skips_files_with_no_embedding() {
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "alice.png", 150);
        save_gray(dir.path(), "blank.png", 0); // all black: extractor yields None

        let gallery = Gallery::load(dir.path(), &MeanExtractor).unwrap();
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.identities()[0].name, "alice");
    }

    #[test]
    fn test_load_name_collision_last_wins() {
        // alice.jpg sorts before alice.png, so the png embedding wins.
        let dir = tempfile::tempdir().unwrap();
        save_gray(dir.path(), "alice.jpg", 100);
        save_gray(dir.path(), "alice.png", 200);

        let gallery = Gallery::load(dir.path(), &MeanExtractor).unwrap();
        assert_eq!(gallery.len(), 1);
        let identity = &gallery.identities()[0];
        assert_eq!(identity.name, "alice");
        assert!((identity.embedding.values[0] - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_load_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");
        let result = Gallery::load(&missing, &MeanExtractor);
        assert!(matches!(result, Err(GalleryLoadError::Unreadable { .. })));
    }

    #[test]
    fn test_load_empty_directory_gives_empty_gallery() {
        let dir = tempfile::tempdir().unwrap();
        let gallery = Gallery::load(dir.path(), &MeanExtractor).unwrap();
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_new_applies_last_wins_dedup() {
        let gallery = Gallery::new(vec![
            Identity { name: "alice".into(), embedding: Embedding { values: vec![1.0] } },
            Identity { name: "bob".into(), embedding: Embedding { values: vec![2.0] } },
            Identity { name: "alice".into(), embedding: Embedding { values: vec![3.0] } },
        ]);
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.identities()[0].name, "alice");
        assert_eq!(gallery.identities()[0].embedding.values, vec![3.0]);
    }

    #[test]
    fn test_new_rejects_empty_names() {
        let gallery = Gallery::new(vec![Identity {
            name: String::new(),
            embedding: Embedding { values: vec![1.0] },
        }]);
        assert!(gallery.is_empty());
    }
}
