//! Brightness-grid embedding extractor for development and diagnostics.
//!
//! Not a face recognizer: it summarizes an image as a normalized grid of
//! mean cell brightness, which is deterministic and cheap but carries no
//! identity semantics. Deployments implement [`EmbeddingExtractor`]
//! against a learned model; this backend keeps the rest of the system
//! exercisable without one.

use crate::gallery::EmbeddingExtractor;
use crate::types::Embedding;
use image::imageops::FilterType;
use image::DynamicImage;

const GRID_SIZE: u32 = 16;
const GRID_DIM: usize = (GRID_SIZE * GRID_SIZE) as usize;

/// Downsamples to a 16x16 brightness grid and L2-normalizes, yielding a
/// 256-dimensional embedding. Returns `None` for images with no signal
/// (all black).
pub struct GridExtractor;

impl GridExtractor {
    /// Embed a raw grayscale buffer (`width * height` bytes), the format
    /// frames arrive in. Returns `None` on a short buffer, empty
    /// dimensions, or zero signal.
    pub fn embed_raw(&self, data: &[u8], width: u32, height: u32) -> Option<Embedding> {
        let expected = (width as usize) * (height as usize);
        if width == 0 || height == 0 || data.len() < expected {
            return None;
        }

        let img = image::GrayImage::from_raw(width, height, data[..expected].to_vec())?;
        let cells = image::imageops::resize(&img, GRID_SIZE, GRID_SIZE, FilterType::Triangle);

        let mut values: Vec<f32> = cells.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        debug_assert_eq!(values.len(), GRID_DIM);

        let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return None;
        }
        for v in values.iter_mut() {
            *v /= norm;
        }

        Some(Embedding { values })
    }
}

impl EmbeddingExtractor for GridExtractor {
    fn extract(&self, image: &DynamicImage) -> Option<Embedding> {
        let gray = image.to_luma8();
        self.embed_raw(gray.as_raw(), gray.width(), gray.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> image::GrayImage {
        image::GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y) % 256) as u8]))
    }

    #[test]
    fn test_embedding_dimension() {
        let img = gradient_image(64, 48);
        let emb = GridExtractor.embed_raw(img.as_raw(), 64, 48).unwrap();
        assert_eq!(emb.dim(), GRID_DIM);
    }

    #[test]
    fn test_embedding_is_unit_length() {
        let img = gradient_image(64, 64);
        let emb = GridExtractor.embed_raw(img.as_raw(), 64, 64).unwrap();
        let norm: f32 = emb.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_identical_images_identical_embeddings() {
        let img = gradient_image(32, 32);
        let a = GridExtractor.embed_raw(img.as_raw(), 32, 32).unwrap();
        let b = GridExtractor.embed_raw(img.as_raw(), 32, 32).unwrap();
        assert!(a.euclidean_distance(&b).abs() < 1e-6);
    }

    #[test]
    fn test_different_images_differ() {
        let a_img = gradient_image(32, 32);
        let b_img = image::GrayImage::from_fn(32, 32, |x, _| if x < 16 { image::Luma([255]) } else { image::Luma([10]) });

        let a = GridExtractor.embed_raw(a_img.as_raw(), 32, 32).unwrap();
        let b = GridExtractor.embed_raw(b_img.as_raw(), 32, 32).unwrap();
        assert!(a.euclidean_distance(&b) > 0.01);
    }

    #[test]
    fn test_all_black_has_no_signal() {
        let data = vec![0u8; 32 * 32];
        assert!(GridExtractor.embed_raw(&data, 32, 32).is_none());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let data = vec![128u8; 10];
        assert!(GridExtractor.embed_raw(&data, 32, 32).is_none());
    }

    #[test]
    fn test_extract_matches_embed_raw() {
        let img = gradient_image(40, 30);
        let via_raw = GridExtractor.embed_raw(img.as_raw(), 40, 30).unwrap();
        let via_image = GridExtractor
            .extract(&DynamicImage::ImageLuma8(img))
            .unwrap();
        assert!(via_raw.euclidean_distance(&via_image).abs() < 1e-6);
    }
}
