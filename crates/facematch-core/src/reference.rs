//! The user's chosen query faces.

use crate::extractor::FaceExtractor;
use crate::types::{BoundingBox, Embedding};
use image::{imageops, RgbImage};

/// Ordered, index-addressable set of reference faces.
///
/// Display crops and embeddings live in two lists that are only ever
/// mutated together, so `crops().len() == embeddings().len()` always holds.
#[derive(Debug, Default, Clone)]
pub struct ReferenceSet {
    crops: Vec<RgbImage>,
    embeddings: Vec<Embedding>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the extractor on `image` and keep every face it finds.
    ///
    /// Returns the number of faces added. Extractor failures and images
    /// without faces are logged and add nothing.
    pub fn add_from_image<E: FaceExtractor + ?Sized>(
        &mut self,
        image: &RgbImage,
        extractor: &mut E,
    ) -> usize {
        let faces = match extractor.extract(image) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!(error = %e, "face detection failed on reference image");
                return 0;
            }
        };

        if faces.is_empty() {
            tracing::warn!("no faces detected in reference image");
            return 0;
        }

        for face in &faces {
            self.push(crop(image, &face.bbox), face.embedding.clone());
        }
        tracing::info!(added = faces.len(), total = self.len(), "stored reference faces");
        faces.len()
    }

    /// Append one face. Keeps both lists in step.
    pub fn push(&mut self, crop: RgbImage, embedding: Embedding) {
        self.crops.push(crop);
        self.embeddings.push(embedding);
    }

    /// Remove the face at `index`; later faces shift down by one.
    ///
    /// Out-of-range indices are ignored. Returns whether a face was removed.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.len() {
            tracing::debug!(index, len = self.len(), "remove ignored: index out of range");
            return false;
        }
        self.crops.remove(index);
        self.embeddings.remove(index);
        true
    }

    pub fn clear(&mut self) {
        self.crops.clear();
        self.embeddings.clear();
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.crops.len(), self.embeddings.len());
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embeddings in insertion order; these drive matching.
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Cropped face regions, for display only.
    pub fn crops(&self) -> &[RgbImage] {
        &self.crops
    }
}

/// Copy the boxed region out of `image`. An empty box gives an empty crop.
pub fn crop(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    imageops::crop_imm(image, bbox.x1, bbox.y1, bbox.width(), bbox.height()).to_image()
}
