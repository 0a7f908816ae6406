//! Deterministic stand-ins for decoding and inference.
//!
//! Images are 1×1 pixels whose red channel is a tag; the extractor maps tags
//! to canned faces.

use crate::detector::DetectorError;
use crate::extractor::{ExtractorError, FaceExtractor};
use crate::source::{ImageLoadError, ImageSource};
use crate::types::{BoundingBox, Embedding, Face};
use image::{Rgb, RgbImage};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

pub fn tagged_image(tag: u8) -> RgbImage {
    RgbImage::from_pixel(1, 1, Rgb([tag, 0, 0]))
}

pub fn face(values: &[f32]) -> Face {
    Face {
        bbox: BoundingBox { x1: 0, y1: 0, x2: 1, y2: 1 },
        embedding: Embedding::normalized(values.to_vec()),
    }
}

/// Unit vector at `cos` similarity to `[1, 0]`.
pub fn at_similarity(cos: f32) -> Face {
    face(&[cos, (1.0 - cos * cos).max(0.0).sqrt()])
}

#[derive(Default)]
pub struct FixtureExtractor {
    faces: HashMap<u8, Option<Vec<Face>>>,
    pub calls: usize,
}

impl FixtureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faces(mut self, tag: u8, faces: Vec<Face>) -> Self {
        self.faces.insert(tag, Some(faces));
        self
    }

    pub fn with_failure(mut self, tag: u8) -> Self {
        self.faces.insert(tag, None);
        self
    }
}

impl FaceExtractor for FixtureExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<Face>, ExtractorError> {
        self.calls += 1;
        let tag = image.get_pixel(0, 0)[0];
        match self.faces.get(&tag) {
            Some(Some(faces)) => Ok(faces.clone()),
            Some(None) => Err(DetectorError::InferenceFailed(format!("fixture tag {tag}")).into()),
            None => Ok(Vec::new()),
        }
    }
}

/// Maps file names to tagged images; unknown names fail to load.
#[derive(Default)]
pub struct FixtureSource {
    tags: HashMap<String, u8>,
    pub loads: Cell<usize>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: &str, tag: u8) -> Self {
        self.tags.insert(name.to_string(), tag);
        self
    }
}

impl ImageSource for FixtureSource {
    fn load(&self, path: &Path) -> Result<RgbImage, ImageLoadError> {
        self.loads.set(self.loads.get() + 1);
        path.file_name()
            .and_then(|n| self.tags.get(&*n.to_string_lossy()))
            .map(|&tag| tagged_image(tag))
            .ok_or_else(|| ImageLoadError::Missing(path.to_path_buf()))
    }
}
