//! The face-analysis seam: image in, detected faces with embeddings out.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Face};
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

/// SCRFD detection model file name inside the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name inside the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Anything that can find faces in an RGB image and embed them.
///
/// Every returned [`Face`] carries a box clamped to the image and an
/// L2-normalized embedding.
pub trait FaceExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<Face>, ExtractorError>;
}

/// SCRFD + ArcFace extractor running both models through ONNX Runtime.
pub struct OnnxExtractor {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxExtractor {
    /// Load both models from `model_dir`. Fails fast if either is missing.
    pub fn load(model_dir: &Path) -> Result<Self, ExtractorError> {
        let detector_path = model_dir.join(DETECTOR_MODEL_FILE);
        let recognizer_path = model_dir.join(RECOGNIZER_MODEL_FILE);

        let detector = FaceDetector::load(&detector_path.to_string_lossy())?;
        let recognizer = FaceRecognizer::load(&recognizer_path.to_string_lossy())?;

        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceExtractor for OnnxExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<Face>, ExtractorError> {
        let (width, height) = image.dimensions();
        let detections = self.detector.detect(image)?;

        let mut faces = Vec::with_capacity(detections.len());
        for det in &detections {
            if det.landmarks.is_none() {
                tracing::debug!(score = det.score, "skipping detection without landmarks");
                continue;
            }
            let embedding = self.recognizer.extract(image, det)?;
            faces.push(Face {
                bbox: BoundingBox::clamped(det.x1, det.y1, det.x2, det.y2, width, height),
                embedding,
            });
        }

        tracing::debug!(detected = detections.len(), embedded = faces.len(), "extracted faces");
        Ok(faces)
    }
}
