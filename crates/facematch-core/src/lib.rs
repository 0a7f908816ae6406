//! facematch-core — find the photos in a folder where every chosen face appears.
//!
//! Faces are detected with SCRFD and embedded with ArcFace, both running via
//! ONNX Runtime on the CPU. Matching, folder scanning and result browsing
//! are independent of the models and work with any [`FaceExtractor`].

pub mod alignment;
pub mod detector;
pub mod engine;
pub mod extractor;
pub mod matcher;
pub mod recognizer;
pub mod reference;
pub mod results;
pub mod scanner;
pub mod session;
pub mod source;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use engine::{find_matches, ErrorKind, MatchError, MatchOptions, ScanSummary};
pub use extractor::{ExtractorError, FaceExtractor, OnnxExtractor};
pub use matcher::{MatchStrategy, Matcher, DEFAULT_SIMILARITY_THRESHOLD};
pub use reference::ReferenceSet;
pub use results::{BrowseCursor, ResultSequence};
pub use session::Session;
pub use source::{DiskImageSource, ImageLoadError, ImageSource};
pub use types::{BoundingBox, Embedding, Face};

use std::path::PathBuf;

/// Where the ONNX models live when `FACEMATCH_MODEL_DIR` is not set:
/// `$XDG_DATA_HOME/facematch/models`, falling back to `~/.local/share`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facematch")
        .join("models")
}
