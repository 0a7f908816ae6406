//! Image decoding collaborator.

use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no image available at {}", .0.display())]
    Missing(PathBuf),
}

/// Turns a path into an 8-bit RGB pixel buffer.
pub trait ImageSource {
    fn load(&self, path: &Path) -> Result<RgbImage, ImageLoadError>;
}

/// Decodes files from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskImageSource;

impl ImageSource for DiskImageSource {
    fn load(&self, path: &Path) -> Result<RgbImage, ImageLoadError> {
        if !path.is_file() {
            return Err(ImageLoadError::Missing(path.to_path_buf()));
        }
        image::open(path)
            .map(|img| img.to_rgb8())
            .map_err(|source| ImageLoadError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }
}
