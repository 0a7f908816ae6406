//! Folder selection and candidate enumeration.
//!
//! Two extension filters are in play. Selecting a folder accepts anything
//! that looks like an image; scanning only hands JPEG and PNG files to the
//! matcher.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions that make a folder acceptable at selection time.
pub const SELECTABLE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// Extensions of the files actually scanned for faces.
pub const SCANNABLE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether `path`'s extension is in `allowed`, ignoring case.
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Regular files directly inside `dir` with an allowed extension, in file-name order.
fn image_files<'a>(dir: &Path, allowed: &'a [&'a str]) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(move |path| has_extension(path, allowed))
}

/// Accept `path` only if it is an existing directory holding at least one
/// file with a [`SELECTABLE_EXTENSIONS`] extension. Reads no file content.
pub fn select_folder(path: &Path) -> bool {
    if !path.is_dir() {
        tracing::warn!(path = %path.display(), "folder rejected: not a directory");
        return false;
    }
    if image_files(path, &SELECTABLE_EXTENSIONS).next().is_none() {
        tracing::warn!(path = %path.display(), "folder rejected: no image files");
        return false;
    }
    true
}

/// Lazily list the scan candidates in `path`: files with a
/// [`SCANNABLE_EXTENSIONS`] extension, non-recursive, sorted by file name.
pub fn enumerate(path: &Path) -> impl Iterator<Item = PathBuf> {
    image_files(path, &SCANNABLE_EXTENSIONS)
}
