//! One user's matching session: reference faces, the chosen folder, and the
//! results being browsed.

use crate::engine::{self, MatchError, MatchOptions, ScanSummary};
use crate::extractor::FaceExtractor;
use crate::reference::ReferenceSet;
use crate::results::{BrowseCursor, ResultSequence};
use crate::scanner;
use crate::source::{DiskImageSource, ImageSource};
use std::path::{Path, PathBuf};

/// Owns everything a scan reads or writes.
///
/// Scans take `&mut self`, so a session can never run two at once.
pub struct Session<E, S = DiskImageSource> {
    extractor: E,
    source: S,
    options: MatchOptions,
    references: ReferenceSet,
    folder: Option<PathBuf>,
    results: ResultSequence,
    cursor: BrowseCursor,
}

impl<E: FaceExtractor> Session<E> {
    /// Session decoding images from disk.
    pub fn new(extractor: E, options: MatchOptions) -> Self {
        Self::with_source(extractor, DiskImageSource, options)
    }
}

impl<E: FaceExtractor, S: ImageSource> Session<E, S> {
    pub fn with_source(extractor: E, source: S, options: MatchOptions) -> Self {
        Self {
            extractor,
            source,
            options,
            references: ReferenceSet::new(),
            folder: None,
            results: ResultSequence::new(),
            cursor: BrowseCursor::default(),
        }
    }

    /// Add every face found in the image at `path` as a reference.
    ///
    /// Returns how many faces were added; unreadable images add none.
    pub fn add_face(&mut self, path: &Path) -> usize {
        match self.source.load(path) {
            Ok(image) => self.references.add_from_image(&image, &mut self.extractor),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "reference image could not be loaded");
                0
            }
        }
    }

    /// Drop the reference at `index`. Out-of-range indices are ignored.
    pub fn remove_face(&mut self, index: usize) -> bool {
        self.references.remove(index)
    }

    /// Choose the folder to scan. A rejected folder keeps the previous choice.
    pub fn select_folder(&mut self, path: &Path) -> bool {
        let accepted = scanner::select_folder(path);
        if accepted {
            tracing::info!(path = %path.display(), "folder selected");
            self.folder = Some(path.to_path_buf());
        }
        accepted
    }

    /// Scan the selected folder for photos containing every reference face.
    ///
    /// On success the previous results are replaced and the cursor moves to
    /// the first match. On error the results and cursor are left alone.
    pub fn scan(&mut self) -> Result<ScanSummary, MatchError> {
        if self.references.is_empty() {
            return Err(MatchError::NoReferenceFaces);
        }
        let folder = self.folder.as_deref().ok_or(MatchError::NoFolderSelected)?;
        if !folder.is_dir() {
            return Err(MatchError::FolderMissing(folder.to_path_buf()));
        }

        tracing::info!(
            folder = %folder.display(),
            references = self.references.len(),
            "scanning folder"
        );
        let (results, summary) = engine::find_matches(
            self.references.embeddings(),
            scanner::enumerate(folder),
            &self.source,
            &mut self.extractor,
            &self.options,
        )?;

        self.results = results;
        self.cursor = BrowseCursor::start(&self.results);
        Ok(summary)
    }

    /// Move to the next match, wrapping from the last to the first.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Path> {
        self.cursor.next(&self.results)
    }

    pub fn prev(&mut self) -> Option<&Path> {
        self.cursor.prev(&self.results)
    }

    pub fn current(&self) -> Option<&Path> {
        self.cursor.current(&self.results)
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn results(&self) -> &ResultSequence {
        &self.results
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;
    use crate::fixtures::{at_similarity, face, FixtureExtractor, FixtureSource};
    use std::fs;

    const FACE_A: [f32; 2] = [1.0, 0.0];

    fn folder_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    fn file_names(seq: &ResultSequence) -> Vec<String> {
        seq.iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn session(
        source: FixtureSource,
        extractor: FixtureExtractor,
    ) -> Session<FixtureExtractor, FixtureSource> {
        Session::with_source(extractor, source, MatchOptions::default())
    }

    #[test]
    fn test_end_to_end_scan_and_browse() {
        let dir = folder_with(&["photo1.jpg", "photo2.jpg", "photo5.png", "notes.txt"]);
        let source = FixtureSource::new()
            .with_image("ref.png", 100)
            .with_image("photo1.jpg", 1)
            .with_image("photo2.jpg", 2)
            .with_image("photo5.png", 1);
        let extractor = FixtureExtractor::new()
            .with_faces(100, vec![face(&FACE_A)])
            .with_faces(1, vec![at_similarity(0.9)])
            .with_faces(2, vec![at_similarity(0.1)]);
        let mut s = session(source, extractor);

        assert_eq!(s.add_face(Path::new("ref.png")), 1);
        assert!(s.select_folder(dir.path()));
        let summary = s.scan().unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(file_names(s.results()), vec!["photo1.jpg", "photo5.png"]);
        assert!(s.current().unwrap().ends_with("photo1.jpg"));
        assert!(s.next().unwrap().ends_with("photo5.png"));
        assert!(s.next().unwrap().ends_with("photo1.jpg"));
        assert!(s.prev().unwrap().ends_with("photo5.png"));
    }

    #[test]
    fn test_scan_without_references_leaves_results_untouched() {
        let dir = folder_with(&["photo1.jpg"]);
        let source = FixtureSource::new().with_image("ref.png", 100).with_image("photo1.jpg", 1);
        let extractor = FixtureExtractor::new()
            .with_faces(100, vec![face(&FACE_A)])
            .with_faces(1, vec![face(&FACE_A)]);
        let mut s = session(source, extractor);

        s.add_face(Path::new("ref.png"));
        s.select_folder(dir.path());
        s.scan().unwrap();
        assert_eq!(s.results().len(), 1);

        s.remove_face(0);
        let loads_before = s.source.loads.get();
        let err = s.scan().unwrap_err();
        assert!(matches!(err, MatchError::NoReferenceFaces));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(s.source.loads.get(), loads_before);
        assert_eq!(s.results().len(), 1);
        assert!(s.current().is_some());
    }

    #[test]
    fn test_scan_without_folder_is_precondition_error() {
        let source = FixtureSource::new().with_image("ref.png", 100);
        let extractor = FixtureExtractor::new().with_faces(100, vec![face(&FACE_A)]);
        let mut s = session(source, extractor);
        s.add_face(Path::new("ref.png"));

        let err = s.scan().unwrap_err();
        assert!(matches!(err, MatchError::NoFolderSelected));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_scan_after_folder_removed_is_input_error() {
        let dir = folder_with(&["photo1.jpg"]);
        let source = FixtureSource::new().with_image("ref.png", 100);
        let extractor = FixtureExtractor::new().with_faces(100, vec![face(&FACE_A)]);
        let mut s = session(source, extractor);
        s.add_face(Path::new("ref.png"));
        assert!(s.select_folder(dir.path()));

        let path = dir.path().to_path_buf();
        dir.close().unwrap();

        let err = s.scan().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(matches!(err, MatchError::FolderMissing(p) if p == path));
    }

    #[test]
    fn test_rejected_folder_keeps_previous_selection() {
        let good = folder_with(&["a.jpg"]);
        let bad = folder_with(&["a.txt"]);
        let mut s = session(FixtureSource::new(), FixtureExtractor::new());

        assert!(s.select_folder(good.path()));
        assert!(!s.select_folder(bad.path()));
        assert_eq!(s.folder(), Some(good.path()));
    }

    #[test]
    fn test_bmp_folder_accepted_but_scan_finds_nothing() {
        let dir = folder_with(&["only.bmp"]);
        let source = FixtureSource::new().with_image("ref.png", 100).with_image("only.bmp", 1);
        let extractor = FixtureExtractor::new()
            .with_faces(100, vec![face(&FACE_A)])
            .with_faces(1, vec![face(&FACE_A)]);
        let mut s = session(source, extractor);
        s.add_face(Path::new("ref.png"));

        assert!(s.select_folder(dir.path()));
        let summary = s.scan().unwrap();
        assert_eq!(summary.scanned, 0);
        assert!(s.results().is_empty());
        assert_eq!(s.current(), None);
        assert_eq!(s.next(), None);
    }

    #[test]
    fn test_new_scan_replaces_results_and_resets_cursor() {
        let dir = folder_with(&["a.jpg", "b.jpg", "c.jpg"]);
        let source = FixtureSource::new()
            .with_image("alice.png", 100)
            .with_image("bob.png", 101)
            .with_image("a.jpg", 1)
            .with_image("b.jpg", 2)
            .with_image("c.jpg", 3);
        let alice = [1.0, 0.0, 0.0];
        let bob = [0.0, 1.0, 0.0];
        let extractor = FixtureExtractor::new()
            .with_faces(100, vec![face(&alice)])
            .with_faces(101, vec![face(&bob)])
            .with_faces(1, vec![face(&alice)])
            .with_faces(2, vec![face(&alice), face(&bob)])
            .with_faces(3, vec![face(&alice)]);
        let mut s = session(source, extractor);
        s.add_face(Path::new("alice.png"));
        s.select_folder(dir.path());

        s.scan().unwrap();
        assert_eq!(file_names(s.results()), vec!["a.jpg", "b.jpg", "c.jpg"]);
        s.next();
        s.next();
        assert!(s.current().unwrap().ends_with("c.jpg"));

        assert_eq!(s.add_face(Path::new("bob.png")), 1);
        s.scan().unwrap();
        assert_eq!(file_names(s.results()), vec!["b.jpg"]);
        assert!(s.current().unwrap().ends_with("b.jpg"));
        assert!(s.next().unwrap().ends_with("b.jpg"));
    }

    #[test]
    fn test_unreadable_reference_adds_nothing() {
        let mut s = session(FixtureSource::new(), FixtureExtractor::new());
        assert_eq!(s.add_face(Path::new("missing.png")), 0);
        assert!(s.references().is_empty());
    }

    #[test]
    fn test_remove_then_add_keeps_lists_in_step() {
        let source = FixtureSource::new().with_image("group.jpg", 100);
        let extractor = FixtureExtractor::new()
            .with_faces(100, vec![face(&[1.0, 0.0]), face(&[0.0, 1.0])]);
        let mut s = session(source, extractor);

        assert_eq!(s.add_face(Path::new("group.jpg")), 2);
        assert!(s.remove_face(0));
        assert!(!s.remove_face(5));
        assert_eq!(s.add_face(Path::new("group.jpg")), 2);

        let refs = s.references();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs.crops().len(), refs.embeddings().len());
    }
}
