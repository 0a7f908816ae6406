//! The scan loop: decide, photo by photo, whether every reference face is in it.

use crate::extractor::FaceExtractor;
use crate::matcher::{MatchStrategy, Matcher, DEFAULT_SIMILARITY_THRESHOLD};
use crate::results::ResultSequence;
use crate::source::ImageSource;
use crate::types::Embedding;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("no reference faces selected")]
    NoReferenceFaces,
    #[error("no folder selected")]
    NoFolderSelected,
    #[error("selected folder is no longer a directory: {}", .0.display())]
    FolderMissing(PathBuf),
}

/// Broad class of a [`MatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the user supplied is bad or gone.
    Input,
    /// The call was made before its prerequisites were in place.
    Precondition,
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::NoReferenceFaces | MatchError::NoFolderSelected => ErrorKind::Precondition,
            MatchError::FolderMissing(_) => ErrorKind::Input,
        }
    }
}

/// Counters for one scan, logged when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub matched: usize,
    pub unreadable: usize,
    pub faceless: usize,
}

/// Threshold plus matching strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub threshold: f32,
    pub strategy: MatchStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            strategy: MatchStrategy::default(),
        }
    }
}

/// Scan `candidates` in order and collect every photo containing all `references`.
///
/// Unreadable images and extractor failures skip that photo only. An empty
/// reference list is refused before any candidate is touched.
pub fn find_matches<I, S, E>(
    references: &[Embedding],
    candidates: I,
    source: &S,
    extractor: &mut E,
    options: &MatchOptions,
) -> Result<(ResultSequence, ScanSummary), MatchError>
where
    I: IntoIterator<Item = PathBuf>,
    S: ImageSource + ?Sized,
    E: FaceExtractor + ?Sized,
{
    if references.is_empty() {
        return Err(MatchError::NoReferenceFaces);
    }

    let mut results = ResultSequence::new();
    let mut summary = ScanSummary::default();

    for path in candidates {
        summary.scanned += 1;

        let image = match source.load(&path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable image");
                summary.unreadable += 1;
                continue;
            }
        };

        let faces = extractor.extract(&image).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "face detection failed; treating as no faces");
            Vec::new()
        });
        if faces.is_empty() {
            tracing::debug!(path = %path.display(), "no faces");
            summary.faceless += 1;
            continue;
        }

        let matched = options
            .strategy
            .all_present(references, &faces, options.threshold);
        tracing::debug!(path = %path.display(), faces = faces.len(), matched, "candidate evaluated");

        if matched {
            results.append(path);
            summary.matched += 1;
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        matched = summary.matched,
        unreadable = summary.unreadable,
        faceless = summary.faceless,
        strategy = %options.strategy,
        threshold = options.threshold,
        "scan complete"
    );

    Ok((results, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at_similarity, face, FixtureExtractor, FixtureSource};
    use std::path::Path;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn emb(values: &[f32]) -> Embedding {
        Embedding::normalized(values.to_vec())
    }

    fn collected(seq: &ResultSequence) -> Vec<&Path> {
        seq.iter().collect()
    }

    #[test]
    fn test_single_reference_scenario() {
        let source = FixtureSource::new().with_image("photo1.jpg", 1).with_image("photo2.jpg", 2);
        let mut extractor = FixtureExtractor::new()
            .with_faces(1, vec![at_similarity(0.9)])
            .with_faces(2, vec![at_similarity(0.1)]);

        let (results, summary) = find_matches(
            &[emb(&[1.0, 0.0])],
            paths(&["photo1.jpg", "photo2.jpg"]),
            &source,
            &mut extractor,
            &MatchOptions::default(),
        )
        .unwrap();

        assert_eq!(collected(&results), vec![Path::new("photo1.jpg")]);
        assert_eq!(summary, ScanSummary { scanned: 2, matched: 1, unreadable: 0, faceless: 0 });
    }

    #[test]
    fn test_all_references_must_co_occur() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let source = FixtureSource::new().with_image("photo3.jpg", 3).with_image("photo4.jpg", 4);
        let mut extractor = FixtureExtractor::new()
            .with_faces(3, vec![face(&[0.0, 0.1, 1.0]), face(&b), face(&a)])
            .with_faces(4, vec![face(&a), face(&[0.0, 0.0, 1.0])]);

        let (results, _) = find_matches(
            &[emb(&a), emb(&b)],
            paths(&["photo3.jpg", "photo4.jpg"]),
            &source,
            &mut extractor,
            &MatchOptions::default(),
        )
        .unwrap();

        assert_eq!(collected(&results), vec![Path::new("photo3.jpg")]);
    }

    #[test]
    fn test_results_keep_scan_order() {
        let source = FixtureSource::new()
            .with_image("c.jpg", 1)
            .with_image("a.jpg", 1)
            .with_image("b.jpg", 2);
        let mut extractor = FixtureExtractor::new()
            .with_faces(1, vec![face(&[1.0, 0.0])])
            .with_faces(2, vec![face(&[0.0, 1.0])]);

        let (results, _) = find_matches(
            &[emb(&[1.0, 0.0])],
            paths(&["c.jpg", "b.jpg", "a.jpg"]),
            &source,
            &mut extractor,
            &MatchOptions::default(),
        )
        .unwrap();

        assert_eq!(collected(&results), vec![Path::new("c.jpg"), Path::new("a.jpg")]);
    }

    #[test]
    fn test_empty_references_refused_before_io() {
        let source = FixtureSource::new().with_image("x.jpg", 1);
        let mut extractor = FixtureExtractor::new().with_faces(1, vec![face(&[1.0])]);

        let err = find_matches(&[], paths(&["x.jpg"]), &source, &mut extractor, &MatchOptions::default())
            .unwrap_err();

        assert!(matches!(err, MatchError::NoReferenceFaces));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(source.loads.get(), 0);
        assert_eq!(extractor.calls, 0);
    }

    #[test]
    fn test_empty_candidates_give_empty_results() {
        let mut extractor = FixtureExtractor::new();
        let (results, summary) = find_matches(
            &[emb(&[1.0, 0.0])],
            Vec::<PathBuf>::new(),
            &FixtureSource::new(),
            &mut extractor,
            &MatchOptions::default(),
        )
        .unwrap();
        assert!(results.is_empty());
        assert_eq!(summary, ScanSummary::default());
    }

    #[test]
    fn test_unreadable_and_failing_photos_are_skipped() {
        let source = FixtureSource::new()
            .with_image("boom.jpg", 9)
            .with_image("empty.jpg", 8)
            .with_image("good.jpg", 1);
        let mut extractor = FixtureExtractor::new()
            .with_failure(9)
            .with_faces(8, vec![])
            .with_faces(1, vec![face(&[1.0, 0.0])]);

        let (results, summary) = find_matches(
            &[emb(&[1.0, 0.0])],
            paths(&["missing.jpg", "boom.jpg", "empty.jpg", "good.jpg"]),
            &source,
            &mut extractor,
            &MatchOptions::default(),
        )
        .unwrap();

        assert_eq!(collected(&results), vec![Path::new("good.jpg")]);
        assert_eq!(summary, ScanSummary { scanned: 4, matched: 1, unreadable: 1, faceless: 2 });
    }

    #[test]
    fn test_strategy_changes_outcome_for_shared_face() {
        let source = FixtureSource::new().with_image("pair.jpg", 1);
        let refs = [emb(&[1.0, 0.2]), emb(&[0.2, 1.0])];

        let mut extractor = FixtureExtractor::new().with_faces(1, vec![face(&[1.0, 1.0])]);
        let (greedy, _) = find_matches(&refs, paths(&["pair.jpg"]), &source, &mut extractor, &MatchOptions::default())
            .unwrap();
        assert_eq!(greedy.len(), 1);

        let exclusive = MatchOptions { strategy: MatchStrategy::Exclusive, ..MatchOptions::default() };
        let (strict, _) = find_matches(&refs, paths(&["pair.jpg"]), &source, &mut extractor, &exclusive).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn test_threshold_option_is_honoured() {
        let source = FixtureSource::new().with_image("p.jpg", 1);
        let mut extractor = FixtureExtractor::new().with_faces(1, vec![at_similarity(0.6)]);
        let refs = [emb(&[1.0, 0.0])];

        let loose = MatchOptions { threshold: 0.5, ..MatchOptions::default() };
        let tight = MatchOptions { threshold: 0.7, ..MatchOptions::default() };
        assert_eq!(find_matches(&refs, paths(&["p.jpg"]), &source, &mut extractor, &loose).unwrap().0.len(), 1);
        assert_eq!(find_matches(&refs, paths(&["p.jpg"]), &source, &mut extractor, &tight).unwrap().0.len(), 0);
    }
}
