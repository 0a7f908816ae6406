use crate::types::{Embedding, Face};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default cosine-similarity cutoff. A face matches a reference only when
/// the similarity is strictly greater than this.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Decides whether every reference face is present among a photo's faces.
pub trait Matcher {
    fn all_present(&self, references: &[Embedding], faces: &[Face], threshold: f32) -> bool;
}

/// Each reference independently takes the first face above the threshold.
///
/// Two references may be satisfied by the same detected face.
pub struct GreedyMatcher;

impl Matcher for GreedyMatcher {
    fn all_present(&self, references: &[Embedding], faces: &[Face], threshold: f32) -> bool {
        references.iter().all(|reference| {
            faces
                .iter()
                .any(|face| reference.similarity(&face.embedding) > threshold)
        })
    }
}

/// Each detected face can stand in for at most one reference.
///
/// Maximum bipartite matching (augmenting paths) between references and
/// faces, with an edge wherever similarity is above the threshold.
pub struct ExclusiveMatcher;

impl ExclusiveMatcher {
    /// Try to give `reference` a face, re-seating earlier claims if needed.
    fn augment(
        reference: usize,
        edges: &[Vec<usize>],
        visited: &mut [bool],
        owner: &mut [Option<usize>],
    ) -> bool {
        for &face in &edges[reference] {
            if visited[face] {
                continue;
            }
            visited[face] = true;
            let free = match owner[face] {
                None => true,
                Some(other) => Self::augment(other, edges, visited, owner),
            };
            if free {
                owner[face] = Some(reference);
                return true;
            }
        }
        false
    }
}

impl Matcher for ExclusiveMatcher {
    fn all_present(&self, references: &[Embedding], faces: &[Face], threshold: f32) -> bool {
        if references.len() > faces.len() {
            return false;
        }

        let edges: Vec<Vec<usize>> = references
            .iter()
            .map(|reference| {
                faces
                    .iter()
                    .enumerate()
                    .filter(|(_, face)| reference.similarity(&face.embedding) > threshold)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let mut owner = vec![None; faces.len()];
        (0..references.len()).all(|reference| {
            let mut visited = vec![false; faces.len()];
            Self::augment(reference, &edges, &mut visited, &mut owner)
        })
    }
}

/// Which [`Matcher`] a scan uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    #[default]
    Greedy,
    Exclusive,
}

impl Matcher for MatchStrategy {
    fn all_present(&self, references: &[Embedding], faces: &[Face], threshold: f32) -> bool {
        match self {
            MatchStrategy::Greedy => GreedyMatcher.all_present(references, faces, threshold),
            MatchStrategy::Exclusive => ExclusiveMatcher.all_present(references, faces, threshold),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown match strategy {0:?} (expected \"greedy\" or \"exclusive\")")]
pub struct UnknownStrategy(pub String);

impl FromStr for MatchStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(MatchStrategy::Greedy),
            "exclusive" => Ok(MatchStrategy::Exclusive),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStrategy::Greedy => "greedy",
            MatchStrategy::Exclusive => "exclusive",
        })
    }
}
