//! Matched photos as a circular, doubly linked sequence, plus the cursor
//! that browses it.
//!
//! Nodes live in a vector and link to each other by index. Once non-empty,
//! the ring is closed: the tail's successor is the head and the head's
//! predecessor is the tail.

use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node inside one [`ResultSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    path: PathBuf,
    prev: usize,
    next: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ResultSequence {
    nodes: Vec<Node>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl ResultSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a new node in after the tail and before the head. O(1).
    pub fn append(&mut self, path: impl Into<PathBuf>) -> NodeId {
        let id = self.nodes.len();
        match (self.head, self.tail) {
            (Some(head), Some(tail)) => {
                self.nodes.push(Node {
                    path: path.into(),
                    prev: tail,
                    next: head,
                });
                self.nodes[tail].next = id;
                self.nodes[head].prev = id;
                self.tail = Some(id);
            }
            _ => {
                self.nodes.push(Node {
                    path: path.into(),
                    prev: id,
                    next: id,
                });
                self.head = Some(id);
                self.tail = Some(id);
            }
        }
        NodeId(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head.map(NodeId)
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail.map(NodeId)
    }

    pub fn path(&self, id: NodeId) -> Option<&Path> {
        self.nodes.get(id.0).map(|n| n.path.as_path())
    }

    /// Successor of `id`; the tail's successor is the head.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).map(|n| NodeId(n.next))
    }

    /// Predecessor of `id`; the head's predecessor is the tail.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).map(|n| NodeId(n.prev))
    }

    /// Paths from head to tail, following the links once around.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            seq: self,
            at: self.head,
            remaining: self.len(),
        }
    }
}

pub struct Iter<'a> {
    seq: &'a ResultSequence,
    at: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let seq = self.seq;
        let node = &seq.nodes[self.at?];
        self.at = Some(node.next);
        self.remaining -= 1;
        Some(node.path.as_path())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a ResultSequence {
    type Item = &'a Path;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Diagnostic rendering: `a.jpg -> b.jpg -> c.jpg`.
impl fmt::Display for ResultSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(no results)");
        }
        for (i, path) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Position in a [`ResultSequence`], or nowhere when there are no results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowseCursor {
    at: Option<NodeId>,
}

impl BrowseCursor {
    /// Point at the head of `seq` (nowhere if it is empty).
    pub fn start(seq: &ResultSequence) -> Self {
        Self { at: seq.head() }
    }

    pub fn reset(&mut self) {
        self.at = None;
    }

    pub fn position(&self) -> Option<NodeId> {
        self.at
    }

    pub fn current<'a>(&self, seq: &'a ResultSequence) -> Option<&'a Path> {
        seq.path(self.at?)
    }

    /// Step forward, wrapping from tail to head. No-op without a position.
    pub fn next<'a>(&mut self, seq: &'a ResultSequence) -> Option<&'a Path> {
        self.at = self.at.and_then(|id| seq.next(id));
        self.current(seq)
    }

    /// Step back, wrapping from head to tail. No-op without a position.
    pub fn prev<'a>(&mut self, seq: &'a ResultSequence) -> Option<&'a Path> {
        self.at = self.at.and_then(|id| seq.prev(id));
        self.current(seq)
    }
}
