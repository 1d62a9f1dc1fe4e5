//! Arena-allocated tower cells.

use skiproot_canonical::Digest;

/// Stable index of a node in the list's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One cell of a tower, or a per-level sentinel head when `key` is `None`.
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub(crate) level: usize,
    pub(crate) key: Option<K>,
    pub(crate) down: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) rank: u64,
    pub(crate) label: Option<Digest>,
    pub(crate) raw: Vec<u8>,
    pub(crate) leaf: Option<Digest>,
}

impl<K> Node<K> {
    pub(crate) fn head(level: usize) -> Self {
        Self::new(level, None)
    }

    pub(crate) fn new(level: usize, key: Option<K>) -> Self {
        Self {
            level,
            key,
            down: None,
            right: None,
            rank: 0,
            label: None,
            raw: Vec::new(),
            leaf: None,
        }
    }

    /// Level of this cell; 0 holds the elements.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Key, or `None` for a sentinel head.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Whether this is a sentinel head.
    pub fn is_head(&self) -> bool {
        self.key.is_none()
    }

    /// Cell directly beneath with the same key.
    pub fn down(&self) -> Option<NodeId> {
        self.down
    }

    /// Next cell on the same level.
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Base elements spanned by following `right` once; for heads, the sum of
    /// the real ranks on their level.
    pub fn rank(&self) -> u64 {
        self.rank
    }

    /// Commitment over [`raw_bytes`](Self::raw_bytes), once computed.
    pub fn label(&self) -> Option<&Digest> {
        self.label.as_ref()
    }

    /// Canonical preimage of the label; empty until computed.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Digest of the element's own encoding (level 0 only).
    pub fn leaf_commitment(&self) -> Option<&Digest> {
        self.leaf.as_ref()
    }

    pub(crate) fn clear_commitments(&mut self) {
        self.rank = 0;
        self.label = None;
        self.raw.clear();
    }
}
