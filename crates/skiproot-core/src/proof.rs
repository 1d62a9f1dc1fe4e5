//! Rank proofs and the node label preimage.

use serde::{Deserialize, Serialize};
use skiproot_canonical::{
    encode_into, encoded_len, to_canonical_json, Canonical, Digest, Value,
};

use crate::errors::CoreError;
use crate::node::NodeId;
use crate::skiplist::AuthSkipList;

/// Builds the canonical bytes hashed into a node label:
/// `encode(level) || encode(rank) || encode(slot) || encode(right)`.
///
/// `slot` is the leaf commitment at level 0 and the down child's label above
/// it. Absent digests encode as empty raw strings, never as null.
pub fn node_preimage(
    level: usize,
    rank: u64,
    slot: Option<&Digest>,
    right: Option<&Digest>,
) -> Vec<u8> {
    let values = [
        Value::Integer(level as u128),
        Value::Integer(rank as u128),
        digest_value(slot),
        digest_value(right),
    ];
    let mut buf = Vec::with_capacity(values.iter().map(encoded_len).sum());
    for value in &values {
        encode_into(&mut buf, value);
    }
    buf
}

fn digest_value(digest: Option<&Digest>) -> Value<'_> {
    match digest {
        Some(d) => Value::raw(d.as_bytes()),
        None => Value::raw(&[]),
    }
}

/// Which edge the path followed out of a node toward the leaf.
///
/// It also fixes where the running digest sits when the node's preimage is
/// rebuilt: in the down slot for `Down`, in the right slot for `Right`. The
/// leaf step is always `Down`, its slot holding the leaf commitment.
///
/// The leaf step serializes as `"dwn"` even though a base cell has no down
/// edge; tuples that mark the leaf `"rgt"` are rejected by chained verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Path continued along `right`.
    #[serde(rename = "rgt")]
    Right,
    /// Path continued along `down`.
    #[serde(rename = "dwn")]
    Down,
}

/// One node on a proof path, ordered leaf first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Level of the node.
    pub level: usize,
    /// The node's own rank.
    pub rank: u64,
    /// Edge taken toward the previous step.
    pub direction: Direction,
    /// Rank of the neighbor whose digest is supplied.
    pub neighbor_rank: u64,
    /// Digest for the slot the running digest does not occupy.
    pub neighbor: Option<Digest>,
    /// The node's label preimage as stored in the list.
    #[serde(with = "skiproot_canonical::b64")]
    pub raw: Vec<u8>,
}

/// Membership proof for the element at a given rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankProof {
    /// Rank the proof was requested for (informational; not certified).
    pub rank: u64,
    /// Commitment of the proven element.
    pub leaf: Digest,
    /// Path from the leaf to the root.
    pub steps: Vec<ProofStep>,
}

impl RankProof {
    /// Pretty JSON form.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::MalformedProof(format!("serialization failed: {}", e)))
    }

    /// Parses a proof; shape or type errors become [`CoreError::MalformedProof`].
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::MalformedProof(e.to_string()))
    }

    /// Size of the proof as canonical JSON.
    pub fn serialized_len(&self) -> Result<usize, CoreError> {
        to_canonical_json(self)
            .map(|bytes| bytes.len())
            .map_err(|e| CoreError::MalformedProof(e.to_string()))
    }

    /// Total bytes carried in the steps' raw preimages.
    pub fn raw_len(&self) -> usize {
        self.steps.iter().map(|s| s.raw.len()).sum()
    }
}

impl<K: Ord + Clone + Canonical> AuthSkipList<K> {
    /// Rank-guided descent from the top head to the `rank`-th element,
    /// returning every visited cell, top first.
    ///
    /// A cell is left rightward while the elements it spans still precede
    /// `rank`; heads span the elements before their level's first cell.
    fn path_to_rank(&self, rank: u64) -> Result<Vec<NodeId>, CoreError> {
        if rank == 0 || rank > self.len() {
            return Err(CoreError::OutOfRange {
                rank,
                len: self.len(),
            });
        }

        let mut path = Vec::new();
        let mut cur = self.top();
        let mut seen = 0u64;
        loop {
            path.push(cur);
            let node = self.node(cur);
            let span = if node.is_head() {
                self.lead(node.level())
            } else {
                node.rank()
            };
            if let Some(next) = node.right() {
                if seen + span < rank {
                    seen += span;
                    cur = next;
                    continue;
                }
            }
            match node.down() {
                Some(down) => cur = down,
                None => break,
            }
        }

        if self.node(cur).is_head() || seen + 1 != rank {
            return Err(CoreError::Invariant(format!(
                "descent for rank {} ended after {} elements",
                rank, seen
            )));
        }
        Ok(path)
    }

    /// Key holding the given 1-based rank.
    pub fn key_at_rank(&self, rank: u64) -> Result<&K, CoreError> {
        let path = self.path_to_rank(rank)?;
        path.last()
            .and_then(|&id| self.node(id).key())
            .ok_or_else(|| CoreError::Invariant("descent ended on a head".into()))
    }

    /// Leaf commitment of the element at `rank`.
    pub fn leaf_commitment_at(&self, rank: u64) -> Result<Digest, CoreError> {
        let path = self.path_to_rank(rank)?;
        path.last()
            .and_then(|&id| self.node(id).leaf_commitment().copied())
            .ok_or_else(|| CoreError::Invariant("leaf cell has no commitment".into()))
    }

    /// Membership proof for the element at `rank` (1-based).
    ///
    /// Steps run from the leaf to the top head. Each names the edge its node
    /// followed toward the leaf and supplies the digest of the other slot, so
    /// a verifier can rebuild every label from the leaf commitment upward.
    pub fn prove_at_rank(&self, rank: u64) -> Result<RankProof, CoreError> {
        let mut path = self.path_to_rank(rank)?;
        path.reverse();

        let leaf_node = self.node(path[0]);
        let leaf = *leaf_node
            .leaf_commitment()
            .ok_or_else(|| CoreError::Invariant("leaf cell has no commitment".into()))?;

        let mut steps = Vec::with_capacity(path.len());
        for (j, &id) in path.iter().enumerate() {
            let node = self.node(id);
            let direction = match j {
                0 => Direction::Down,
                _ if node.right() == Some(path[j - 1]) => Direction::Right,
                _ => Direction::Down,
            };

            let (neighbor_rank, neighbor) = match direction {
                Direction::Down => match node.right() {
                    Some(r) => (self.node(r).rank(), self.node(r).label().copied()),
                    None => (0, None),
                },
                Direction::Right if node.level() == 0 => match node.leaf_commitment() {
                    Some(commitment) => (1, Some(*commitment)),
                    None => (0, None),
                },
                Direction::Right => match node.down() {
                    Some(d) => (self.node(d).rank(), self.node(d).label().copied()),
                    None => (0, None),
                },
            };

            steps.push(ProofStep {
                level: node.level(),
                rank: node.rank(),
                direction,
                neighbor_rank,
                neighbor,
                raw: node.raw_bytes().to_vec(),
            });
        }

        Ok(RankProof { rank, leaf, steps })
    }
}
