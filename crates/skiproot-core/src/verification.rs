//! Offline proof verification.
//!
//! Two modes exist and callers must pick one:
//!
//! - [`VerifyMode::Chained`] rebuilds every label on the path from the leaf
//!   commitment and compares the last one with the root. Stored raw bytes
//!   are not trusted, but they must still decode as a node preimage. This certifies that
//!   the leaf is committed under the root.
//! - [`VerifyMode::Replay`] only checks that the terminal step's stored raw
//!   bytes hash to the root. It measures the cost of a single root hash and
//!   says nothing about the leaf.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use skiproot_canonical::{decode_all, sha256, Canonical, Digest, Tag, Value};

use crate::errors::CoreError;
use crate::proof::{node_preimage, Direction, ProofStep, RankProof};
use crate::skiplist::AuthSkipList;

/// Verification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    /// Rebuild the hash chain from the leaf to the root.
    Chained,
    /// Hash the terminal step's raw bytes and compare with the root.
    Replay,
}

impl fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyMode::Chained => write!(f, "chained"),
            VerifyMode::Replay => write!(f, "replay"),
        }
    }
}

impl FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chained" => Ok(VerifyMode::Chained),
            "replay" => Ok(VerifyMode::Replay),
            other => Err(format!(
                "unknown verification mode '{}', expected 'chained' or 'replay'",
                other
            )),
        }
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Whether the proof checks out against the root.
    pub valid: bool,
    /// Preimage bytes hashed while checking.
    pub bytes_hashed: usize,
    /// Mode that produced this outcome.
    pub mode: VerifyMode,
}

/// Verifies `steps` for the element committed as `leaf` against `root`.
///
/// Structural problems (empty proof, undecodable raw bytes, impossible level
/// sequence) are errors; a well-formed proof that does not reach `root`
/// yields `valid: false`.
pub fn verify(
    root: &Digest,
    leaf: &Digest,
    steps: &[ProofStep],
    mode: VerifyMode,
) -> Result<Verification, CoreError> {
    match mode {
        VerifyMode::Chained => verify_chained(root, leaf, steps),
        VerifyMode::Replay => verify_replay(root, steps),
    }
}

/// Verifies a [`RankProof`] against `root`.
pub fn verify_proof(
    root: &Digest,
    proof: &RankProof,
    mode: VerifyMode,
) -> Result<Verification, CoreError> {
    verify(root, &proof.leaf, &proof.steps, mode)
}

fn verify_replay(root: &Digest, steps: &[ProofStep]) -> Result<Verification, CoreError> {
    let last = steps
        .last()
        .ok_or_else(|| CoreError::MalformedProof("proof has no steps".into()))?;
    if last.raw.is_empty() {
        return Err(CoreError::MalformedProof(
            "terminal step carries no raw bytes".into(),
        ));
    }
    check_preimage_shape(&last.raw)?;

    Ok(Verification {
        valid: sha256(&last.raw) == *root,
        bytes_hashed: last.raw.len(),
        mode: VerifyMode::Replay,
    })
}

fn verify_chained(
    root: &Digest,
    leaf: &Digest,
    steps: &[ProofStep],
) -> Result<Verification, CoreError> {
    let first = steps
        .first()
        .ok_or_else(|| CoreError::MalformedProof("proof has no steps".into()))?;
    if first.level != 0 || first.direction != Direction::Down {
        return Err(CoreError::MalformedProof(
            "first step must be a level-0 leaf".into(),
        ));
    }
    for (i, pair) in steps.windows(2).enumerate() {
        let expected = match pair[1].direction {
            Direction::Down => pair[0].level + 1,
            Direction::Right => pair[0].level,
        };
        if pair[1].level != expected {
            return Err(CoreError::MalformedProof(format!(
                "step {} is on level {}, expected {}",
                i + 1,
                pair[1].level,
                expected
            )));
        }
    }

    for (i, step) in steps.iter().enumerate() {
        if !step.raw.is_empty() {
            check_preimage_shape(&step.raw).map_err(|e| match e {
                CoreError::MalformedProof(msg) => {
                    CoreError::MalformedProof(format!("step {}: {}", i, msg))
                }
                other => other,
            })?;
        }
    }

    let mut running = *leaf;
    let mut bytes_hashed = 0;
    for step in steps {
        let (slot, right) = match step.direction {
            Direction::Down => (Some(&running), step.neighbor.as_ref()),
            Direction::Right => (step.neighbor.as_ref(), Some(&running)),
        };
        let preimage = node_preimage(step.level, step.rank, slot, right);
        bytes_hashed += preimage.len();
        running = sha256(&preimage);
    }

    Ok(Verification {
        valid: running == *root,
        bytes_hashed,
        mode: VerifyMode::Chained,
    })
}

/// Raw bytes must decode as `[Integer, Integer, Raw, Raw]` with 0- or
/// 32-byte digests.
fn check_preimage_shape(raw: &[u8]) -> Result<(), CoreError> {
    let values =
        decode_all(raw).map_err(|e| CoreError::MalformedProof(format!("raw bytes: {}", e)))?;
    let tags: Vec<Tag> = values.iter().map(Value::tag).collect();
    if tags != [Tag::Integer, Tag::Integer, Tag::Raw, Tag::Raw] {
        return Err(CoreError::MalformedProof(format!(
            "raw bytes have shape {:?}",
            tags
        )));
    }
    for value in &values[2..] {
        let len = value.as_raw().map_or(0, <[u8]>::len);
        if len != 0 && len != skiproot_canonical::DIGEST_LEN {
            return Err(CoreError::MalformedProof(format!(
                "raw bytes carry a {}-byte digest",
                len
            )));
        }
    }
    Ok(())
}

impl<K: Ord + Clone + Canonical> AuthSkipList<K> {
    /// Verifies `steps` against this list's current root.
    pub fn verify(
        &self,
        leaf: &Digest,
        steps: &[ProofStep],
        mode: VerifyMode,
    ) -> Result<Verification, CoreError> {
        let root = self.get_root()?;
        verify(&root, leaf, steps, mode)
    }
}
