//! Authenticated skip list with rank proofs.
//!
//! This crate provides:
//! - An arena-backed skip list whose every cell carries a rank and a SHA-256
//!   label over its canonical preimage
//! - Root computation, either fully or incrementally along the insert path
//! - Rank-guided descent producing membership proofs for the k-th element
//! - Offline verification in a chained (leaf-to-root) or replay mode
//!
//! Core invariants:
//! - Keys are strictly increasing on every level; duplicates are rejected
//! - A cell's rank is the number of base elements it spans to its right
//!   neighbor; a head's rank sums its level's real ranks, so the base head's
//!   rank is the element count
//! - `label = H(encode(level) || encode(rank) || encode(slot) || encode(right))`
//! - The root is the top head's label and is deterministic given keys and heights
//!
#![deny(missing_docs)]

/// List configuration.
pub mod config;
/// Error types for core operations.
pub mod errors;
/// Tower height sampling.
pub mod height;
/// Arena cells.
pub mod node;
/// Rank proofs and the label preimage.
pub mod proof;
/// The authenticated skip list.
pub mod skiplist;
/// Proof verification.
pub mod verification;

pub use config::{RecomputeStrategy, SkipListConfig};
pub use errors::CoreError;
pub use height::{CoinFlips, FixedHeights, HeightSampler};
pub use node::{Node, NodeId};
pub use proof::{node_preimage, Direction, ProofStep, RankProof};
pub use skiplist::{AuthSkipList, Counters};
pub use verification::{verify, verify_proof, Verification, VerifyMode};
