use thiserror::Error;

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested rank is outside `1..=len`.
    #[error("rank {rank} out of range 1..={len}")]
    OutOfRange {
        /// Requested rank.
        rank: u64,
        /// Number of elements in the list.
        len: u64,
    },
    /// No element has been inserted, so no root exists yet.
    #[error("root is not initialized; insert at least one key")]
    UninitializedRoot,
    /// Proof is structurally invalid and cannot be checked.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// Key is already present; keys are strictly ordered and never updated.
    #[error("key is already present")]
    DuplicateKey,
    /// Explicit tower height exceeds the configured maximum level.
    #[error("tower height {height} exceeds max level {max_level}")]
    InvalidHeight {
        /// Requested height.
        height: usize,
        /// Configured maximum level.
        max_level: usize,
    },
    /// A structural invariant does not hold.
    #[error("invariant violated: {0}")]
    Invariant(String),
}
