use canonical_json::to_string;
use serde::Serialize;

/// Error returned when JSON canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Value could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// RFC 8785 canonicalization rejected the value.
    #[error("canonicalization failed: {0}")]
    Other(String),
}

/// RFC 8785 canonical JSON bytes for `value`.
///
/// Used wherever a byte count of a serialized structure must be stable
/// across runs and platforms.
pub fn to_canonical_json<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Vec<u8>, CanonicalizationError> {
    let value = serde_json::to_value(value)?;
    let canonical =
        to_string(&value).map_err(|err| CanonicalizationError::Other(err.to_string()))?;
    Ok(canonical.into_bytes())
}
