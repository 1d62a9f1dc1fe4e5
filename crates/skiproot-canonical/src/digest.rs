use std::fmt;
use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::codec::{encode, Canonical};
use crate::validation::ValidationError;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256, the only commitment hash.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// A 256-bit commitment.
///
/// Serialized as `{"alg": "sha-256", "b64": "<base64url, no padding>"}`;
/// displayed as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

fn b64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{43}$").expect("invalid regex"))
}

impl Digest {
    /// Wraps raw digest bytes.
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Copies a digest out of a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let array: [u8; DIGEST_LEN] =
            bytes
                .try_into()
                .map_err(|_| ValidationError::InvalidLength {
                    field: "digest",
                    expected: DIGEST_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Parses 64 hex characters.
    pub fn from_hex(text: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(text.trim()).map_err(|_| ValidationError::PatternMismatch {
            field: "digest_hex",
            value: text.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses base64url (no padding).
    pub fn from_b64(text: &str) -> Result<Self, ValidationError> {
        if !b64_pattern().is_match(text) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: text.to_string(),
            });
        }
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(text)
            .map_err(|_| ValidationError::PatternMismatch {
                field: "digest",
                value: text.to_string(),
            })?;
        Self::from_slice(&bytes)
    }

    /// Base64url (no padding) form.
    pub fn to_b64(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

#[derive(Serialize, Deserialize)]
struct DigestRepr {
    alg: DigestAlg,
    b64: String,
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DigestRepr {
            alg: DigestAlg::Sha256,
            b64: self.to_b64(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DigestRepr::deserialize(deserializer)?;
        Digest::from_b64(&repr.b64).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of `bytes`.
pub fn sha256(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hasher.finalize().into())
}

/// SHA-256 of the canonical encoding of `value`.
pub fn hash_value<T: Canonical + ?Sized>(value: &T) -> Digest {
    sha256(&encode(value))
}
