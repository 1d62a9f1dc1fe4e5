//! Canonical encoding primitives for the skiproot authenticated skip list.
//!
//! Every byte string that participates in hashing is produced here: the
//! tagged, length-prefixed value codec, the SHA-256 digest type, and the
//! canonical JSON used to size serialized proofs.
//!
#![deny(missing_docs)]

/// Serde adapter for base64url byte fields.
pub mod b64;
/// Tagged, length-prefixed value encoding.
pub mod codec;
/// Digest type and hashing helpers.
pub mod digest;
/// RFC 8785 canonical JSON.
pub mod json;
/// Validation errors for canonical primitives.
pub mod validation;

pub use codec::{
    decode_all, encode, encode_into, encoded_len, try_encode, Canonical, CodecError, Decoder, Tag,
    Value,
};
pub use digest::{hash_value, sha256, Digest, DigestAlg, DIGEST_LEN};
pub use json::{to_canonical_json, CanonicalizationError};
pub use validation::ValidationError;
