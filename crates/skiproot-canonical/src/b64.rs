//! Serde adapter that writes byte strings as base64url without padding.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Frame {
//!     #[serde(with = "skiproot_canonical::b64")]
//!     raw: Vec<u8>,
//! }
//!
//! let json = serde_json::to_string(&Frame { raw: vec![0xfb, 0xff] })?;
//! assert_eq!(json, r#"{"raw":"-_8"}"#);
//! # Ok::<(), serde_json::Error>(())
//! ```

use base64::Engine;
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes `bytes` as base64url text.
pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Deserializes base64url text into bytes.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(text.as_bytes())
        .map_err(serde::de::Error::custom)
}
