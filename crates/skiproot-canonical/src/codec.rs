//! Tagged, length-prefixed canonical encoding.
//!
//! Every value is written as `tag (1 byte) || length (u32, big-endian) || payload`.
//! The tag disambiguates the value kind so that encodings of different kinds
//! never collide, and equal values always produce identical bytes.

use std::borrow::Cow;
use std::fmt;

use crate::digest::Digest;

/// Size of the `tag || length` prefix in bytes.
pub const HEADER_SIZE: usize = 5;

/// Tag byte for non-negative integers: `b'I'`.
pub const TAG_INTEGER: u8 = b'I';
/// Tag byte for UTF-8 text: `b'S'`.
pub const TAG_TEXT: u8 = b'S';
/// Tag byte for raw byte strings: `b'B'`.
pub const TAG_RAW: u8 = b'B';
/// Tag byte for the null marker: `b'N'`.
pub const TAG_NULL: u8 = b'N';

/// Errors raised while encoding or decoding canonical bytes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before a header or payload was complete.
    #[error("truncated value at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Offset where the incomplete value starts.
        offset: usize,
        /// Bytes required to finish the value.
        needed: usize,
        /// Bytes remaining in the input.
        available: usize,
    },
    /// Tag byte is not one of `I`, `S`, `B`, `N`.
    #[error("unknown tag 0x{tag:02x} at offset {offset}")]
    UnknownTag {
        /// Offset of the tag byte.
        offset: usize,
        /// Offending tag byte.
        tag: u8,
    },
    /// Integer payload carries leading zero bytes or is empty.
    #[error("non-minimal integer encoding at offset {offset}")]
    NonMinimalInteger {
        /// Offset of the value.
        offset: usize,
    },
    /// Integer payload does not fit in 128 bits.
    #[error("integer of {len} bytes at offset {offset} exceeds 128 bits")]
    IntegerOverflow {
        /// Offset of the value.
        offset: usize,
        /// Payload length.
        len: usize,
    },
    /// Text payload is not valid UTF-8.
    #[error("invalid UTF-8 text at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the value.
        offset: usize,
    },
    /// Null marker with a non-empty payload.
    #[error("null value with non-empty payload at offset {offset}")]
    NonEmptyNull {
        /// Offset of the value.
        offset: usize,
    },
    /// Payload longer than `u32::MAX` bytes.
    #[error("payload of {len} bytes exceeds the 32-bit length prefix")]
    LengthOverflow {
        /// Payload length.
        len: usize,
    },
}

/// Value kind carried in the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Non-negative integer, minimal big-endian magnitude.
    Integer,
    /// UTF-8 text.
    Text,
    /// Raw byte string.
    Raw,
    /// Absent value.
    Null,
}

impl Tag {
    /// Returns the tag for a byte, if known.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TAG_INTEGER => Some(Tag::Integer),
            TAG_TEXT => Some(Tag::Text),
            TAG_RAW => Some(Tag::Raw),
            TAG_NULL => Some(Tag::Null),
            _ => None,
        }
    }

    /// Returns the byte value for this tag.
    pub fn to_byte(self) -> u8 {
        match self {
            Tag::Integer => TAG_INTEGER,
            Tag::Text => TAG_TEXT,
            Tag::Raw => TAG_RAW,
            Tag::Null => TAG_NULL,
        }
    }
}

/// A value in canonical form, borrowing where it can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// Non-negative integer.
    Integer(u128),
    /// UTF-8 text.
    Text(Cow<'a, str>),
    /// Raw bytes.
    Raw(Cow<'a, [u8]>),
    /// Absent value.
    Null,
}

impl<'a> Value<'a> {
    /// Textual fallback for value kinds without a dedicated encoding.
    pub fn display(value: impl fmt::Display) -> Value<'static> {
        Value::Text(Cow::Owned(value.to_string()))
    }

    /// Borrowed raw bytes.
    pub fn raw(bytes: &'a [u8]) -> Self {
        Value::Raw(Cow::Borrowed(bytes))
    }

    /// Tag of this value.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Integer(_) => Tag::Integer,
            Value::Text(_) => Tag::Text,
            Value::Raw(_) => Tag::Raw,
            Value::Null => Tag::Null,
        }
    }

    /// Returns the integer, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<u128> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the bytes, if this is `Raw`.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Detaches the value from the input it was decoded from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Integer(n) => Value::Integer(n),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Raw(b) => Value::Raw(Cow::Owned(b.into_owned())),
            Value::Null => Value::Null,
        }
    }
}

/// Types with a canonical encoding.
pub trait Canonical {
    /// Canonical form of `self`.
    fn canonical_value(&self) -> Value<'_>;
}

macro_rules! canonical_uint {
    ($($ty:ty),*) => {
        $(
            impl Canonical for $ty {
                fn canonical_value(&self) -> Value<'_> {
                    Value::Integer(*self as u128)
                }
            }
        )*
    };
}

canonical_uint!(u8, u16, u32, u64, u128, usize);

impl Canonical for str {
    fn canonical_value(&self) -> Value<'_> {
        Value::Text(Cow::Borrowed(self))
    }
}

impl Canonical for String {
    fn canonical_value(&self) -> Value<'_> {
        Value::Text(Cow::Borrowed(self.as_str()))
    }
}

impl Canonical for [u8] {
    fn canonical_value(&self) -> Value<'_> {
        Value::raw(self)
    }
}

impl Canonical for Vec<u8> {
    fn canonical_value(&self) -> Value<'_> {
        Value::raw(self.as_slice())
    }
}

impl Canonical for Digest {
    fn canonical_value(&self) -> Value<'_> {
        Value::raw(self.as_bytes())
    }
}

impl<T: Canonical> Canonical for Option<T> {
    fn canonical_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.canonical_value(),
            None => Value::Null,
        }
    }
}

impl<T: Canonical + ?Sized> Canonical for &T {
    fn canonical_value(&self) -> Value<'_> {
        (**self).canonical_value()
    }
}

impl Canonical for Value<'_> {
    fn canonical_value(&self) -> Value<'_> {
        match self {
            Value::Integer(n) => Value::Integer(*n),
            Value::Text(s) => Value::Text(Cow::Borrowed(s.as_ref())),
            Value::Raw(b) => Value::Raw(Cow::Borrowed(b.as_ref())),
            Value::Null => Value::Null,
        }
    }
}

/// Minimal big-endian magnitude of `n`; zero is a single `0x00`.
fn integer_payload(n: u128) -> ([u8; 16], usize) {
    let bytes = n.to_be_bytes();
    let skip = (n.leading_zeros() / 8) as usize;
    let start = skip.min(15);
    (bytes, start)
}

/// Number of bytes `value` occupies once encoded.
pub fn encoded_len(value: &Value<'_>) -> usize {
    HEADER_SIZE
        + match value {
            Value::Integer(n) => 16 - integer_payload(*n).1,
            Value::Text(s) => s.len(),
            Value::Raw(b) => b.len(),
            Value::Null => 0,
        }
}

/// Appends the encoding of `value` to `buf`.
///
/// Payloads are assumed to fit the 32-bit length prefix; use [`try_encode`]
/// for untrusted sizes.
pub fn encode_into(buf: &mut Vec<u8>, value: &Value<'_>) {
    buf.reserve(encoded_len(value));
    buf.push(value.tag().to_byte());
    match value {
        Value::Integer(n) => {
            let (bytes, start) = integer_payload(*n);
            let payload = &bytes[start..];
            buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            buf.extend_from_slice(payload);
        }
        Value::Text(s) => {
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Raw(b) => {
            buf.extend_from_slice(&(b.len() as u32).to_be_bytes());
            buf.extend_from_slice(b);
        }
        Value::Null => buf.extend_from_slice(&0u32.to_be_bytes()),
    }
}

/// Canonical bytes for `value`.
pub fn encode<T: Canonical + ?Sized>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(&mut buf, &value.canonical_value());
    buf
}

/// Canonical bytes for `value`, rejecting payloads the length prefix cannot describe.
pub fn try_encode<T: Canonical + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let value = value.canonical_value();
    let len = encoded_len(&value) - HEADER_SIZE;
    if len > u32::MAX as usize {
        return Err(CodecError::LengthOverflow { len });
    }
    let mut buf = Vec::with_capacity(len + HEADER_SIZE);
    encode_into(&mut buf, &value);
    Ok(buf)
}

/// Streaming decoder over a sequence of concatenated canonical values.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether all input has been consumed.
    pub fn is_finished(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn read_value(&mut self) -> Result<Value<'a>, CodecError> {
        let input: &'a [u8] = self.input;
        let start = self.offset;
        let rest = &input[start..];
        if rest.len() < HEADER_SIZE {
            return Err(CodecError::Truncated {
                offset: start,
                needed: HEADER_SIZE,
                available: rest.len(),
            });
        }

        let tag = Tag::from_byte(rest[0]).ok_or(CodecError::UnknownTag {
            offset: start,
            tag: rest[0],
        })?;
        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        let body = &rest[HEADER_SIZE..];
        if body.len() < len {
            return Err(CodecError::Truncated {
                offset: start,
                needed: HEADER_SIZE + len,
                available: rest.len(),
            });
        }
        let payload = &body[..len];

        let value = match tag {
            Tag::Integer => {
                if len == 0 || (len > 1 && payload[0] == 0) {
                    return Err(CodecError::NonMinimalInteger { offset: start });
                }
                if len > 16 {
                    return Err(CodecError::IntegerOverflow { offset: start, len });
                }
                let mut bytes = [0u8; 16];
                bytes[16 - len..].copy_from_slice(payload);
                Value::Integer(u128::from_be_bytes(bytes))
            }
            Tag::Text => {
                let text = std::str::from_utf8(payload)
                    .map_err(|_| CodecError::InvalidUtf8 { offset: start })?;
                Value::Text(Cow::Borrowed(text))
            }
            Tag::Raw => Value::raw(payload),
            Tag::Null => {
                if len != 0 {
                    return Err(CodecError::NonEmptyNull { offset: start });
                }
                Value::Null
            }
        };

        self.offset = start + HEADER_SIZE + len;
        Ok(value)
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<Value<'a>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }
        let item = self.read_value();
        if item.is_err() {
            // Stop after the first error; the offset is no longer trustworthy.
            self.offset = self.input.len();
        }
        Some(item)
    }
}

/// Decodes every value in `input`.
pub fn decode_all(input: &[u8]) -> Result<Vec<Value<'_>>, CodecError> {
    Decoder::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_as_single_byte() {
        assert_eq!(encode(&0u64), vec![b'I', 0, 0, 0, 1, 0]);
    }

    #[test]
    fn integer_uses_minimal_big_endian() {
        assert_eq!(encode(&1999u64), vec![b'I', 0, 0, 0, 2, 0x07, 0xcf]);
        assert_eq!(encode(&255u8), vec![b'I', 0, 0, 0, 1, 0xff]);
        assert_eq!(encode(&256u32), vec![b'I', 0, 0, 0, 2, 0x01, 0x00]);
    }

    #[test]
    fn integer_width_does_not_affect_encoding() {
        assert_eq!(encode(&7u8), encode(&7u128));
        assert_eq!(encode(&7usize), encode(&7u64));
    }

    #[test]
    fn null_and_empty_raw_differ() {
        assert_eq!(encode(&None::<u64>), vec![b'N', 0, 0, 0, 0]);
        assert_eq!(encode(&Vec::<u8>::new()), vec![b'B', 0, 0, 0, 0]);
    }

    #[test]
    fn text_and_raw_never_collide() {
        assert_ne!(encode("ab"), encode(b"ab".as_slice()));
    }

    #[test]
    fn display_fallback_is_text() {
        let value = Value::display(-3i32);
        assert_eq!(encode(&value), encode("-3"));
    }

    #[test]
    fn decoder_reads_concatenated_values() {
        let mut buf = Vec::new();
        encode_into(&mut buf, &Value::Integer(3));
        encode_into(&mut buf, &Value::Text("hi".into()));
        encode_into(&mut buf, &Value::raw(&[1, 2]));
        encode_into(&mut buf, &Value::Null);

        let values = decode_all(&buf).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Integer(3),
                Value::Text("hi".into()),
                Value::raw(&[1, 2]),
                Value::Null
            ]
        );
    }

    #[test]
    fn decoder_rejects_truncated_payload() {
        let mut bytes = encode(b"abcd".as_slice());
        bytes.pop();
        assert!(matches!(
            decode_all(&bytes),
            Err(CodecError::Truncated { offset: 0, .. })
        ));
    }

    #[test]
    fn decoder_rejects_truncated_header() {
        assert!(matches!(
            decode_all(&[b'I', 0, 0]),
            Err(CodecError::Truncated { needed: 5, available: 3, .. })
        ));
    }

    #[test]
    fn decoder_rejects_unknown_tag() {
        assert_eq!(
            decode_all(&[b'X', 0, 0, 0, 0]),
            Err(CodecError::UnknownTag { offset: 0, tag: b'X' })
        );
    }

    #[test]
    fn decoder_rejects_leading_zero_integer() {
        assert_eq!(
            decode_all(&[b'I', 0, 0, 0, 2, 0, 1]),
            Err(CodecError::NonMinimalInteger { offset: 0 })
        );
        assert_eq!(
            decode_all(&[b'I', 0, 0, 0, 0]),
            Err(CodecError::NonMinimalInteger { offset: 0 })
        );
    }

    #[test]
    fn decoder_rejects_non_empty_null() {
        assert_eq!(
            decode_all(&[b'N', 0, 0, 0, 1, 0]),
            Err(CodecError::NonEmptyNull { offset: 0 })
        );
    }

    #[test]
    fn decoder_rejects_invalid_utf8() {
        assert_eq!(
            decode_all(&[b'S', 0, 0, 0, 1, 0xff]),
            Err(CodecError::InvalidUtf8 { offset: 0 })
        );
    }

    #[test]
    fn encoded_len_matches_output() {
        for value in [
            Value::Integer(0),
            Value::Integer(u128::MAX),
            Value::Text("héllo".into()),
            Value::raw(&[9; 32]),
            Value::Null,
        ] {
            let mut buf = Vec::new();
            encode_into(&mut buf, &value);
            assert_eq!(buf.len(), encoded_len(&value));
        }
    }
}
