//! Tagged-field tuple encoding.
//!
//! A tuple is the concatenation of its fields, each a one-byte tag
//! followed by a little-endian payload:
//! ```text
//! Tag  Type     Payload
//! ---  -------  -------
//! 0    null     (none)
//! 1    int32    4 bytes
//! 2    int64    8 bytes
//! 3    bool     1 byte (0 = false)
//! 4    text     2-byte length, then that many UTF-8 bytes
//! ```
//! Writers and readers of table pages share this format; it is the
//! boundary between the storage layer and the query engine.

use crate::common::{Error, Result};

use super::Value;

/// Encode a row.
///
/// # Errors
/// Returns `Error::InvalidArgument` for text longer than `u16::MAX` bytes.
pub fn encode_tuple(values: &[Value]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(values.iter().map(Value::encoded_len).sum());

    for value in values {
        out.push(value.tag());
        match value {
            Value::Null => {}
            Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::BigInt(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Text(s) => {
                let len = u16::try_from(s.len()).map_err(|_| {
                    Error::InvalidArgument(format!(
                        "text of {} bytes exceeds the {} byte limit",
                        s.len(),
                        u16::MAX
                    ))
                })?;
                out.extend_from_slice(&len.to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    Ok(out)
}

/// Decode a row written by [`encode_tuple`].
///
/// # Errors
/// Returns `Error::Format` for an unknown tag, a truncated field, or text
/// that is not valid UTF-8.
pub fn decode_tuple(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut reader = Reader { bytes, pos: 0 };
    let mut row = Vec::new();

    while let Some(tag) = reader.next_byte() {
        let value = match tag {
            Value::TAG_NULL => Value::Null,
            Value::TAG_INT => Value::Int(i32::from_le_bytes(reader.take_array()?)),
            Value::TAG_BIGINT => Value::BigInt(i64::from_le_bytes(reader.take_array()?)),
            Value::TAG_BOOL => Value::Bool(reader.take_array::<1>()?[0] != 0),
            Value::TAG_TEXT => {
                let len = u16::from_le_bytes(reader.take_array()?) as usize;
                let raw = reader.take(len)?;
                let text = std::str::from_utf8(raw)
                    .map_err(|e| Error::Format(format!("text field is not UTF-8: {}", e)))?;
                Value::Text(text.to_string())
            }
            other => {
                return Err(Error::Format(format!(
                    "bad tag {} at byte {}",
                    other,
                    reader.pos - 1
                )))
            }
        };
        row.push(value);
    }

    Ok(row)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            Error::Format(format!(
                "truncated field: need {} bytes at {}, tuple is {} bytes",
                len,
                self.pos,
                self.bytes.len()
            ))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode_tuple(&[Value::Int(1), Value::Null, Value::from("hi")]).unwrap();
        assert_eq!(bytes, vec![1, 1, 0, 0, 0, 0, 4, 2, 0, b'h', b'i']);
    }

    #[test]
    fn test_decode_mixed_row() {
        let row = vec![
            Value::Int(-7),
            Value::BigInt(1 << 40),
            Value::Bool(true),
            Value::Null,
            Value::from("naïve"),
            Value::Bool(false),
        ];
        let bytes = encode_tuple(&row).unwrap();
        assert_eq!(bytes.len(), row.iter().map(Value::encoded_len).sum::<usize>());
        assert_eq!(decode_tuple(&bytes).unwrap(), row);
    }

    #[test]
    fn test_empty_tuple() {
        assert!(encode_tuple(&[]).unwrap().is_empty());
        assert!(decode_tuple(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_bad_tag() {
        let err = decode_tuple(&[0, 9]).unwrap_err();
        assert!(matches!(err, Error::Format(msg) if msg.contains("bad tag 9 at byte 1")));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode_tuple(&[1, 0, 0]), Err(Error::Format(_))));
        assert!(matches!(decode_tuple(&[4, 5, 0, b'a']), Err(Error::Format(_))));
        assert!(matches!(decode_tuple(&[3]), Err(Error::Format(_))));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(
            decode_tuple(&[4, 1, 0, 0xFF]),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_encode_text_too_long() {
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            encode_tuple(&[Value::Text(long)]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
