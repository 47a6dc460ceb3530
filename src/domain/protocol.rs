//! Peer Wire Protocol
//!
//! Request/response shapes exchanged between peers. The response body is
//! protobuf-compatible (`message Response { bytes value = 1; }`) so nodes
//! interoperate with other implementations of the same protocol.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Ask a peer for `key` in `group`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub group: String,
    pub key: String,
}

impl FetchRequest {
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
        }
    }
}

/// Value returned by a peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub value: Bytes,
}

/// Field 1, wire type 2 (length-delimited)
const VALUE_TAG: u64 = (1 << 3) | 2;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

impl FetchResponse {
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Serialize to the protobuf wire format. Empty values are omitted, as
    /// proto3 does for default scalars.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.value.len() + 6);
        if !self.value.is_empty() {
            put_varint(&mut buf, VALUE_TAG);
            put_varint(&mut buf, self.value.len() as u64);
            buf.put_slice(&self.value);
        }
        buf.freeze()
    }

    /// Parse from the protobuf wire format, skipping unknown fields
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        let mut response = FetchResponse::default();

        while buf.has_remaining() {
            let tag = get_varint(&mut buf)?;
            let field = tag >> 3;
            match tag & 0x7 {
                WIRE_LEN => {
                    let len = get_varint(&mut buf)? as usize;
                    if buf.remaining() < len {
                        return Err(Error::Decode(format!(
                            "field {} wants {} bytes, {} left",
                            field,
                            len,
                            buf.remaining()
                        )));
                    }
                    let data = buf.split_to(len);
                    if field == 1 {
                        response.value = data;
                    }
                }
                WIRE_VARINT => {
                    get_varint(&mut buf)?;
                }
                WIRE_FIXED64 => skip(&mut buf, 8)?,
                WIRE_FIXED32 => skip(&mut buf, 4)?,
                other => {
                    return Err(Error::Decode(format!(
                        "unsupported wire type {} for field {}",
                        other, field
                    )))
                }
            }
        }

        Ok(response)
    }
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn get_varint(buf: &mut Bytes) -> Result<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        if !buf.has_remaining() {
            return Err(Error::Decode("truncated varint".into()));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Decode("varint overflow".into()))
}

fn skip(buf: &mut Bytes, n: usize) -> Result<()> {
    if buf.remaining() < n {
        return Err(Error::Decode("truncated fixed-width field".into()));
    }
    buf.advance(n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_encode_matches_protobuf_layout() {
        let encoded = FetchResponse::new(Bytes::from_static(b"100")).encode();
        assert_eq!(&encoded[..], &[0x0a, 0x03, b'1', b'0', b'0']);
    }

    #[test]
    fn test_empty_value_encodes_to_nothing() {
        let encoded = FetchResponse::default().encode();
        assert!(encoded.is_empty());
        assert_eq!(FetchResponse::decode(encoded).unwrap(), FetchResponse::default());
    }

    #[test]
    fn test_long_value_uses_multibyte_length() {
        let value = Bytes::from(vec![7u8; 300]);
        let encoded = FetchResponse::new(value.clone()).encode();
        // 300 = 0b10_0101100 -> 0xAC 0x02
        assert_eq!(&encoded[..3], &[0x0a, 0xAC, 0x02]);
        assert_eq!(FetchResponse::decode(encoded).unwrap().value, value);
    }

    #[test]
    fn test_decode_skips_unknown_fields() {
        let mut raw = BytesMut::new();
        // field 2 varint 150
        raw.put_slice(&[0x10, 0x96, 0x01]);
        // field 3 fixed32
        raw.put_slice(&[0x1d, 1, 2, 3, 4]);
        // field 1 bytes "ok"
        raw.put_slice(&[0x0a, 0x02, b'o', b'k']);
        // field 4 length-delimited
        raw.put_slice(&[0x22, 0x01, 0xff]);

        let response = FetchResponse::decode(raw.freeze()).unwrap();
        assert_eq!(&response.value[..], b"ok");
    }

    #[test]
    fn test_decode_rejects_truncated_value() {
        let raw = Bytes::from_static(&[0x0a, 0x05, b'a', b'b']);
        assert_matches!(FetchResponse::decode(raw), Err(Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_truncated_varint() {
        let raw = Bytes::from_static(&[0x0a, 0x80]);
        assert_matches!(FetchResponse::decode(raw), Err(Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_group_wire_types() {
        let raw = Bytes::from_static(&[0x0b]);
        assert_matches!(FetchResponse::decode(raw), Err(Error::Decode(_)));
    }

    #[test]
    fn test_request_new() {
        let req = FetchRequest::new("scores", "zurich");
        assert_eq!(req.group, "scores");
        assert_eq!(req.key, "zurich");
    }
}
