//! Immutable view over a cached value

use std::fmt;

use bytes::Bytes;

use super::lru::ByteLen;

/// Immutable byte payload of one cached value.
///
/// Backed by reference-counted [`Bytes`], so clones are cheap and no caller
/// can mutate the stored buffer. [`ByteView::byte_slice`] hands out an owned
/// copy for callers that need a `Vec<u8>`.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    buf: Bytes,
}

impl ByteView {
    /// Create a view, taking ownership of the buffer
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Create a view from a borrowed slice (copies)
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            buf: Bytes::copy_from_slice(data),
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when the value has no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Owned copy of the bytes
    pub fn byte_slice(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Shared handle to the underlying bytes
    pub fn bytes(&self) -> Bytes {
        self.buf.clone()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<&'static str> for ByteView {
    fn from(s: &'static str) -> Self {
        Self::new(Bytes::from_static(s.as_bytes()))
    }
}

impl ByteLen for ByteView {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.buf))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_view_len_and_string() {
        let view = ByteView::from("100");
        assert_eq!(view.len(), 3);
        assert!(!view.is_empty());
        assert_eq!(view.to_string(), "100");
    }

    #[test]
    fn test_byte_slice_is_a_copy() {
        let view = ByteView::copy_from_slice(b"value");
        let mut copy = view.byte_slice();
        copy[0] = b'X';

        assert_eq!(view.as_ref(), b"value");
        assert_eq!(copy, b"Xalue");
    }

    #[test]
    fn test_default_is_empty() {
        let view = ByteView::default();
        assert!(view.is_empty());
        assert_eq!(view.byte_len(), 0);
    }
}
