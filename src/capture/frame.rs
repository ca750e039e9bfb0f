//! Encoded frame type

use bytes::Bytes;

/// One encoded JPEG image
///
/// Cheap to clone: every listener served in a tick shares the same
/// reference-counted buffer, and nothing can mutate it after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Wrap an encoded buffer
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Encoded bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length in bytes, as advertised in `Content-Length`
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        let frame = Frame::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(frame.len(), 4);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let frame = Frame::from(Bytes::from_static(b"jpeg"));
        let copy = frame.clone();
        assert_eq!(frame.data().as_ptr(), copy.data().as_ptr());
    }
}
