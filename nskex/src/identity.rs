use std::fmt;

use arrayvec::ArrayVec;

use crate::proto::*;

/// The name of a principal, as registered with the key distribution center.
///
/// On the wire an identity is a C string: its bytes followed by a single NUL, preceded by a length
/// prefix that counts the NUL. The NUL is not stored here. Identities are compared by exact byte
/// match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity(ArrayVec<u8, IDENTITY_MAX_SIZE>);

impl Identity {
    /// Create an identity from its raw bytes.
    ///
    /// Returns `None` if `id` is empty, longer than `IDENTITY_MAX_SIZE`, or contains a NUL byte
    /// (which would truncate it on the wire).
    pub fn new(id: impl AsRef<[u8]>) -> Option<Self> {
        let id = id.as_ref();
        if id.is_empty() || id.contains(&0) {
            return None;
        }
        let mut bytes = ArrayVec::new();
        bytes.try_extend_from_slice(id).ok()?;
        Some(Self(bytes))
    }

    /// Parse an identity from its encoded form, which must end in its one and only NUL.
    pub(crate) fn from_encoded(encoded: &[u8]) -> Option<Self> {
        match encoded.split_last() {
            Some((0, id)) => Self::new(id),
            _ => None,
        }
    }

    /// The bytes of this identity, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes this identity occupies on the wire, terminator included.
    /// This is the value written into its length prefix.
    pub fn encoded_len(&self) -> usize {
        self.0.len() + 1
    }
}

impl TryFrom<&str> for Identity {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&String::from_utf8_lossy(&self.0)).finish()
    }
}
