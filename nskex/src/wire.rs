use std::io::{Read, Write};

use zeroize::Zeroizing;

use crate::identity::Identity;
use crate::keys::SymmetricKey;
use crate::nonce::Nonce;
use crate::proto::*;
use crate::result::WireError;

/// A bounds checked cursor reading protocol fields from a byte stream.
///
/// Over a channel a short read is `WireError::Truncated`. Over a slice, such as a decrypted
/// plaintext, it means the fields did not fit, see `WireError::in_plaintext`.
pub struct WireReader<R: Read> {
    inner: R,
    max_field_size: usize,
}

impl<R: Read> WireReader<R> {
    /// Read from `inner`, refusing any length prefix larger than `max_field_size`.
    pub fn new(inner: R, max_field_size: usize) -> Self {
        Self { inner, max_field_size }
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        self.inner.read_exact(&mut out)?;
        Ok(out)
    }

    /// Read a native-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_ne_bytes(self.read_array()?))
    }

    /// Read a length prefix and check it against the configured bound.
    pub fn read_len(&mut self) -> Result<usize, WireError> {
        let len = self.read_u32()? as usize;
        if len > self.max_field_size {
            return Err(WireError::Malformed);
        }
        Ok(len)
    }

    pub fn read_nonce(&mut self) -> Result<Nonce, WireError> {
        Ok(Nonce(self.read_array()?))
    }

    /// Read a 48 byte `key || iv` object.
    pub fn read_key(&mut self) -> Result<SymmetricKey, WireError> {
        let mut bytes = Zeroizing::new([0u8; KEY_OBJECT_SIZE]);
        self.inner.read_exact(bytes.as_mut())?;
        Ok(SymmetricKey::from_bytes(&bytes))
    }

    /// Read exactly `len` bytes into a freshly allocated buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        if len > self.max_field_size {
            return Err(WireError::Malformed);
        }
        let mut out = Vec::new();
        out.try_reserve_exact(len).map_err(|_| WireError::Allocation)?;
        out.resize(len, 0);
        self.inner.read_exact(&mut out)?;
        Ok(out)
    }

    /// Read a length prefixed field.
    pub fn read_field(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Read a length prefixed, NUL terminated identity.
    pub fn read_identity(&mut self) -> Result<Identity, WireError> {
        let len = self.read_len()?;
        if len < 2 || len > IDENTITY_MAX_ENCODED_SIZE {
            return Err(WireError::Malformed);
        }
        let mut encoded = [0u8; IDENTITY_MAX_ENCODED_SIZE];
        self.inner.read_exact(&mut encoded[..len])?;
        Identity::from_encoded(&encoded[..len]).ok_or(WireError::Malformed)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<'a> WireReader<&'a [u8]> {
    /// Check that every byte of the underlying slice was consumed.
    pub fn finish(self) -> Result<(), WireError> {
        if self.inner.is_empty() {
            Ok(())
        } else {
            Err(WireError::Malformed)
        }
    }
}

/// Builds a message buffer field by field.
///
/// The buffer is wiped on drop since plaintexts carry key objects.
#[derive(Default)]
pub struct WireWriter {
    buf: Zeroizing<Vec<u8>>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Zeroizing::new(Vec::with_capacity(capacity)) }
    }

    /// Append a native-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_ne_bytes());
    }

    /// Append a length prefix. Fails if `len` does not fit the 4 byte prefix.
    pub fn put_len(&mut self, len: usize) -> Result<(), WireError> {
        self.put_u32(u32::try_from(len).map_err(|_| WireError::Malformed)?);
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append `bytes` preceded by their length.
    pub fn put_field(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.put_len(bytes.len())?;
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn put_nonce(&mut self, nonce: &Nonce) {
        self.put_bytes(&nonce.0);
    }

    pub fn put_key(&mut self, key: &SymmetricKey) {
        self.put_bytes(key.to_bytes().as_ref());
    }

    /// Append an identity with its length prefix and NUL terminator.
    pub fn put_identity(&mut self, id: &Identity) {
        // Identities are at most IDENTITY_MAX_ENCODED_SIZE bytes so the prefix always fits.
        self.put_u32(id.encoded_len() as u32);
        self.put_bytes(id.as_bytes());
        self.buf.push(0);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Zeroizing<Vec<u8>> {
        self.buf
    }
}

/// Send a message that travels in the clear.
pub fn write_message<W: Write>(mut w: W, bytes: &[u8]) -> Result<(), WireError> {
    w.write_all(bytes)?;
    w.flush()?;
    Ok(())
}

/// Send an encrypted message: its length as a native-endian `u32`, then the ciphertext.
pub fn write_frame<W: Write>(mut w: W, ciphertext: &[u8]) -> Result<(), WireError> {
    let mut frame = WireWriter::with_capacity(LEN_SIZE + ciphertext.len());
    frame.put_field(ciphertext)?;
    w.write_all(frame.as_bytes())?;
    w.flush()?;
    Ok(())
}

/// Receive an encrypted message written by `write_frame`.
pub fn read_frame<R: Read>(r: R, max_field_size: usize) -> Result<Vec<u8>, WireError> {
    WireReader::new(r, max_field_size).read_field()
}

#[cfg(test)]
mod test {
    use super::*;

    fn reader(bytes: &[u8]) -> WireReader<&[u8]> {
        WireReader::new(bytes, DEFAULT_MAX_FIELD_SIZE)
    }

    #[test]
    fn lengths_are_native_endian() {
        let mut w = WireWriter::new();
        w.put_u32(13);
        assert_eq!(w.as_bytes(), &13u32.to_ne_bytes());
        assert_eq!(reader(w.as_bytes()).read_u32(), Ok(13));
    }

    #[test]
    fn identity_carries_terminator() {
        let id = Identity::new("Amal is Hope").unwrap();
        let mut w = WireWriter::new();
        w.put_identity(&id);
        assert_eq!(w.len(), LEN_SIZE + 13);
        assert_eq!(&w.as_bytes()[..4], &13u32.to_ne_bytes());
        assert_eq!(w.as_bytes()[16], 0);

        let mut r = reader(w.as_bytes());
        assert_eq!(r.read_identity(), Ok(id));
        assert_eq!(r.finish(), Ok(()));
    }

    #[test]
    fn identity_without_terminator_is_malformed() {
        let mut w = WireWriter::new();
        w.put_field(b"Basim").unwrap();
        assert_eq!(reader(w.as_bytes()).read_identity(), Err(WireError::Malformed));

        let mut w = WireWriter::new();
        w.put_field(b"\0").unwrap();
        assert_eq!(reader(w.as_bytes()).read_identity(), Err(WireError::Malformed));

        let mut w = WireWriter::new();
        w.put_field(&[b'x'; IDENTITY_MAX_ENCODED_SIZE + 1]).unwrap();
        assert_eq!(reader(w.as_bytes()).read_identity(), Err(WireError::Malformed));
    }

    #[test]
    fn short_input_is_truncated() {
        let mut w = WireWriter::new();
        w.put_u32(10);
        w.put_bytes(b"abc");
        assert_eq!(reader(w.as_bytes()).read_field(), Err(WireError::Truncated));
        assert_eq!(reader(&[1, 2]).read_u32(), Err(WireError::Truncated));
        assert_eq!(reader(&[0; 47]).read_key().map(|_| ()), Err(WireError::Truncated));
    }

    #[test]
    fn oversized_length_is_rejected_before_reading() {
        let mut w = WireWriter::new();
        w.put_u32(u32::MAX);
        assert_eq!(reader(w.as_bytes()).read_field(), Err(WireError::Malformed));

        let mut w = WireWriter::new();
        w.put_u32(64);
        w.put_bytes(&[7; 64]);
        assert_eq!(WireReader::new(w.as_bytes(), 63).read_field(), Err(WireError::Malformed));
        assert_eq!(WireReader::new(w.as_bytes(), 64).read_field(), Ok(vec![7; 64]));
    }

    #[test]
    fn finish_rejects_trailing_bytes() {
        let mut r = reader(&[1, 2, 3, 4, 5]);
        r.read_nonce().unwrap();
        assert_eq!(r.finish(), Err(WireError::Malformed));
    }

    #[test]
    fn frames_prefix_the_ciphertext_length() {
        let mut channel = Vec::new();
        write_frame(&mut channel, &[9; 32]).unwrap();
        assert_eq!(channel.len(), 36);
        assert_eq!(&channel[..4], &32u32.to_ne_bytes());
        assert_eq!(read_frame(channel.as_slice(), DEFAULT_MAX_FIELD_SIZE), Ok(vec![9; 32]));
        assert_eq!(read_frame(&channel[..20], DEFAULT_MAX_FIELD_SIZE), Err(WireError::Truncated));
        assert_eq!(read_frame(&[0u8; 0][..], DEFAULT_MAX_FIELD_SIZE), Err(WireError::Truncated));
    }
}
