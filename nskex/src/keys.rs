use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::crypto::*;
use crate::proto::KEY_OBJECT_SIZE;

/// Number of leading bytes of the SHA-256 of a key object used as its fingerprint.
pub const KEY_FINGERPRINT_SIZE: usize = 8;

/// An AES-256-CBC key together with the IV it is always used with.
///
/// This is both the shape of a principal's long-term key with the KDC and of a session key.
/// On the wire and on disk it is serialized as `key || iv`, 48 bytes.
///
/// The key material is wiped from memory when dropped.
#[derive(Clone)]
pub struct SymmetricKey {
    key: Zeroizing<[u8; AES_256_KEY_SIZE]>,
    iv: Zeroizing<[u8; AES_CBC_IV_SIZE]>,
}

impl SymmetricKey {
    /// Create a key object from its two parts.
    pub fn new(key: [u8; AES_256_KEY_SIZE], iv: [u8; AES_CBC_IV_SIZE]) -> Self {
        Self { key: Zeroizing::new(key), iv: Zeroizing::new(iv) }
    }

    /// Parse a serialized `key || iv` object.
    pub fn from_bytes(bytes: &[u8; KEY_OBJECT_SIZE]) -> Self {
        let mut key = Zeroizing::new([0u8; AES_256_KEY_SIZE]);
        let mut iv = Zeroizing::new([0u8; AES_CBC_IV_SIZE]);
        key.copy_from_slice(&bytes[..AES_256_KEY_SIZE]);
        iv.copy_from_slice(&bytes[AES_256_KEY_SIZE..]);
        Self { key, iv }
    }

    /// Serialize as `key || iv`.
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEY_OBJECT_SIZE]> {
        let mut out = Zeroizing::new([0u8; KEY_OBJECT_SIZE]);
        out[..AES_256_KEY_SIZE].copy_from_slice(self.key.as_ref());
        out[AES_256_KEY_SIZE..].copy_from_slice(self.iv.as_ref());
        out
    }

    /// Generate a fresh random key and IV, e.g. for a KDC minting session keys.
    pub fn generate<Rng: RngCore + CryptoRng>(rng: &mut Rng) -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_OBJECT_SIZE]);
        rng.fill_bytes(bytes.as_mut());
        Self::from_bytes(&bytes)
    }

    /// Read exactly 32 key bytes followed by 16 IV bytes from `reader`.
    ///
    /// Anything after the first 48 bytes is ignored. A short read is an `UnexpectedEof` error.
    pub fn read_from(mut reader: impl Read) -> std::io::Result<Self> {
        let mut key = Zeroizing::new([0u8; AES_256_KEY_SIZE]);
        let mut iv = Zeroizing::new([0u8; AES_CBC_IV_SIZE]);
        reader.read_exact(key.as_mut())?;
        reader.read_exact(iv.as_mut())?;
        Ok(Self { key, iv })
    }

    /// Load a pre-provisioned key object from a file in the `key || iv` binary format.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::read_from(File::open(path)?)
    }

    /// The AES-256 key.
    pub fn key(&self) -> &[u8; AES_256_KEY_SIZE] {
        &self.key
    }

    /// The CBC initialization vector.
    pub fn iv(&self) -> &[u8; AES_CBC_IV_SIZE] {
        &self.iv
    }

    /// Encrypt `plaintext` under this key object.
    pub fn encrypt<Cipher: Aes256Cbc>(&self, plaintext: &[u8]) -> Option<Vec<u8>> {
        Cipher::encrypt(&self.key, &self.iv, plaintext)
    }

    /// Decrypt `ciphertext` under this key object.
    pub fn decrypt<Cipher: Aes256Cbc>(&self, ciphertext: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        Cipher::decrypt(&self.key, &self.iv, ciphertext)
    }

    /// A short, non-secret identifier for this key object, safe to put in logs.
    pub fn fingerprint<Hash: Sha256Hash>(&self) -> [u8; KEY_FINGERPRINT_SIZE] {
        let digest = Hash::hash(self.to_bytes().as_ref());
        let mut fp = [0u8; KEY_FINGERPRINT_SIZE];
        fp.copy_from_slice(&digest[..KEY_FINGERPRINT_SIZE]);
        fp
    }
}

/// Comparison is constant-time.
impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        secure_eq(&self.to_bytes()[..], &other.to_bytes()[..])
    }
}
impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// The outcome of a successful key exchange for the initiator or the responder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Established {
    /// The session key Ks both parties now share.
    pub session_key: SymmetricKey,
    /// Who holds the other copy: IDb for the initiator, IDa for the responder.
    pub peer: crate::identity::Identity,
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> SymmetricKey {
        let mut bytes = [0u8; KEY_OBJECT_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        SymmetricKey::from_bytes(&bytes)
    }

    #[test]
    fn serializes_key_then_iv() {
        let k = sample();
        assert_eq!(k.key()[0], 0);
        assert_eq!(k.iv()[0], 32);
        assert_eq!(k.to_bytes()[47], 47);
    }

    #[test]
    fn reads_key_file_format() {
        let bytes: Vec<u8> = (0..KEY_OBJECT_SIZE as u8).chain([0xee, 0xff]).collect();
        let k = SymmetricKey::read_from(bytes.as_slice()).unwrap();
        assert_eq!(k, sample());

        let short = &bytes[..40];
        let e = SymmetricKey::read_from(short).unwrap_err();
        assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("nskex-key-{}.bin", std::process::id()));
        std::fs::write(&path, &sample().to_bytes()[..]).unwrap();
        let loaded = SymmetricKey::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.unwrap(), sample());
        assert!(SymmetricKey::load(&path).is_err());
    }

    #[test]
    fn debug_does_not_leak() {
        assert_eq!(format!("{:?}", sample()), "SymmetricKey(..)");
    }

    #[cfg(feature = "default-crypto")]
    #[test]
    fn fingerprint_distinguishes_keys() {
        use crate::crypto_impl::{CrateSha256, OsRng};
        let a = SymmetricKey::generate(&mut OsRng);
        let b = SymmetricKey::generate(&mut OsRng);
        assert_ne!(a, b);
        assert_eq!(a.fingerprint::<CrateSha256>(), a.clone().fingerprint::<CrateSha256>());
        assert_ne!(a.fingerprint::<CrateSha256>(), b.fingerprint::<CrateSha256>());
    }
}
