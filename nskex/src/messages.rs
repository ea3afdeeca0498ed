//! Codecs for the five messages of the exchange.
//!
//! Messages #1 and #3 travel in the clear and are read field by field straight off the channel.
//! Messages #2, #4 and #5 are encrypted as a whole and travel as one length prefixed frame, so
//! they are sealed into a ciphertext here and framed by `wire::write_frame`.
use std::io::Read;

use zeroize::Zeroizing;

use crate::crypto::Aes256Cbc;
use crate::identity::Identity;
use crate::keys::SymmetricKey;
use crate::nonce::Nonce;
use crate::proto::*;
use crate::result::WireError;
use crate::ticket::Ticket;
use crate::wire::{WireReader, WireWriter};

/// Encrypt `plaintext` under `key`.
pub(crate) fn seal<Cipher: Aes256Cbc>(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, WireError> {
    key.encrypt::<Cipher>(plaintext).ok_or(WireError::Cipher)
}

/// Decrypt `ciphertext` under `key`.
pub(crate) fn unseal<Cipher: Aes256Cbc>(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, WireError> {
    key.decrypt::<Cipher>(ciphertext).ok_or(WireError::Cipher)
}

/// Initiator to KDC, in the clear: `Len(IDa) || IDa || Len(IDb) || IDb || Na`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message1 {
    pub ida: Identity,
    pub idb: Identity,
    pub na: Nonce,
}

impl Message1 {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(2 * LEN_SIZE + self.ida.encoded_len() + self.idb.encoded_len() + NONCE_SIZE);
        w.put_identity(&self.ida);
        w.put_identity(&self.idb);
        w.put_nonce(&self.na);
        w.as_bytes().to_vec()
    }

    /// Read exactly one Message #1 from a channel.
    pub fn read_from<R: Read>(r: R, max_field_size: usize) -> Result<Self, WireError> {
        let mut r = WireReader::new(r, max_field_size);
        let ida = r.read_identity()?;
        let idb = r.read_identity()?;
        let na = r.read_nonce()?;
        Ok(Self { ida, idb, na })
    }

    /// Parse a buffer holding exactly one Message #1.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(bytes, bytes.len());
        let ida = r.read_identity()?;
        let idb = r.read_identity()?;
        let na = r.read_nonce()?;
        r.finish()?;
        Ok(Self { ida, idb, na })
    }
}

/// KDC to initiator, sealed under Ka: `Ks || Len(IDb) || IDb || Na || Len(Ticket) || Ticket`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message2 {
    pub session_key: SymmetricKey,
    pub idb: Identity,
    pub na: Nonce,
    pub ticket: Ticket,
}

impl Message2 {
    pub fn encode(&self) -> Result<WireWriter, WireError> {
        let mut w = WireWriter::with_capacity(
            KEY_OBJECT_SIZE + LEN_SIZE + self.idb.encoded_len() + NONCE_SIZE + LEN_SIZE + self.ticket.len(),
        );
        w.put_key(&self.session_key);
        w.put_identity(&self.idb);
        w.put_nonce(&self.na);
        w.put_field(self.ticket.as_bytes())?;
        Ok(w)
    }

    /// Parse a decrypted Message #2. Every byte of `plaintext` must belong to a field.
    pub fn decode(plaintext: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(plaintext, plaintext.len());
        let session_key = r.read_key()?;
        let idb = r.read_identity()?;
        let na = r.read_nonce()?;
        let ticket = Ticket::from_ciphertext(r.read_field()?);
        r.finish()?;
        Ok(Self { session_key, idb, na, ticket })
    }

    /// Encrypt under the initiator's long-term key.
    pub fn seal<Cipher: Aes256Cbc>(&self, ka: &SymmetricKey) -> Result<Vec<u8>, WireError> {
        seal::<Cipher>(ka, self.encode()?.as_bytes())
    }

    /// Decrypt with the initiator's long-term key and parse.
    pub fn open<Cipher: Aes256Cbc>(ciphertext: &[u8], ka: &SymmetricKey) -> Result<Self, WireError> {
        let plaintext = unseal::<Cipher>(ka, ciphertext)?;
        Self::decode(&plaintext).map_err(WireError::in_plaintext)
    }
}

/// Initiator to responder, in the clear: `Len(Ticket) || Ticket || Na2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message3 {
    pub ticket: Ticket,
    pub na2: Nonce,
}

impl Message3 {
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut w = WireWriter::with_capacity(LEN_SIZE + self.ticket.len() + NONCE_SIZE);
        w.put_field(self.ticket.as_bytes())?;
        w.put_nonce(&self.na2);
        Ok(w.as_bytes().to_vec())
    }

    /// Read exactly one Message #3 from a channel.
    pub fn read_from<R: Read>(r: R, max_field_size: usize) -> Result<Self, WireError> {
        let mut r = WireReader::new(r, max_field_size);
        let ticket = Ticket::from_ciphertext(r.read_field()?);
        let na2 = r.read_nonce()?;
        Ok(Self { ticket, na2 })
    }

    /// Parse a buffer holding exactly one Message #3.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(bytes, bytes.len());
        let ticket = Ticket::from_ciphertext(r.read_field()?);
        let na2 = r.read_nonce()?;
        r.finish()?;
        Ok(Self { ticket, na2 })
    }
}

/// Responder to initiator, sealed under Ks: `f(Na2) || Nb`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message4 {
    pub f_na2: Nonce,
    pub nb: Nonce,
}

impl Message4 {
    pub fn encode(&self) -> [u8; MSG4_SIZE] {
        let mut out = [0u8; MSG4_SIZE];
        out[..NONCE_SIZE].copy_from_slice(&self.f_na2.0);
        out[NONCE_SIZE..].copy_from_slice(&self.nb.0);
        out
    }

    pub fn decode(plaintext: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(plaintext, MSG4_SIZE);
        let f_na2 = r.read_nonce()?;
        let nb = r.read_nonce()?;
        r.finish()?;
        Ok(Self { f_na2, nb })
    }

    /// Encrypt under the session key.
    pub fn seal<Cipher: Aes256Cbc>(&self, ks: &SymmetricKey) -> Result<Vec<u8>, WireError> {
        seal::<Cipher>(ks, &self.encode())
    }

    /// Decrypt with the session key and parse.
    pub fn open<Cipher: Aes256Cbc>(ciphertext: &[u8], ks: &SymmetricKey) -> Result<Self, WireError> {
        let plaintext = unseal::<Cipher>(ks, ciphertext)?;
        Self::decode(&plaintext).map_err(WireError::in_plaintext)
    }
}

/// Initiator to responder, sealed under Ks: `f(Nb)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message5 {
    pub f_nb: Nonce,
}

impl Message5 {
    pub fn encode(&self) -> [u8; MSG5_SIZE] {
        self.f_nb.0
    }

    pub fn decode(plaintext: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(plaintext, MSG5_SIZE);
        let f_nb = r.read_nonce()?;
        r.finish()?;
        Ok(Self { f_nb })
    }

    /// Encrypt under the session key.
    pub fn seal<Cipher: Aes256Cbc>(&self, ks: &SymmetricKey) -> Result<Vec<u8>, WireError> {
        seal::<Cipher>(ks, &self.encode())
    }

    /// Decrypt with the session key and parse.
    pub fn open<Cipher: Aes256Cbc>(ciphertext: &[u8], ks: &SymmetricKey) -> Result<Self, WireError> {
        let plaintext = unseal::<Cipher>(ks, ciphertext)?;
        Self::decode(&plaintext).map_err(WireError::in_plaintext)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn msg1() -> Message1 {
        Message1 { ida: id("Amal is Hope"), idb: id("Basim is Smily"), na: Nonce::from(0x11223344) }
    }

    #[test]
    fn message1_layout() {
        let bytes = msg1().encode();
        assert_eq!(bytes.len(), 4 + 13 + 4 + 15 + 4);
        assert_eq!(&bytes[..4], &13u32.to_ne_bytes());
        assert_eq!(&bytes[17..21], &15u32.to_ne_bytes());
        assert_eq!(&bytes[36..], &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(Message1::decode(&bytes), Ok(msg1()));
    }

    #[test]
    fn message1_from_channel_leaves_following_bytes() {
        let mut channel = msg1().encode();
        channel.extend_from_slice(b"next");
        let mut r = channel.as_slice();
        assert_eq!(Message1::read_from(&mut r, DEFAULT_MAX_FIELD_SIZE), Ok(msg1()));
        assert_eq!(r, b"next");
        assert_eq!(Message1::decode(&channel), Err(WireError::Malformed));
    }

    #[test]
    fn message1_truncated_anywhere() {
        let bytes = msg1().encode();
        for cut in 0..bytes.len() {
            assert_eq!(Message1::read_from(&bytes[..cut], DEFAULT_MAX_FIELD_SIZE), Err(WireError::Truncated), "cut {}", cut);
        }
    }

    #[test]
    fn message3_tolerates_reused_nonce() {
        // Reusing Na as Na2 is the initiator's mistake to catch, the codec carries it as is.
        let m = Message3 { ticket: Ticket::from_ciphertext(vec![0xab; 80]), na2: Nonce::from(0x11223344) };
        let bytes = m.encode().unwrap();
        assert_eq!(bytes.len(), 4 + 80 + 4);
        assert_eq!(&bytes[..4], &80u32.to_ne_bytes());
        assert_eq!(Message3::read_from(bytes.as_slice(), DEFAULT_MAX_FIELD_SIZE), Ok(m.clone()));
        assert_eq!(Message3::decode(&bytes), Ok(m));
    }

    #[test]
    fn message3_ticket_over_limit() {
        let m = Message3 { ticket: Ticket::from_ciphertext(vec![0; 128]), na2: Nonce::from(1) };
        let bytes = m.encode().unwrap();
        assert_eq!(Message3::read_from(bytes.as_slice(), 127), Err(WireError::Malformed));
    }

    #[test]
    fn message2_inner_lengths_must_add_up() {
        let m = Message2 {
            session_key: SymmetricKey::new([3; 32], [4; 16]),
            idb: id("Basim is Smily"),
            na: Nonce::from(0x11223344),
            ticket: Ticket::from_ciphertext(vec![0xcd; 80]),
        };
        let plain = m.encode().unwrap();
        assert_eq!(plain.len(), 48 + 4 + 15 + 4 + 4 + 80);
        assert_eq!(Message2::decode(plain.as_bytes()), Ok(m.clone()));

        let mut long = plain.as_bytes().to_vec();
        long.push(0);
        assert_eq!(Message2::decode(&long), Err(WireError::Malformed));
        let short = &plain.as_bytes()[..plain.len() - 1];
        assert_eq!(Message2::decode(short).map_err(WireError::in_plaintext), Err(WireError::Malformed));
    }

    #[test]
    fn message4_and_5_layout() {
        let m4 = Message4 { f_na2: Nonce::from(0xaabbccde), nb: Nonce::from(0x66778899) };
        assert_eq!(m4.encode(), [0xaa, 0xbb, 0xcc, 0xde, 0x66, 0x77, 0x88, 0x99]);
        assert_eq!(Message4::decode(&m4.encode()), Ok(m4));
        assert_eq!(Message4::decode(&[0; 7]), Err(WireError::Truncated));
        assert_eq!(Message4::decode(&[0; 9]), Err(WireError::Malformed));

        let m5 = Message5 { f_nb: Nonce::from(0x6677889a) };
        assert_eq!(m5.encode(), [0x66, 0x77, 0x88, 0x9a]);
        assert_eq!(Message5::decode(&[0; 5]), Err(WireError::Malformed));
    }

    #[cfg(feature = "default-crypto")]
    mod sealed {
        use super::*;
        use crate::crypto_impl::OpenSSLAes256Cbc as Cbc;

        #[test]
        fn sealed_messages_open_under_the_same_key() {
            let ka = SymmetricKey::new([1; 32], [2; 16]);
            let ks = SymmetricKey::new([3; 32], [4; 16]);
            let m2 = Message2 {
                session_key: ks.clone(),
                idb: id("Basim is Smily"),
                na: Nonce::from(0x11223344),
                ticket: Ticket::from_ciphertext(vec![0xcd; 80]),
            };
            let c2 = m2.seal::<Cbc>(&ka).unwrap();
            assert_eq!(c2.len(), cbc_len(48 + 4 + 15 + 4 + 4 + 80));
            assert_eq!(Message2::open::<Cbc>(&c2, &ka), Ok(m2));
            assert!(Message2::open::<Cbc>(&c2, &ks).is_err());

            let m4 = Message4 { f_na2: Nonce::from(0xaabbccde), nb: Nonce::from(0x66778899) };
            let c4 = m4.seal::<Cbc>(&ks).unwrap();
            assert_eq!(c4.len(), 16);
            assert_eq!(Message4::open::<Cbc>(&c4, &ks), Ok(m4));

            let m5 = Message5 { f_nb: Nonce::from(0x6677889a) };
            let c5 = m5.seal::<Cbc>(&ks).unwrap();
            assert_eq!(Message5::open::<Cbc>(&c5, &ks), Ok(m5));
        }

        #[test]
        fn tampered_challenges_never_verify() {
            let ks = SymmetricKey::new([3; 32], [4; 16]);
            let m4 = Message4 { f_na2: Nonce::from(0xaabbccde), nb: Nonce::from(0x66778899) };
            let c4 = m4.seal::<Cbc>(&ks).unwrap();
            for i in 0..c4.len() {
                let mut bad = c4.clone();
                bad[i] ^= 0x80;
                assert_ne!(Message4::open::<Cbc>(&bad, &ks), Ok(m4.clone()), "byte {}", i);
            }
        }

        fn cbc_len(n: usize) -> usize {
            crate::crypto::cbc_ciphertext_len(n)
        }
    }
}
