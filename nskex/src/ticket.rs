use crate::crypto::Aes256Cbc;
use crate::identity::Identity;
use crate::keys::SymmetricKey;
use crate::messages::{seal, unseal};
use crate::result::WireError;
use crate::wire::{WireReader, WireWriter};

use crate::proto::*;

/// The credential the KDC issues for the responder, opaque to everyone else.
///
/// It is the ciphertext of `Ks || Len(IDa) || IDa` under the responder's long-term key. The
/// initiator receives it inside Message #2 and forwards it byte for byte in Message #3.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(Vec<u8>);

/// What a ticket says once opened: the session key and who it was issued to talk with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketContents {
    pub session_key: SymmetricKey,
    pub ida: Identity,
}

impl Ticket {
    /// Wrap ciphertext received from the wire.
    pub fn from_ciphertext(ciphertext: Vec<u8>) -> Self {
        Self(ciphertext)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decrypt and parse this ticket with the responder's long-term key.
    ///
    /// Fails if the ciphertext does not decrypt, or if the plaintext is not exactly a key object
    /// followed by one identity.
    pub fn open<Cipher: Aes256Cbc>(&self, kb: &SymmetricKey) -> Result<TicketContents, WireError> {
        let plaintext = unseal::<Cipher>(kb, &self.0)?;
        TicketContents::decode(&plaintext).map_err(WireError::in_plaintext)
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ticket({} bytes)", self.0.len())
    }
}

impl TicketContents {
    /// Serialize as `Ks || Len(IDa) || IDa`.
    pub fn encode(&self) -> WireWriter {
        let mut w = WireWriter::with_capacity(KEY_OBJECT_SIZE + LEN_SIZE + self.ida.encoded_len());
        w.put_key(&self.session_key);
        w.put_identity(&self.ida);
        w
    }

    /// Parse a ticket plaintext, which must contain nothing else.
    pub fn decode(plaintext: &[u8]) -> Result<Self, WireError> {
        let mut r = WireReader::new(plaintext, plaintext.len());
        let session_key = r.read_key()?;
        let ida = r.read_identity()?;
        r.finish()?;
        Ok(Self { session_key, ida })
    }

    /// Encrypt into a ticket with the responder's long-term key.
    pub fn seal<Cipher: Aes256Cbc>(&self, kb: &SymmetricKey) -> Result<Ticket, WireError> {
        Ok(Ticket(seal::<Cipher>(kb, self.encode().as_bytes())?))
    }
}
