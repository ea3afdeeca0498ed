use crate::crypto::*;
use crate::identity::Identity;
use crate::keys::SymmetricKey;
use crate::nonce::Nonce;
use crate::proto::DEFAULT_MAX_FIELD_SIZE;

/// A container for the dynamic settings of the key exchange.
///
/// All three participants of a deployment should use the same settings, otherwise one of them may
/// reject a message the others consider valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// The largest value accepted for any length prefix read from a channel.
    ///
    /// This bounds identity lengths, ticket lengths and the outer length of encrypted messages.
    /// A larger declared length is treated as a malformed message before anything is allocated
    /// for it.
    pub max_field_size: usize,
}
impl Settings {
    /// Default value for the `max_field_size`.
    /// The default is 2048 bytes, which comfortably fits a Message #2 carrying two maximum
    /// length identities.
    pub const MAX_FIELD_SIZE: usize = DEFAULT_MAX_FIELD_SIZE;
    /// Create an instance of Settings with all default values.
    pub const fn new() -> Self {
        Self { max_field_size: Self::MAX_FIELD_SIZE }
    }
}
impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait to implement to pick the cryptographic primitives the key exchange runs on.
///
/// The participants are templated on this trait so the protocol logic here is independent of
/// any particular cipher library.
pub trait CryptoLayer: Sized {
    /// Constants that can be redefined from their defaults. All participants of one exchange
    /// must agree on them.
    const SETTINGS: Settings = Settings::new();

    /// The implementation of AES-256-CBC with PKCS#7 padding used to seal Messages #2, #4, #5
    /// and the ticket.
    type Cipher: Aes256Cbc;
    /// The implementation of SHA-256 used to fingerprint keys for logging.
    type Hash: Sha256Hash;
}

/// Trait to implement to observe a participant of the key exchange.
pub trait ApplicationLayer {
    /// Receives a stream of events that occur during an execution of the key exchange.
    /// These are provided for debugging, logging or metrics purposes, and must be used for
    /// nothing else. Do not base protocol-level decisions upon the events passed to this function.
    #[cfg(feature = "logging")]
    #[allow(unused)]
    fn event_log(&mut self, event: crate::LogEvent<'_>) {}
}

/// The application that does not care about events.
impl ApplicationLayer for () {}

/// A supply of fresh nonces.
///
/// Production code should draw them from a cryptographically secure generator with
/// `RngNonces`, tests can inject fixed vectors with `FixedNonces`.
pub trait NonceSource {
    /// Return the next nonce. Callers assume it has never been returned before.
    fn next_nonce(&mut self) -> Nonce;
}

/// The key distribution center's view of the world: the long-term key of every principal it
/// serves, and where session keys come from.
pub trait KeyDistribution {
    /// Lookup the long-term key shared between the KDC and the principal `id`.
    ///
    /// Returning `None` makes the KDC abort with `UnknownPrincipal`.
    fn lookup_principal(&mut self, id: &Identity) -> Option<SymmetricKey>;

    /// Produce the session key for the exchange being served.
    ///
    /// This is called exactly once per exchange, after both principals were found.
    fn issue_session_key(&mut self) -> SymmetricKey;
}

/// A fixed table of principals with a single provisioned session key, as used by test setups
/// and the demo where every key is read from disk.
pub struct StaticKeys {
    principals: Vec<(Identity, SymmetricKey)>,
    session_key: SymmetricKey,
}

impl StaticKeys {
    /// Create a directory that hands out `session_key` to whoever asks.
    pub fn new(session_key: SymmetricKey) -> Self {
        Self { principals: Vec::new(), session_key }
    }

    /// Register `id` with long-term key `key`, replacing any previous registration.
    pub fn with_principal(mut self, id: Identity, key: SymmetricKey) -> Self {
        self.principals.retain(|(known, _)| known != &id);
        self.principals.push((id, key));
        self
    }
}

impl KeyDistribution for StaticKeys {
    fn lookup_principal(&mut self, id: &Identity) -> Option<SymmetricKey> {
        find_principal(&self.principals, id)
    }

    fn issue_session_key(&mut self) -> SymmetricKey {
        self.session_key.clone()
    }
}

/// A table of principals that mints a brand new session key for every exchange.
pub struct MintingKeys<Rng: rand_core::RngCore + rand_core::CryptoRng> {
    principals: Vec<(Identity, SymmetricKey)>,
    rng: Rng,
}

impl<Rng: rand_core::RngCore + rand_core::CryptoRng> MintingKeys<Rng> {
    /// Create an empty directory that mints session keys from `rng`.
    pub fn new(rng: Rng) -> Self {
        Self { principals: Vec::new(), rng }
    }

    /// Register `id` with long-term key `key`, replacing any previous registration.
    pub fn with_principal(mut self, id: Identity, key: SymmetricKey) -> Self {
        self.principals.retain(|(known, _)| known != &id);
        self.principals.push((id, key));
        self
    }
}

impl<Rng: rand_core::RngCore + rand_core::CryptoRng> KeyDistribution for MintingKeys<Rng> {
    fn lookup_principal(&mut self, id: &Identity) -> Option<SymmetricKey> {
        find_principal(&self.principals, id)
    }

    fn issue_session_key(&mut self) -> SymmetricKey {
        SymmetricKey::generate(&mut self.rng)
    }
}

fn find_principal(principals: &[(Identity, SymmetricKey)], id: &Identity) -> Option<SymmetricKey> {
    principals.iter().find(|(known, _)| known == id).map(|(_, key)| key.clone())
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn static_keys_lookup_by_exact_identity() {
        let ka = SymmetricKey::new([1; 32], [2; 16]);
        let kb = SymmetricKey::new([3; 32], [4; 16]);
        let ks = SymmetricKey::new([5; 32], [6; 16]);
        let mut kdc = StaticKeys::new(ks.clone())
            .with_principal(id("Amal is Hope"), ka.clone())
            .with_principal(id("Basim is Smily"), kb.clone());
        assert_eq!(kdc.lookup_principal(&id("Amal is Hope")), Some(ka));
        assert_eq!(kdc.lookup_principal(&id("Basim is Smily")), Some(kb));
        assert_eq!(kdc.lookup_principal(&id("amal is hope")), None);
        assert_eq!(kdc.issue_session_key(), ks);
    }

    #[test]
    fn registering_twice_replaces() {
        let old = SymmetricKey::new([1; 32], [1; 16]);
        let new = SymmetricKey::new([2; 32], [2; 16]);
        let mut kdc = StaticKeys::new(old.clone()).with_principal(id("a"), old).with_principal(id("a"), new.clone());
        assert_eq!(kdc.lookup_principal(&id("a")), Some(new));
    }

    #[cfg(feature = "default-crypto")]
    #[test]
    fn minting_keys_are_fresh() {
        let mut kdc = MintingKeys::new(crate::crypto_impl::OsRng);
        assert_ne!(kdc.issue_session_key(), kdc.issue_session_key());
    }

    #[test]
    fn default_settings() {
        assert_eq!(Settings::default().max_field_size, 2048);
    }
}
