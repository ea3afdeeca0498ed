use std::collections::VecDeque;
use std::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::application::NonceSource;
use crate::crypto::secure_eq;
use crate::proto::NONCE_SIZE;

/// A single use challenge value.
///
/// The bytes are kept in wire order and interpreted as a big-endian `u32` whenever arithmetic is
/// done on them, so `Nonce::from(0x11223344)` is sent as `11 22 33 44`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// The nonce whose big-endian interpretation is `value`.
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// The big-endian interpretation of this nonce.
    pub const fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// The challenge function `f(n) = (n + 1) mod 2^32` used to prove freshness.
    ///
    /// The responder answers the initiator's Na2 with `f(Na2)` and the initiator answers the
    /// responder's Nb with `f(Nb)`.
    pub const fn challenge_response(&self) -> Self {
        Self::from_u32(self.to_u32().wrapping_add(1))
    }

    /// Check in constant time that `received` is the expected response to this nonce.
    pub fn is_answered_by(&self, received: &Nonce) -> bool {
        secure_eq(&self.challenge_response().0, &received.0)
    }
}

impl From<u32> for Nonce {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({:#010x})", self.to_u32())
    }
}

/// Draws nonces from a cryptographically secure random number generator.
pub struct RngNonces<Rng: RngCore + CryptoRng>(pub Rng);

impl<Rng: RngCore + CryptoRng> NonceSource for RngNonces<Rng> {
    fn next_nonce(&mut self) -> Nonce {
        let mut n = [0u8; NONCE_SIZE];
        self.0.fill_bytes(&mut n);
        Nonce(n)
    }
}

/// Hands out a fixed sequence of nonces, for reproducible test vectors.
///
/// Once the sequence is exhausted the last nonce is repeated.
#[derive(Debug, Clone)]
pub struct FixedNonces {
    queue: VecDeque<Nonce>,
    last: Nonce,
}

impl FixedNonces {
    /// Create a source that returns `nonces` in order.
    pub fn new(nonces: impl IntoIterator<Item = u32>) -> Self {
        Self { queue: nonces.into_iter().map(Nonce::from_u32).collect(), last: Nonce::default() }
    }
}

impl NonceSource for FixedNonces {
    fn next_nonce(&mut self) -> Nonce {
        if let Some(n) = self.queue.pop_front() {
            self.last = n;
        }
        self.last
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn challenge_response_vectors() {
        assert_eq!(Nonce::from(0xaabbccdd).challenge_response(), Nonce::from(0xaabbccde));
        assert_eq!(Nonce::from(0x66778899).challenge_response(), Nonce::from(0x6677889a));
        assert_eq!(Nonce::from(0x11223344).challenge_response().0, [0x11, 0x22, 0x33, 0x45]);
    }

    #[test]
    fn challenge_response_wraps() {
        assert_eq!(Nonce::from(0xffffffff).challenge_response(), Nonce::from(0));
        // Carry has to propagate across the big-endian bytes.
        assert_eq!(Nonce([0x00, 0x00, 0x00, 0xff]).challenge_response(), Nonce([0x00, 0x00, 0x01, 0x00]));
    }

    #[test]
    fn responses_are_checked() {
        let nb = Nonce::from(0x66778899);
        assert!(nb.is_answered_by(&Nonce::from(0x6677889a)));
        assert!(!nb.is_answered_by(&nb));
    }

    #[test]
    fn fixed_nonces_repeat_last() {
        let mut n = FixedNonces::new([1, 2]);
        assert_eq!(n.next_nonce(), Nonce::from(1));
        assert_eq!(n.next_nonce(), Nonce::from(2));
        assert_eq!(n.next_nonce(), Nonce::from(2));
    }

    #[cfg(feature = "default-crypto")]
    #[test]
    fn rng_nonces_vary() {
        let mut n = RngNonces(rand_core::OsRng);
        let draws: Vec<Nonce> = (0..8).map(|_| n.next_nonce()).collect();
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }
}
