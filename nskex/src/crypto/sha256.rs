/// The size of a SHA-256 hash, which is always 32 bytes.
pub const SHA256_HASH_SIZE: usize = 32;

/// A SHA-256 implementation.
///
/// Only used to derive short, non-secret fingerprints of key material for diagnostics.
/// Does not need to be threadsafe.
pub trait Sha256Hash: Sized {
    /// Create a new instance of SHA-256 for streaming data to.
    fn new() -> Self;
    /// Update the instance of SHA-256 with input `data`.
    /// This must update the state of SHA-256 as if `data` was appended to the previous input.
    fn update(&mut self, data: &[u8]);
    /// Finish streaming input and output the final hash.
    fn finish(self) -> [u8; SHA256_HASH_SIZE];

    /// Hash `data` in one shot.
    fn hash(data: &[u8]) -> [u8; SHA256_HASH_SIZE] {
        let mut h = Self::new();
        h.update(data);
        h.finish()
    }
}
