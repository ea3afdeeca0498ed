use zeroize::Zeroizing;

/// The specified size of an AES-256 key.
pub const AES_256_KEY_SIZE: usize = 32;
/// The specified size of an AES block.
pub const AES_256_BLOCK_SIZE: usize = 16;
/// The specified size of an AES-CBC initialization vector, which is one block.
pub const AES_CBC_IV_SIZE: usize = AES_256_BLOCK_SIZE;

/// Returns the exact length of the ciphertext AES-256-CBC with PKCS#7 padding produces for a
/// plaintext of `plaintext_len` bytes. Padding always adds between 1 and 16 bytes.
pub const fn cbc_ciphertext_len(plaintext_len: usize) -> usize {
    (plaintext_len / AES_256_BLOCK_SIZE + 1) * AES_256_BLOCK_SIZE
}

/// A trait for implementing AES-256 in CBC mode with PKCS#7 padding.
///
/// Every protocol message that is encrypted as a whole, as well as the ticket, goes through this
/// trait exactly once per message, so it has no throughput requirements to speak of.
///
/// Both functions must be pure (no side effects) and must allocate their output per call.
/// Implementations must not keep scratch buffers between calls.
pub trait Aes256Cbc {
    /// Encrypt `plaintext` under `key` and `iv` and return the padded ciphertext.
    ///
    /// The returned ciphertext must be exactly `cbc_ciphertext_len(plaintext.len())` bytes long.
    ///
    /// `None` must only be returned if the underlying cipher library itself failed, in which case
    /// the caller will abandon the protocol run.
    fn encrypt(key: &[u8; AES_256_KEY_SIZE], iv: &[u8; AES_CBC_IV_SIZE], plaintext: &[u8]) -> Option<Vec<u8>>;

    /// Decrypt `ciphertext` under `key` and `iv`, strip the padding and return the plaintext.
    ///
    /// **CRITICAL**: This function must return `None` if the padding of the final block is
    /// invalid, or if `ciphertext` is empty or not a multiple of the block size.
    /// This is the only signal the protocol gets that a message was encrypted under some other key.
    fn decrypt(
        key: &[u8; AES_256_KEY_SIZE],
        iv: &[u8; AES_CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> Option<Zeroizing<Vec<u8>>>;
}
