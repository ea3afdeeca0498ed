use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use openssl_sys::*;
use zeroize::Zeroizing;

use crate::crypto::*;

/// A wrapper for a `EVP_CIPHER_CTX` that will free itself on drop.
/// Users are encouraged to not use one of these directly.
pub struct OpenSSLCtx(NonNull<openssl_sys::EVP_CIPHER_CTX>);
impl Drop for OpenSSLCtx {
    fn drop(&mut self) {
        unsafe {
            EVP_CIPHER_CTX_free(self.0.as_ptr());
        }
    }
}
impl OpenSSLCtx {
    /// Creates a new context.
    pub fn new() -> Option<Self> {
        unsafe { Some(OpenSSLCtx(NonNull::new(EVP_CIPHER_CTX_new())?)) }
    }

    /// Initialize a cipher context for encryption or decryption using the specified `key` and `iv`.
    pub unsafe fn cipher_init<const ENCRYPT: bool>(
        &self,
        t: *const openssl_sys::EVP_CIPHER,
        key: *const u8,
        iv: *const u8,
    ) -> bool {
        let evp_f = if ENCRYPT {
            EVP_EncryptInit_ex
        } else {
            EVP_DecryptInit_ex
        };

        // OpenSSL will usually leak a static amount of memory per cipher given here.
        evp_f(self.0.as_ptr(), t, ptr::null_mut(), key, iv) > 0
    }
    /// Stream a portion of text to be encrypted or decrypted.
    /// `input` will be the input to the cipher stream, and the resulting plaintext or ciphertext
    /// will be written to `output`, which must have room for `input.len()` plus one block.
    ///
    /// Returns the number of bytes written to `output`.
    pub unsafe fn update<const ENCRYPT: bool>(&self, input: &[u8], output: *mut u8) -> Option<usize> {
        let evp_f = if ENCRYPT {
            EVP_EncryptUpdate
        } else {
            EVP_DecryptUpdate
        };
        let inlen = c_int::try_from(input.len()).ok()?;
        let mut outlen: c_int = 0;

        if evp_f(self.0.as_ptr(), output, &mut outlen, input.as_ptr(), inlen) > 0 {
            usize::try_from(outlen).ok()
        } else {
            None
        }
    }

    /// Finish encryption or decryption, writing the final (padded) block to `output`.
    /// When decrypting, this fails if the padding is not valid.
    ///
    /// Returns the number of bytes written to `output`.
    pub unsafe fn finalize<const ENCRYPT: bool>(&self, output: *mut u8) -> Option<usize> {
        let evp_f = if ENCRYPT {
            EVP_EncryptFinal_ex
        } else {
            EVP_DecryptFinal_ex
        };
        let mut outlen: c_int = 0;

        if evp_f(self.0.as_ptr(), output, &mut outlen) > 0 {
            usize::try_from(outlen).ok()
        } else {
            None
        }
    }

    /// Returns the raw pointer to the `EVP_CIPHER_CTX`
    /// object used internally with OpenSSL.
    ///
    /// This function is guaranteed to return a non-null pointer.
    pub fn as_ptr(&self) -> *mut openssl_sys::EVP_CIPHER_CTX {
        self.0.as_ptr()
    }
}

/// An empty struct which implements `Aes256Cbc` using OpenSSL.
///
/// It is just a namespace and wrapper for OpenSSL. A fresh `EVP_CIPHER_CTX` is created for every
/// call, so nothing is shared between calls or threads.
pub struct OpenSSLAes256Cbc;
impl Aes256Cbc for OpenSSLAes256Cbc {
    fn encrypt(key: &[u8; AES_256_KEY_SIZE], iv: &[u8; AES_CBC_IV_SIZE], plaintext: &[u8]) -> Option<Vec<u8>> {
        let ctx = OpenSSLCtx::new()?;
        let mut output = vec![0u8; plaintext.len() + AES_256_BLOCK_SIZE];
        unsafe {
            if !ctx.cipher_init::<true>(EVP_aes_256_cbc(), key.as_ptr(), iv.as_ptr()) {
                return None;
            }
            let n = ctx.update::<true>(plaintext, output.as_mut_ptr())?;
            let m = ctx.finalize::<true>(output.as_mut_ptr().add(n))?;
            output.truncate(n + m);
        }
        Some(output)
    }

    fn decrypt(
        key: &[u8; AES_256_KEY_SIZE],
        iv: &[u8; AES_CBC_IV_SIZE],
        ciphertext: &[u8],
    ) -> Option<Zeroizing<Vec<u8>>> {
        if ciphertext.is_empty() || ciphertext.len() % AES_256_BLOCK_SIZE != 0 {
            return None;
        }
        let ctx = OpenSSLCtx::new()?;
        let mut output = Zeroizing::new(vec![0u8; ciphertext.len() + AES_256_BLOCK_SIZE]);
        unsafe {
            if !ctx.cipher_init::<false>(EVP_aes_256_cbc(), key.as_ptr(), iv.as_ptr()) {
                return None;
            }
            let n = ctx.update::<false>(ciphertext, output.as_mut_ptr())?;
            let m = ctx.finalize::<false>(output.as_mut_ptr().add(n))?;
            output.truncate(n + m);
        }
        Some(output)
    }
}
