/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
#[cfg(feature = "sha2")]
mod sha256;
#[cfg(feature = "sha2")]
pub use sha2;
#[cfg(feature = "sha2")]
pub use sha256::*;

#[cfg(feature = "openssl-sys")]
mod openssl;
#[cfg(feature = "openssl-sys")]
pub use openssl::*;
#[cfg(feature = "openssl-sys")]
pub use openssl_sys;

#[cfg(feature = "default-crypto")]
pub use rand_core::OsRng;

/// The `CryptoLayer` built from the implementations in this module, with default `Settings`.
#[cfg(feature = "default-crypto")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DefaultCrypto;
#[cfg(feature = "default-crypto")]
impl crate::application::CryptoLayer for DefaultCrypto {
    type Cipher = OpenSSLAes256Cbc;
    type Hash = CrateSha256;
}
