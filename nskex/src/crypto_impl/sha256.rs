use sha2::{Digest, Sha256};

use crate::crypto::*;

/// The version and type of the sha2 crate that the `Sha256Hash` trait is implemented for.
pub type CrateSha256 = Sha256;
impl Sha256Hash for CrateSha256 {
    fn new() -> Self {
        Digest::new()
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(self, data)
    }

    fn finish(self) -> [u8; SHA256_HASH_SIZE] {
        self.finalize().into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sha256_abc() {
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, 0xb0, 0x03,
            0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(<CrateSha256 as Sha256Hash>::hash(b"abc"), expected);

        let mut h = <CrateSha256 as Sha256Hash>::new();
        Sha256Hash::update(&mut h, b"a");
        Sha256Hash::update(&mut h, b"bc");
        assert_eq!(Sha256Hash::finish(h), expected);
    }
}
