use crate::crypto::*;

/* Field constants */

/// Size in bytes of every length prefix on the wire. Length prefixes are native-endian `u32`.
pub const LEN_SIZE: usize = 4;
/// Size in bytes of a nonce. Nonces are interpreted as big-endian `u32`.
pub const NONCE_SIZE: usize = 4;
/// Size in bytes of a serialized key object, `key || iv`.
pub const KEY_OBJECT_SIZE: usize = AES_256_KEY_SIZE + AES_CBC_IV_SIZE;
/// Maximum number of bytes in an identity, not counting the NUL terminator it carries on the wire.
pub const IDENTITY_MAX_SIZE: usize = 255;
/// Maximum encoded length of an identity, including its NUL terminator.
pub(crate) const IDENTITY_MAX_ENCODED_SIZE: usize = IDENTITY_MAX_SIZE + 1;

/* Message layouts */
/*
MSG1 (plain):
    Len(IDa) || IDa || Len(IDb) || IDb || Na
MSG2 (encrypted under Ka, framed):
    Ks || Len(IDb) || IDb || Na || Len(Ticket) || Ticket
Ticket (encrypted under Kb):
    Ks || Len(IDa) || IDa
MSG3 (plain):
    Len(Ticket) || Ticket || Na2
MSG4 (encrypted under Ks, framed):
    f(Na2) || Nb
MSG5 (encrypted under Ks, framed):
    f(Nb)
*/

/// Plaintext size of Message #4.
pub(crate) const MSG4_SIZE: usize = NONCE_SIZE + NONCE_SIZE;
/// Plaintext size of Message #5.
pub(crate) const MSG5_SIZE: usize = NONCE_SIZE;

/// Default bound on any length read from the wire.
pub const DEFAULT_MAX_FIELD_SIZE: usize = 2048;
