use std::fmt;

use thiserror::Error;

/// The category of a fatal protocol condition.
///
/// Every one of these ends the protocol run for the participant that observed it. There is no
/// retry or degraded mode: a key exchange cannot safely continue after an integrity check fails.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    /// The channel closed, or fewer bytes were available than a length field promised.
    #[error("channel closed or fewer bytes available than declared")]
    TruncatedRead,
    /// A buffer for a received field could not be allocated.
    #[error("buffer allocation failed")]
    AllocationFailure,
    /// An identity named in Message #1 is not registered with the key distribution center.
    #[error("unknown principal")]
    UnknownPrincipal,
    /// The cipher library failed, or a ciphertext did not decrypt under the expected key.
    #[error("cipher failure")]
    CipherFailure,
    /// An echoed nonce, identity or challenge response did not match the expected value.
    ///
    /// This is the security critical case. Continuing past it would accept an unauthenticated peer.
    #[error("authentication mismatch")]
    AuthenticationMismatch,
    /// The fields of a message did not add up to its length, a length field was larger than
    /// allowed, or an identity was not a valid NUL terminated string.
    #[error("malformed message")]
    MalformedMessage,
    /// The initiator was handed the same nonce for both of its challenges.
    #[error("nonce reused across phases")]
    NonceReuse,
    /// A state machine operation was called in a state that does not allow it, including any
    /// call after the participant aborted.
    #[error("operation out of sequence")]
    OutOfSequence,
    /// The channel failed for a reason other than a short read.
    #[error("channel i/o failed: {0:?}")]
    Io(std::io::ErrorKind),
}

/// The protocol step a participant was performing when a fatal condition occurred.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[allow(missing_docs)]
pub enum Step {
    DrawNonces,
    SendMsg1,
    ReadMsg1,
    LookupPrincipal,
    BuildTicket,
    BuildMsg2,
    SendMsg2,
    ReadMsg2,
    OpenMsg2,
    VerifyIdB,
    VerifyNa,
    SendMsg3,
    ReadMsg3,
    OpenTicket,
    BuildMsg4,
    SendMsg4,
    ReadMsg4,
    OpenMsg4,
    VerifyFNa2,
    BuildMsg5,
    SendMsg5,
    ReadMsg5,
    OpenMsg5,
    VerifyFNb,
    Finish,
}

impl Step {
    /// A short human readable name for this step, used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrawNonces => "drawing nonces",
            Self::SendMsg1 => "sending MSG1",
            Self::ReadMsg1 => "receiving MSG1",
            Self::LookupPrincipal => "looking up principal keys",
            Self::BuildTicket => "building ticket",
            Self::BuildMsg2 => "building MSG2",
            Self::SendMsg2 => "sending MSG2",
            Self::ReadMsg2 => "receiving MSG2",
            Self::OpenMsg2 => "decrypting MSG2",
            Self::VerifyIdB => "verifying IDb",
            Self::VerifyNa => "verifying echoed Na",
            Self::SendMsg3 => "sending MSG3",
            Self::ReadMsg3 => "receiving MSG3",
            Self::OpenTicket => "opening ticket",
            Self::BuildMsg4 => "building MSG4",
            Self::SendMsg4 => "sending MSG4",
            Self::ReadMsg4 => "receiving MSG4",
            Self::OpenMsg4 => "decrypting MSG4",
            Self::VerifyFNa2 => "verifying f(Na2)",
            Self::BuildMsg5 => "building MSG5",
            Self::SendMsg5 => "sending MSG5",
            Self::ReadMsg5 => "receiving MSG5",
            Self::OpenMsg5 => "decrypting MSG5",
            Self::VerifyFNb => "verifying f(Nb)",
            Self::Finish => "finishing",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal error raised by one of the participants, naming the step that failed.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("{kind} while {step}")]
pub struct ProtocolError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Which step of the protocol was being performed.
    pub step: Step,
    /// The file of this implementation from which this error was generated.
    #[cfg(feature = "debug")]
    pub file: &'static str,
    /// The line number of this implementation from which this error was generated.
    #[cfg(feature = "debug")]
    pub line: u32,
}

macro_rules! fault {
    ($kind:expr, $step:expr) => {
        $crate::result::ProtocolError {
            #[cfg(feature = "debug")]
            file: file!(),
            #[cfg(feature = "debug")]
            line: line!(),
            kind: $kind,
            step: $step,
        }
    };
}
pub(crate) use fault;

/// An error produced by the wire codec, before it has been attributed to a protocol step.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WireError {
    /// Fewer bytes were available than a length field declared, or the channel closed early.
    #[error("truncated message")]
    Truncated,
    /// A buffer for a variable length field could not be allocated.
    #[error("allocation failure")]
    Allocation,
    /// The bytes do not form a valid message.
    #[error("malformed message")]
    Malformed,
    /// Encryption failed, or a ciphertext did not decrypt under the given key.
    #[error("cipher failure")]
    Cipher,
    /// The underlying reader or writer failed.
    #[error("i/o error: {0:?}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => WireError::Truncated,
            kind => WireError::Io(kind),
        }
    }
}

impl WireError {
    /// Reinterpret an error raised while parsing a decrypted plaintext.
    ///
    /// Running out of bytes there means the inner lengths do not add up to the plaintext length,
    /// which is a malformed message rather than a short channel.
    pub(crate) fn in_plaintext(self) -> Self {
        match self {
            WireError::Truncated => WireError::Malformed,
            other => other,
        }
    }

    /// Attribute this codec error to protocol step `step`.
    #[track_caller]
    pub(crate) fn at(self, step: Step) -> ProtocolError {
        #[cfg(feature = "debug")]
        let location = std::panic::Location::caller();
        ProtocolError {
            #[cfg(feature = "debug")]
            file: location.file(),
            #[cfg(feature = "debug")]
            line: location.line(),
            kind: match self {
                WireError::Truncated => ErrorKind::TruncatedRead,
                WireError::Allocation => ErrorKind::AllocationFailure,
                WireError::Malformed => ErrorKind::MalformedMessage,
                WireError::Cipher => ErrorKind::CipherFailure,
                WireError::Io(kind) => ErrorKind::Io(kind),
            },
            step,
        }
    }
}
