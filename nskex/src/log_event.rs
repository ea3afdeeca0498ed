use crate::identity::Identity;
use crate::keys::KEY_FINGERPRINT_SIZE;
use crate::nonce::Nonce;
use crate::result::ProtocolError;

macro_rules! log {
    ($app:expr, $event:expr) => {
        #[cfg(feature = "logging")]
        $app.event_log($event);
    };
}
pub(crate) use log;

/// Key exchange events that might be interesting to log or aggregate into metrics.
///
/// Keys are never carried by an event, only their fingerprint.
#[allow(missing_docs)]
pub enum LogEvent<'a> {
    /* KDC */
    ReceivedMsg1 { ida: &'a Identity, idb: &'a Identity, na: Nonce },
    IssuedSessionKey([u8; KEY_FINGERPRINT_SIZE]),
    SentMsg2(usize),
    /* Initiator */
    DrewNonces { na: Nonce, na2: Nonce },
    SentMsg1(usize),
    ReceivedMsg2 { session_key: [u8; KEY_FINGERPRINT_SIZE], ticket_len: usize },
    IdBMatch(&'a Identity),
    NaValid(Nonce),
    SentMsg3(usize),
    ReceivedMsg4 { f_na2: Nonce, nb: Nonce },
    FNa2Valid(Nonce),
    SentMsg5(Nonce),
    /* Responder */
    ReceivedMsg3 { ticket_len: usize, na2: Nonce },
    TicketOpened { ida: &'a Identity, session_key: [u8; KEY_FINGERPRINT_SIZE] },
    SentMsg4 { f_na2: Nonce, nb: Nonce },
    ReceivedMsg5(Nonce),
    FNbValid(Nonce),
    /* Everyone */
    Completed,
    Aborted(&'a ProtocolError),
}

struct Hex<'a>(&'a [u8]);

impl<'a> std::fmt::Debug for Hex<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl<'a> std::fmt::Debug for LogEvent<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReceivedMsg1 { ida, idb, na } => {
                f.debug_struct("ReceivedMsg1").field("IDa", ida).field("IDb", idb).field("Na", na).finish()
            }
            Self::IssuedSessionKey(fp) => f.debug_tuple("IssuedSessionKey").field(&Hex(fp)).finish(),
            Self::SentMsg2(len) => f.debug_tuple("SentMsg2").field(len).finish(),
            Self::DrewNonces { na, na2 } => f.debug_struct("DrewNonces").field("Na", na).field("Na2", na2).finish(),
            Self::SentMsg1(len) => f.debug_tuple("SentMsg1").field(len).finish(),
            Self::ReceivedMsg2 { session_key, ticket_len } => f
                .debug_struct("ReceivedMsg2")
                .field("Ks", &Hex(session_key))
                .field("ticket_len", ticket_len)
                .finish(),
            Self::IdBMatch(idb) => f.debug_tuple("IdBMatch").field(idb).finish(),
            Self::NaValid(na) => f.debug_tuple("NaValid").field(na).finish(),
            Self::SentMsg3(len) => f.debug_tuple("SentMsg3").field(len).finish(),
            Self::ReceivedMsg4 { f_na2, nb } => {
                f.debug_struct("ReceivedMsg4").field("f(Na2)", f_na2).field("Nb", nb).finish()
            }
            Self::FNa2Valid(n) => f.debug_tuple("FNa2Valid").field(n).finish(),
            Self::SentMsg5(n) => f.debug_tuple("SentMsg5").field(n).finish(),
            Self::ReceivedMsg3 { ticket_len, na2 } => {
                f.debug_struct("ReceivedMsg3").field("ticket_len", ticket_len).field("Na2", na2).finish()
            }
            Self::TicketOpened { ida, session_key } => {
                f.debug_struct("TicketOpened").field("IDa", ida).field("Ks", &Hex(session_key)).finish()
            }
            Self::SentMsg4 { f_na2, nb } => f.debug_struct("SentMsg4").field("f(Na2)", f_na2).field("Nb", nb).finish(),
            Self::ReceivedMsg5(n) => f.debug_tuple("ReceivedMsg5").field(n).finish(),
            Self::FNbValid(n) => f.debug_tuple("FNbValid").field(n).finish(),
            Self::Completed => write!(f, "Completed"),
            Self::Aborted(e) => write!(f, "Aborted({})", e),
        }
    }
}
