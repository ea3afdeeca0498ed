use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::application::*;
use crate::identity::Identity;
use crate::keys::SymmetricKey;
use crate::log_event::log;
use crate::messages::*;
use crate::nonce::Nonce;
use crate::result::{fault, ErrorKind, ProtocolError, Step};
use crate::ticket::TicketContents;
use crate::wire::write_frame;
#[cfg(feature = "logging")]
use crate::LogEvent;

/// Where the KDC is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdcPhase {
    AwaitMsg1,
    BuildMsg2,
    SendMsg2,
    Done,
    Aborted,
}

enum KdcState {
    AwaitMsg1,
    BuildMsg2 { ka: SymmetricKey, kb: SymmetricKey, ida: Identity, idb: Identity, na: Nonce },
    SendMsg2 { ciphertext: Vec<u8> },
    Done,
    Aborted,
}

/// The trusted key distribution center, serving a single request.
///
/// It answers one Message #1 with one Message #2 and never talks to the responder.
pub struct Kdc<C: CryptoLayer, App: ApplicationLayer, Keys: KeyDistribution> {
    app: App,
    keys: Keys,
    state: KdcState,
    _crypto: PhantomData<C>,
}

impl<C: CryptoLayer, App: ApplicationLayer, Keys: KeyDistribution> Kdc<C, App, Keys> {
    pub fn new(app: App, keys: Keys) -> Self {
        Self { app, keys, state: KdcState::AwaitMsg1, _crypto: PhantomData }
    }

    pub fn phase(&self) -> KdcPhase {
        match &self.state {
            KdcState::AwaitMsg1 => KdcPhase::AwaitMsg1,
            KdcState::BuildMsg2 { .. } => KdcPhase::BuildMsg2,
            KdcState::SendMsg2 { .. } => KdcPhase::SendMsg2,
            KdcState::Done => KdcPhase::Done,
            KdcState::Aborted => KdcPhase::Aborted,
        }
    }

    pub fn app(&mut self) -> &mut App {
        &mut self.app
    }

    fn abort(&mut self, e: ProtocolError) -> ProtocolError {
        self.state = KdcState::Aborted;
        log!(self.app, LogEvent::Aborted(&e));
        e
    }

    fn take_state(&mut self) -> KdcState {
        std::mem::replace(&mut self.state, KdcState::Aborted)
    }

    /// Accept a request and look up the long-term keys of both principals it names.
    pub fn recv_msg1(&mut self, msg1: Message1) -> Result<(), ProtocolError> {
        let KdcState::AwaitMsg1 = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::LookupPrincipal)));
        };
        log!(self.app, LogEvent::ReceivedMsg1 { ida: &msg1.ida, idb: &msg1.idb, na: msg1.na });
        let Some(ka) = self.keys.lookup_principal(&msg1.ida) else {
            return Err(self.abort(fault!(ErrorKind::UnknownPrincipal, Step::LookupPrincipal)));
        };
        let Some(kb) = self.keys.lookup_principal(&msg1.idb) else {
            return Err(self.abort(fault!(ErrorKind::UnknownPrincipal, Step::LookupPrincipal)));
        };
        self.state = KdcState::BuildMsg2 { ka, kb, ida: msg1.ida, idb: msg1.idb, na: msg1.na };
        Ok(())
    }

    /// Obtain the session key, issue the ticket for the responder and seal Message #2 for the
    /// initiator, echoing its Na.
    pub fn build_msg2(&mut self) -> Result<(), ProtocolError> {
        let KdcState::BuildMsg2 { ka, kb, ida, idb, na } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::BuildMsg2)));
        };
        let ks = self.keys.issue_session_key();
        log!(self.app, LogEvent::IssuedSessionKey(ks.fingerprint::<C::Hash>()));

        let ticket = TicketContents { session_key: ks.clone(), ida }
            .seal::<C::Cipher>(&kb)
            .map_err(|e| self.abort(e.at(Step::BuildTicket)))?;
        let ciphertext = Message2 { session_key: ks, idb, na, ticket }
            .seal::<C::Cipher>(&ka)
            .map_err(|e| self.abort(e.at(Step::BuildMsg2)))?;
        self.state = KdcState::SendMsg2 { ciphertext };
        Ok(())
    }

    /// Take the sealed Message #2, to be framed and written to the initiator.
    pub fn send_msg2(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let KdcState::SendMsg2 { ciphertext } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::SendMsg2)));
        };
        log!(self.app, LogEvent::SentMsg2(ciphertext.len()));
        self.state = KdcState::Done;
        Ok(ciphertext)
    }

    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        let KdcState::Done = self.state else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::Finish)));
        };
        log!(self.app, LogEvent::Completed);
        Ok(())
    }

    /// Serve one request over blocking channels to the initiator.
    pub fn run<R: Read, W: Write>(&mut self, mut from_initiator: R, mut to_initiator: W) -> Result<(), ProtocolError> {
        let msg1 = Message1::read_from(&mut from_initiator, C::SETTINGS.max_field_size)
            .map_err(|e| self.abort(e.at(Step::ReadMsg1)))?;
        self.recv_msg1(msg1)?;
        self.build_msg2()?;
        let msg2 = self.send_msg2()?;
        write_frame(&mut to_initiator, &msg2).map_err(|e| self.abort(e.at(Step::SendMsg2)))?;
        self.finish()
    }
}

#[cfg(all(test, feature = "default-crypto"))]
mod test {
    use super::*;
    use crate::crypto_impl::{DefaultCrypto, OpenSSLAes256Cbc as Cbc};
    use crate::proto::DEFAULT_MAX_FIELD_SIZE;
    use crate::wire::read_frame;

    fn ka() -> SymmetricKey {
        SymmetricKey::new([0xa1; 32], [0xa2; 16])
    }
    fn kb() -> SymmetricKey {
        SymmetricKey::new([0xb1; 32], [0xb2; 16])
    }
    fn ks() -> SymmetricKey {
        SymmetricKey::new([0x51; 32], [0x52; 16])
    }
    fn amal() -> Identity {
        Identity::new("Amal is Hope").unwrap()
    }
    fn basim() -> Identity {
        Identity::new("Basim is Smily").unwrap()
    }

    fn kdc() -> Kdc<DefaultCrypto, (), StaticKeys> {
        Kdc::new((), StaticKeys::new(ks()).with_principal(amal(), ka()).with_principal(basim(), kb()))
    }

    #[test]
    fn issues_ticket_and_echoes_na() {
        let mut kdc = kdc();
        kdc.recv_msg1(Message1 { ida: amal(), idb: basim(), na: Nonce::from(0x11223344) }).unwrap();
        assert_eq!(kdc.phase(), KdcPhase::BuildMsg2);
        kdc.build_msg2().unwrap();
        assert_eq!(kdc.phase(), KdcPhase::SendMsg2);
        let c2 = kdc.send_msg2().unwrap();
        kdc.finish().unwrap();
        assert_eq!(kdc.phase(), KdcPhase::Done);

        let m2 = Message2::open::<Cbc>(&c2, &ka()).unwrap();
        assert_eq!(m2.session_key, ks());
        assert_eq!(m2.idb, basim());
        assert_eq!(m2.na, Nonce::from(0x11223344));
        // Only Kb opens the ticket.
        assert!(m2.ticket.open::<Cbc>(&ka()).is_err());
        let contents = m2.ticket.open::<Cbc>(&kb()).unwrap();
        assert_eq!(contents, TicketContents { session_key: ks(), ida: amal() });
    }

    #[test]
    fn unknown_principal_aborts() {
        for (ida, idb) in [(Identity::new("Eve").unwrap(), basim()), (amal(), Identity::new("Eve").unwrap())] {
            let mut kdc = kdc();
            let e = kdc.recv_msg1(Message1 { ida, idb, na: Nonce::from(7) }).unwrap_err();
            assert_eq!((e.kind, e.step), (ErrorKind::UnknownPrincipal, Step::LookupPrincipal));
            assert_eq!(kdc.phase(), KdcPhase::Aborted);
            assert_eq!(kdc.build_msg2().unwrap_err().kind, ErrorKind::OutOfSequence);
        }
    }

    #[test]
    fn run_serves_one_request() {
        let request = Message1 { ida: amal(), idb: basim(), na: Nonce::from(0x11223344) }.encode();
        let mut reply = Vec::new();
        kdc().run(request.as_slice(), &mut reply).unwrap();
        let c2 = read_frame(reply.as_slice(), DEFAULT_MAX_FIELD_SIZE).unwrap();
        assert_eq!(reply.len(), 4 + c2.len());
        assert_eq!(Message2::open::<Cbc>(&c2, &ka()).unwrap().na, Nonce::from(0x11223344));
    }

    #[test]
    fn run_rejects_oversized_identity() {
        let mut request = Vec::new();
        request.extend_from_slice(&(DEFAULT_MAX_FIELD_SIZE as u32 + 1).to_ne_bytes());
        let mut kdc = kdc();
        let e = kdc.run(request.as_slice(), std::io::sink()).unwrap_err();
        assert_eq!((e.kind, e.step), (ErrorKind::MalformedMessage, Step::ReadMsg1));
    }

    #[test]
    fn finish_before_sending_is_out_of_sequence() {
        let mut kdc = kdc();
        assert_eq!(kdc.finish().unwrap_err().kind, ErrorKind::OutOfSequence);
        assert_eq!(kdc.phase(), KdcPhase::Aborted);
    }
}
