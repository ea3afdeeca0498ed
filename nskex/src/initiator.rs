use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::application::*;
use crate::crypto::secure_eq;
use crate::identity::Identity;
use crate::keys::{Established, SymmetricKey};
use crate::log_event::log;
use crate::messages::*;
use crate::nonce::Nonce;
use crate::result::{fault, ErrorKind, ProtocolError, Step};
use crate::ticket::Ticket;
use crate::wire::{read_frame, write_frame, write_message};
#[cfg(feature = "logging")]
use crate::LogEvent;

/// Where the initiator is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitiatorPhase {
    Init,
    SentMsg1,
    RecvMsg2,
    SentMsg3,
    RecvMsg4,
    SentMsg5,
    Done,
    Aborted,
}

enum InitiatorState {
    Init,
    SentMsg1 { na: Nonce, na2: Nonce },
    RecvMsg2 { ks: SymmetricKey, ticket: Ticket, na2: Nonce },
    SentMsg3 { ks: SymmetricKey, na2: Nonce },
    RecvMsg4 { ks: SymmetricKey, nb: Nonce },
    SentMsg5 { ks: SymmetricKey },
    Done,
    Aborted,
}

/// The party that asks the KDC for a session key with the responder, then proves to the
/// responder that it holds that key.
///
/// The transitions can be driven one by one by a caller that owns the transport, or all at once
/// over blocking channels with `run`. Any failure moves the initiator to `Aborted` for good.
pub struct Initiator<C: CryptoLayer, App: ApplicationLayer> {
    app: App,
    ida: Identity,
    idb: Identity,
    ka: SymmetricKey,
    state: InitiatorState,
    _crypto: PhantomData<C>,
}

impl<C: CryptoLayer, App: ApplicationLayer> Initiator<C, App> {
    /// Prepare to establish a session between `ida` and `idb`, where `ka` is the long-term key
    /// `ida` shares with the KDC.
    pub fn new(app: App, ida: Identity, idb: Identity, ka: SymmetricKey) -> Self {
        Self { app, ida, idb, ka, state: InitiatorState::Init, _crypto: PhantomData }
    }

    pub fn phase(&self) -> InitiatorPhase {
        match &self.state {
            InitiatorState::Init => InitiatorPhase::Init,
            InitiatorState::SentMsg1 { .. } => InitiatorPhase::SentMsg1,
            InitiatorState::RecvMsg2 { .. } => InitiatorPhase::RecvMsg2,
            InitiatorState::SentMsg3 { .. } => InitiatorPhase::SentMsg3,
            InitiatorState::RecvMsg4 { .. } => InitiatorPhase::RecvMsg4,
            InitiatorState::SentMsg5 { .. } => InitiatorPhase::SentMsg5,
            InitiatorState::Done => InitiatorPhase::Done,
            InitiatorState::Aborted => InitiatorPhase::Aborted,
        }
    }

    pub fn app(&mut self) -> &mut App {
        &mut self.app
    }

    fn abort(&mut self, e: ProtocolError) -> ProtocolError {
        self.state = InitiatorState::Aborted;
        log!(self.app, LogEvent::Aborted(&e));
        e
    }

    fn take_state(&mut self) -> InitiatorState {
        std::mem::replace(&mut self.state, InitiatorState::Aborted)
    }

    /// Draw Na and Na2 and produce Message #1 for the KDC.
    ///
    /// The two nonces must differ, otherwise the challenge of Message #3 would repeat the one
    /// of Message #1 and the initiator aborts with `NonceReuse`.
    pub fn send_msg1(&mut self, nonces: &mut impl NonceSource) -> Result<Vec<u8>, ProtocolError> {
        let InitiatorState::Init = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::SendMsg1)));
        };
        let na = nonces.next_nonce();
        let na2 = nonces.next_nonce();
        if secure_eq(&na.0, &na2.0) {
            return Err(self.abort(fault!(ErrorKind::NonceReuse, Step::DrawNonces)));
        }
        log!(self.app, LogEvent::DrewNonces { na, na2 });

        let msg1 = Message1 { ida: self.ida.clone(), idb: self.idb.clone(), na }.encode();
        log!(self.app, LogEvent::SentMsg1(msg1.len()));
        self.state = InitiatorState::SentMsg1 { na, na2 };
        Ok(msg1)
    }

    /// Open Message #2 with Ka and check that it answers our Message #1.
    pub fn recv_msg2(&mut self, ciphertext: &[u8]) -> Result<(), ProtocolError> {
        let InitiatorState::SentMsg1 { na, na2 } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::OpenMsg2)));
        };
        let msg2 = Message2::open::<C::Cipher>(ciphertext, &self.ka).map_err(|e| self.abort(e.at(Step::OpenMsg2)))?;
        log!(
            self.app,
            LogEvent::ReceivedMsg2 {
                session_key: msg2.session_key.fingerprint::<C::Hash>(),
                ticket_len: msg2.ticket.len(),
            }
        );

        if msg2.idb != self.idb {
            return Err(self.abort(fault!(ErrorKind::AuthenticationMismatch, Step::VerifyIdB)));
        }
        log!(self.app, LogEvent::IdBMatch(&msg2.idb));
        if !secure_eq(&msg2.na.0, &na.0) {
            return Err(self.abort(fault!(ErrorKind::AuthenticationMismatch, Step::VerifyNa)));
        }
        log!(self.app, LogEvent::NaValid(msg2.na));

        self.state = InitiatorState::RecvMsg2 { ks: msg2.session_key, ticket: msg2.ticket, na2 };
        Ok(())
    }

    /// Forward the ticket, untouched, together with Na2 as Message #3 for the responder.
    pub fn send_msg3(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let InitiatorState::RecvMsg2 { ks, ticket, na2 } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::SendMsg3)));
        };
        let msg3 = Message3 { ticket, na2 }.encode().map_err(|e| self.abort(e.at(Step::SendMsg3)))?;
        log!(self.app, LogEvent::SentMsg3(msg3.len()));
        self.state = InitiatorState::SentMsg3 { ks, na2 };
        Ok(msg3)
    }

    /// Open Message #4 with Ks and check that the responder answered Na2 with `f(Na2)`.
    pub fn recv_msg4(&mut self, ciphertext: &[u8]) -> Result<(), ProtocolError> {
        let InitiatorState::SentMsg3 { ks, na2 } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::OpenMsg4)));
        };
        let msg4 = Message4::open::<C::Cipher>(ciphertext, &ks).map_err(|e| self.abort(e.at(Step::OpenMsg4)))?;
        log!(self.app, LogEvent::ReceivedMsg4 { f_na2: msg4.f_na2, nb: msg4.nb });
        if !na2.is_answered_by(&msg4.f_na2) {
            return Err(self.abort(fault!(ErrorKind::AuthenticationMismatch, Step::VerifyFNa2)));
        }
        log!(self.app, LogEvent::FNa2Valid(msg4.f_na2));
        self.state = InitiatorState::RecvMsg4 { ks, nb: msg4.nb };
        Ok(())
    }

    /// Answer the responder's Nb with `f(Nb)` sealed under Ks as Message #5.
    pub fn send_msg5(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let InitiatorState::RecvMsg4 { ks, nb } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::BuildMsg5)));
        };
        let msg5 = Message5 { f_nb: nb.challenge_response() };
        let ciphertext = msg5.seal::<C::Cipher>(&ks).map_err(|e| self.abort(e.at(Step::BuildMsg5)))?;
        log!(self.app, LogEvent::SentMsg5(msg5.f_nb));
        self.state = InitiatorState::SentMsg5 { ks };
        Ok(ciphertext)
    }

    /// Hand out the session key once Message #5 is on its way.
    pub fn finish(&mut self) -> Result<Established, ProtocolError> {
        let InitiatorState::SentMsg5 { ks } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::Finish)));
        };
        self.state = InitiatorState::Done;
        log!(self.app, LogEvent::Completed);
        Ok(Established { session_key: ks, peer: self.idb.clone() })
    }

    /// Run the whole exchange over blocking channels to the KDC and to the responder.
    pub fn run<R1: Read, W1: Write, R2: Read, W2: Write>(
        &mut self,
        nonces: &mut impl NonceSource,
        mut from_kdc: R1,
        mut to_kdc: W1,
        mut from_responder: R2,
        mut to_responder: W2,
    ) -> Result<Established, ProtocolError> {
        let max = C::SETTINGS.max_field_size;

        let msg1 = self.send_msg1(nonces)?;
        write_message(&mut to_kdc, &msg1).map_err(|e| self.abort(e.at(Step::SendMsg1)))?;

        let msg2 = read_frame(&mut from_kdc, max).map_err(|e| self.abort(e.at(Step::ReadMsg2)))?;
        self.recv_msg2(&msg2)?;

        let msg3 = self.send_msg3()?;
        write_message(&mut to_responder, &msg3).map_err(|e| self.abort(e.at(Step::SendMsg3)))?;

        let msg4 = read_frame(&mut from_responder, max).map_err(|e| self.abort(e.at(Step::ReadMsg4)))?;
        self.recv_msg4(&msg4)?;

        let msg5 = self.send_msg5()?;
        write_frame(&mut to_responder, &msg5).map_err(|e| self.abort(e.at(Step::SendMsg5)))?;

        self.finish()
    }
}
