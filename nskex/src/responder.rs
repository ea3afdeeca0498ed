use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::application::*;
use crate::identity::Identity;
use crate::keys::{Established, SymmetricKey};
use crate::log_event::log;
use crate::messages::*;
use crate::nonce::Nonce;
use crate::result::{fault, ErrorKind, ProtocolError, Step};
use crate::wire::{read_frame, write_frame};
#[cfg(feature = "logging")]
use crate::LogEvent;

/// Where the responder is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponderPhase {
    AwaitMsg3,
    RecvMsg3,
    SentMsg4,
    RecvMsg5,
    Done,
    Aborted,
}

enum ResponderState {
    AwaitMsg3,
    RecvMsg3 { ks: SymmetricKey, ida: Identity, na2: Nonce },
    SentMsg4 { ks: SymmetricKey, ida: Identity, nb: Nonce },
    RecvMsg5 { ks: SymmetricKey, ida: Identity },
    Done,
    Aborted,
}

/// The party that learns the session key from a ticket forwarded by the initiator, without ever
/// talking to the KDC.
pub struct Responder<C: CryptoLayer, App: ApplicationLayer> {
    app: App,
    kb: SymmetricKey,
    state: ResponderState,
    _crypto: PhantomData<C>,
}

impl<C: CryptoLayer, App: ApplicationLayer> Responder<C, App> {
    /// `kb` is the long-term key the responder shares with the KDC.
    pub fn new(app: App, kb: SymmetricKey) -> Self {
        Self { app, kb, state: ResponderState::AwaitMsg3, _crypto: PhantomData }
    }

    pub fn phase(&self) -> ResponderPhase {
        match &self.state {
            ResponderState::AwaitMsg3 => ResponderPhase::AwaitMsg3,
            ResponderState::RecvMsg3 { .. } => ResponderPhase::RecvMsg3,
            ResponderState::SentMsg4 { .. } => ResponderPhase::SentMsg4,
            ResponderState::RecvMsg5 { .. } => ResponderPhase::RecvMsg5,
            ResponderState::Done => ResponderPhase::Done,
            ResponderState::Aborted => ResponderPhase::Aborted,
        }
    }

    pub fn app(&mut self) -> &mut App {
        &mut self.app
    }

    fn abort(&mut self, e: ProtocolError) -> ProtocolError {
        self.state = ResponderState::Aborted;
        log!(self.app, LogEvent::Aborted(&e));
        e
    }

    fn take_state(&mut self) -> ResponderState {
        std::mem::replace(&mut self.state, ResponderState::Aborted)
    }

    /// Open the ticket carried by Message #3 with Kb to learn Ks and IDa.
    pub fn recv_msg3(&mut self, msg3: Message3) -> Result<(), ProtocolError> {
        let ResponderState::AwaitMsg3 = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::OpenTicket)));
        };
        log!(self.app, LogEvent::ReceivedMsg3 { ticket_len: msg3.ticket.len(), na2: msg3.na2 });
        let contents = msg3.ticket.open::<C::Cipher>(&self.kb).map_err(|e| self.abort(e.at(Step::OpenTicket)))?;
        log!(
            self.app,
            LogEvent::TicketOpened { ida: &contents.ida, session_key: contents.session_key.fingerprint::<C::Hash>() }
        );
        self.state = ResponderState::RecvMsg3 { ks: contents.session_key, ida: contents.ida, na2: msg3.na2 };
        Ok(())
    }

    /// Draw Nb and produce Message #4, `f(Na2) || Nb` sealed under Ks.
    pub fn send_msg4(&mut self, nonces: &mut impl NonceSource) -> Result<Vec<u8>, ProtocolError> {
        let ResponderState::RecvMsg3 { ks, ida, na2 } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::BuildMsg4)));
        };
        let msg4 = Message4 { f_na2: na2.challenge_response(), nb: nonces.next_nonce() };
        let ciphertext = msg4.seal::<C::Cipher>(&ks).map_err(|e| self.abort(e.at(Step::BuildMsg4)))?;
        log!(self.app, LogEvent::SentMsg4 { f_na2: msg4.f_na2, nb: msg4.nb });
        self.state = ResponderState::SentMsg4 { ks, ida, nb: msg4.nb };
        Ok(ciphertext)
    }

    /// Open Message #5 with Ks and check that the initiator answered Nb with `f(Nb)`.
    pub fn recv_msg5(&mut self, ciphertext: &[u8]) -> Result<(), ProtocolError> {
        let ResponderState::SentMsg4 { ks, ida, nb } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::OpenMsg5)));
        };
        let msg5 = Message5::open::<C::Cipher>(ciphertext, &ks).map_err(|e| self.abort(e.at(Step::OpenMsg5)))?;
        log!(self.app, LogEvent::ReceivedMsg5(msg5.f_nb));
        if !nb.is_answered_by(&msg5.f_nb) {
            return Err(self.abort(fault!(ErrorKind::AuthenticationMismatch, Step::VerifyFNb)));
        }
        log!(self.app, LogEvent::FNbValid(msg5.f_nb));
        self.state = ResponderState::RecvMsg5 { ks, ida };
        Ok(())
    }

    /// Hand out the session key and the identity of the initiator it is shared with.
    pub fn finish(&mut self) -> Result<Established, ProtocolError> {
        let ResponderState::RecvMsg5 { ks, ida } = self.take_state() else {
            return Err(self.abort(fault!(ErrorKind::OutOfSequence, Step::Finish)));
        };
        self.state = ResponderState::Done;
        log!(self.app, LogEvent::Completed);
        Ok(Established { session_key: ks, peer: ida })
    }

    /// Run the whole exchange over blocking channels to the initiator.
    pub fn run<R: Read, W: Write>(
        &mut self,
        nonces: &mut impl NonceSource,
        mut from_initiator: R,
        mut to_initiator: W,
    ) -> Result<Established, ProtocolError> {
        let max = C::SETTINGS.max_field_size;

        let msg3 = Message3::read_from(&mut from_initiator, max).map_err(|e| self.abort(e.at(Step::ReadMsg3)))?;
        self.recv_msg3(msg3)?;

        let msg4 = self.send_msg4(nonces)?;
        write_frame(&mut to_initiator, &msg4).map_err(|e| self.abort(e.at(Step::SendMsg4)))?;

        let msg5 = read_frame(&mut from_initiator, max).map_err(|e| self.abort(e.at(Step::ReadMsg5)))?;
        self.recv_msg5(&msg5)?;

        self.finish()
    }
}
