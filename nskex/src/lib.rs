/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
//! A three party key exchange in the enhanced Needham-Schroeder style.
//!
//! An initiator asks a trusted key distribution center for a session key to talk with a
//! responder. The KDC answers with the session key sealed under the initiator's long-term key,
//! together with a ticket sealed under the responder's long-term key. The initiator forwards the
//! ticket, and the two parties then prove to each other that they hold the session key by
//! answering each other's nonce `n` with `n + 1`.
//!
//! ```text
//! 1. A -> KDC: IDa, IDb, Na
//! 2. KDC -> A: { Ks, IDb, Na, Ticket }Ka         Ticket = { Ks, IDa }Kb
//! 3. A -> B:   Ticket, Na2
//! 4. B -> A:   { f(Na2), Nb }Ks
//! 5. A -> B:   { f(Nb) }Ks
//! ```
//!
//! Each participant is a state machine that can be stepped by hand or run to completion over
//! blocking byte streams. Any failed check aborts the participant for good.
//#![warn(missing_docs, rust_2018_idioms)]
pub mod crypto;
pub mod crypto_impl;

mod identity;
mod initiator;
mod kdc;
mod keys;
mod log_event;
mod nonce;
mod responder;

pub mod application;
pub mod messages;
pub mod pipe;
pub mod proto;
pub mod result;
pub mod ticket;
pub mod wire;

pub use crate::identity::*;
pub use crate::initiator::*;
pub use crate::kdc::*;
pub use crate::keys::*;
pub use crate::log_event::LogEvent;
pub use crate::nonce::*;
pub use crate::responder::*;
