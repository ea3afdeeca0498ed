//! Runs one key exchange between three threads wired together by four in-memory pipes:
//! initiator to KDC, KDC to initiator, initiator to responder and responder to initiator.
//!
//! With no arguments every key and nonce is a fixed test vector. Otherwise pass
//! `<initiator key file> <responder key file> <session key file>`, each holding a 32 byte key
//! followed by a 16 byte IV, and nonces are drawn from the OS.
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use nskex::application::{ApplicationLayer, NonceSource, StaticKeys};
use nskex::crypto_impl::{DefaultCrypto, OsRng};
use nskex::pipe::pipe;
use nskex::*;

struct Named(&'static str);

impl ApplicationLayer for Named {
    #[cfg(feature = "logging")]
    fn event_log(&mut self, event: LogEvent<'_>) {
        println!("> [{}] {:?}", self.0, event);
    }
}

enum Nonces {
    Fixed(FixedNonces),
    Random(RngNonces<OsRng>),
}

impl NonceSource for Nonces {
    fn next_nonce(&mut self) -> Nonce {
        match self {
            Nonces::Fixed(n) => n.next_nonce(),
            Nonces::Random(n) => n.next_nonce(),
        }
    }
}

struct Provisioning {
    ka: SymmetricKey,
    kb: SymmetricKey,
    ks: SymmetricKey,
    alice_nonces: Nonces,
    bob_nonces: Nonces,
}

fn provision() -> Result<Provisioning, String> {
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    match paths.as_slice() {
        [] => Ok(Provisioning {
            ka: SymmetricKey::new([0x41; 32], [0x61; 16]),
            kb: SymmetricKey::new([0x42; 32], [0x62; 16]),
            ks: SymmetricKey::new([0x53; 32], [0x73; 16]),
            alice_nonces: Nonces::Fixed(FixedNonces::new([0x11223344, 0xaabbccdd])),
            bob_nonces: Nonces::Fixed(FixedNonces::new([0x66778899])),
        }),
        [ka, kb, ks] => {
            let load = |p: &PathBuf| SymmetricKey::load(p).map_err(|e| format!("{}: {}", p.display(), e));
            Ok(Provisioning {
                ka: load(ka)?,
                kb: load(kb)?,
                ks: load(ks)?,
                alice_nonces: Nonces::Random(RngNonces(OsRng)),
                bob_nonces: Nonces::Random(RngNonces(OsRng)),
            })
        }
        _ => Err("usage: dispatcher [<initiator key file> <responder key file> <session key file>]".into()),
    }
}

fn main() -> ExitCode {
    let Provisioning { ka, kb, ks, mut alice_nonces, mut bob_nonces } = match provision() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let (Some(amal), Some(basim)) = (Identity::new("Amal is Hope"), Identity::new("Basim is Smily")) else {
        return ExitCode::FAILURE;
    };
    let directory = StaticKeys::new(ks).with_principal(amal.clone(), ka.clone()).with_principal(basim.clone(), kb.clone());

    let (alice_to_kdc, kdc_from_alice) = pipe();
    let (kdc_to_alice, alice_from_kdc) = pipe();
    let (alice_to_bob, bob_from_alice) = pipe();
    let (bob_to_alice, alice_from_bob) = pipe();

    let (kdc, alice, bob) = thread::scope(|s| {
        let kdc = s.spawn(move || {
            Kdc::<DefaultCrypto, _, _>::new(Named("kdc"), directory).run(kdc_from_alice, kdc_to_alice)
        });
        let alice = s.spawn(move || {
            Initiator::<DefaultCrypto, _>::new(Named("amal"), amal, basim, ka).run(
                &mut alice_nonces,
                alice_from_kdc,
                alice_to_kdc,
                alice_from_bob,
                alice_to_bob,
            )
        });
        let bob = s.spawn(move || {
            Responder::<DefaultCrypto, _>::new(Named("basim"), kb).run(&mut bob_nonces, bob_from_alice, bob_to_alice)
        });
        (kdc.join(), alice.join(), bob.join())
    });

    let mut ok = true;
    match kdc {
        Ok(Ok(())) => println!("[kdc] served one request"),
        Ok(Err(e)) => {
            println!("[kdc] FAILED: {}", e);
            ok = false;
        }
        Err(_) => ok = false,
    }
    for (name, outcome) in [("amal", alice), ("basim", bob)] {
        match outcome {
            Ok(Ok(done)) => println!("[{}] established a session with {}", name, done.peer),
            Ok(Err(e)) => {
                println!("[{}] FAILED: {}", name, e);
                ok = false;
            }
            Err(_) => ok = false,
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
