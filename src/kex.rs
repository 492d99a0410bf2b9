// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! One-round R-LWE key agreement. The initiator runs keygen_a and sends
//! its 1824-byte message; the responder runs agree_b, derives the shared
//! secret and answers with its 2048-byte message; the initiator finishes
//! with agree_a. The exchange is unauthenticated; binding the messages to
//! identities is the caller's duty.

use crate::pack;
use crate::params::{MSG_A_BYTES, MSG_B_BYTES, N, NONCE_BYTES, SEED_BYTES, SHARED_BYTES};
use crate::poly::{self, Poly};
use crate::rec;
use core::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Possible failures of the key-exchange operations. Collaborator
/// failures are passed through verbatim after all secret temporaries have
/// been wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KexError {
    Generic,
    Test,
    Unknown,
    NotImplemented,
    OutOfMemory,
    InvalidParameter,
    SharedKey,
    TooManyIterations,
}

impl fmt::Display for KexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KexError::Generic => "generic error",
            KexError::Test => "test error",
            KexError::Unknown => "unknown error",
            KexError::NotImplemented => "not implemented",
            KexError::OutOfMemory => "out of memory",
            KexError::InvalidParameter => "invalid parameter",
            KexError::SharedKey => "shared key error",
            KexError::TooManyIterations => "too many iterations",
        };
        f.write_str(s)
    }
}

impl std::error::Error for KexError {}

pub type KexResult<T> = Result<T, KexError>;

/// The symmetric primitives the core depends on, passed explicitly to
/// each operation: a uniform byte source, an extendable-output function
/// expanding a seed into coefficients uniform mod q, and a keyed stream
/// with a short nonce.
pub trait SymmetricProvider {
    /// Fill `out` with cryptographically uniform bytes.
    fn random_bytes(&mut self, out: &mut [u8]) -> KexResult<()>;

    /// Expand `seed` into N coefficients, each uniform in [0, q).
    fn expand_uniform(&self, seed: &[u8; SEED_BYTES], out: &mut [i32; N]) -> KexResult<()>;

    /// Fill `out` from a pseudo-random stream keyed by `seed` and `nonce`.
    fn stream_bytes(
        &self,
        seed: &[u8; SEED_BYTES],
        nonce: &[u8; NONCE_BYTES],
        out: &mut [u8],
    ) -> KexResult<()>;
}

/// The initiator's private key, retained between keygen_a and agree_a.
/// Held in NTT domain and wiped on drop.
#[derive(Clone)]
pub struct SecretKey {
    poly: Poly,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.poly.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// The negotiated 256-bit secret, wiped on drop. Equality is evaluated in
/// constant time; the secret never meets a byte-wise short-circuiting
/// comparison.
#[derive(Clone)]
pub struct SharedSecret([u8; SHARED_BYTES]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; SHARED_BYTES] {
        &self.0
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        let mut acc = 0i32;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            acc |= (a ^ b) as i32;
        }
        // sign-bit mask of acc - 1: all ones exactly when every byte matched
        ((acc - 1) >> 31) & 1 == 1
    }
}

impl Eq for SharedSecret {}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Initiator step one: derive a key pair and the message for the
/// responder.
///
/// Returns the retained secret key and the 1824-byte message.
pub fn keygen_a<P: SymmetricProvider>(provider: &mut P) -> KexResult<(SecretKey, [u8; MSG_A_BYTES])> {
    let mut seed = [0u8; SEED_BYTES];
    provider.random_bytes(&mut seed)?;
    let mut noise_seed = Zeroizing::new([0u8; SEED_BYTES]);
    provider.random_bytes(noise_seed.as_mut())?;

    let mut a = Poly::default();
    poly::uniform(&mut a, provider, &seed)?;

    let mut s = Zeroizing::new(Poly::default());
    let mut e = Zeroizing::new(Poly::default());
    poly::get_error(&mut s, provider, &noise_seed, 0)?;
    poly::get_error(&mut e, provider, &noise_seed, 1)?;
    poly::ntt(&mut s);
    poly::ntt(&mut e);
    poly::smul(&mut e, 3);

    let mut b = Poly::default();
    poly::pmuladd(&a, &s, &e, &mut b);
    poly::correction(&mut b);

    let mut msg = [0u8; MSG_A_BYTES];
    pack::pack_a(&mut msg, &b, &seed);
    Ok((SecretKey { poly: *s }, msg))
}

/// Responder: consume the initiator's message, derive the shared secret
/// and the reply in a single step.
///
/// Returns the shared secret and the 2048-byte message.
pub fn agree_b<P: SymmetricProvider>(
    provider: &mut P,
    msg_a: &[u8],
) -> KexResult<(SharedSecret, [u8; MSG_B_BYTES])> {
    if msg_a.len() != MSG_A_BYTES {
        return Err(KexError::InvalidParameter);
    }
    let mut b = Poly::default();
    let mut seed = [0u8; SEED_BYTES];
    pack::unpack_a(&mut b, &mut seed, msg_a);

    let mut noise_seed = Zeroizing::new([0u8; SEED_BYTES]);
    provider.random_bytes(noise_seed.as_mut())?;

    let mut a = Poly::default();
    poly::uniform(&mut a, provider, &seed)?;

    let mut s = Zeroizing::new(Poly::default());
    let mut e = Zeroizing::new(Poly::default());
    poly::get_error(&mut s, provider, &noise_seed, 0)?;
    poly::get_error(&mut e, provider, &noise_seed, 1)?;
    poly::ntt(&mut s);
    poly::ntt(&mut e);
    poly::smul(&mut e, 3);

    let mut u = Poly::default();
    poly::pmuladd(&a, &s, &e, &mut u);
    poly::correction(&mut u);

    let mut ep = Zeroizing::new(Poly::default());
    poly::get_error(&mut ep, provider, &noise_seed, 2)?;
    poly::ntt(&mut ep);
    poly::smul(&mut ep, 81);

    let mut v = Zeroizing::new(Poly::default());
    poly::pmuladd(&b, &s, &ep, &mut v);
    poly::inv_ntt(&mut v);
    poly::two_reduce(&mut v);
    poly::correction(&mut v);

    let mut r = Zeroizing::new(Poly::default());
    rec::help_rec(&mut r, &v, provider, &noise_seed, 3)?;
    let mut key = Zeroizing::new([0u8; SHARED_BYTES]);
    rec::rec(&mut key, &v, &r);

    let mut msg = [0u8; MSG_B_BYTES];
    pack::pack_b(&mut msg, &u, &r);
    Ok((SharedSecret(*key), msg))
}

/// Initiator step two: consume the responder's message and derive the
/// shared secret. Needs no randomness.
pub fn agree_a(sk: &SecretKey, msg_b: &[u8]) -> KexResult<SharedSecret> {
    if msg_b.len() != MSG_B_BYTES {
        return Err(KexError::InvalidParameter);
    }
    let mut u = Poly::default();
    let mut r = Zeroizing::new(Poly::default());
    pack::unpack_b(&mut u, &mut r, msg_b);

    let mut w = Zeroizing::new(Poly::default());
    poly::pmul(&sk.poly, &u, &mut w);
    poly::inv_ntt(&mut w);
    poly::two_reduce(&mut w);
    poly::correction(&mut w);

    let mut key = Zeroizing::new([0u8; SHARED_BYTES]);
    rec::rec(&mut key, &w, &r);
    Ok(SharedSecret(*key))
}
