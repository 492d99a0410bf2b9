// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Default symmetric collaborators backed by the `sha3` crate: SHAKE128
//! for expanding the public seed and cSHAKE128, keyed by the short nonce,
//! for the pseudo-random streams. The core consumes these only through
//! the SymmetricProvider trait, so alternative primitives can be swapped
//! in without touching the arithmetic.

use crate::kex::{KexError, KexResult, SymmetricProvider};
use crate::params::{N, NONCE_BYTES, Q, SEED_BYTES};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{CShake128, CShake128Core, Shake128};

const SHAKE128_RATE: usize = 168;
// Uniform values mod q come from 16-bit chunks rejected above 5q; with a
// ~94% acceptance rate this bound is never approached.
const MAX_BLOCKS: usize = 64;
const REJECTION_BOUND: u32 = 5 * Q as u32;

/// Operating-system randomness plus SHAKE-based expansion.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultProvider;

impl SymmetricProvider for DefaultProvider {
    fn random_bytes(&mut self, out: &mut [u8]) -> KexResult<()> {
        OsRng.try_fill_bytes(out).map_err(|_| KexError::Generic)
    }

    fn expand_uniform(&self, seed: &[u8; SEED_BYTES], out: &mut [i32; N]) -> KexResult<()> {
        let mut hasher = Shake128::default();
        hasher.update(seed);
        let mut xof = hasher.finalize_xof();

        let mut buf = [0u8; SHAKE128_RATE];
        let mut ctr = 0;
        let mut blocks = 0;
        while ctr < N {
            if blocks == MAX_BLOCKS {
                return Err(KexError::TooManyIterations);
            }
            xof.read(&mut buf);
            blocks += 1;
            for chunk in buf.chunks_exact(2) {
                let val = u16::from_le_bytes([chunk[0], chunk[1]]) as u32;
                if val < REJECTION_BOUND && ctr < N {
                    out[ctr] = (val % Q as u32) as i32;
                    ctr += 1;
                }
            }
        }
        Ok(())
    }

    fn stream_bytes(
        &self,
        seed: &[u8; SEED_BYTES],
        nonce: &[u8; NONCE_BYTES],
        out: &mut [u8],
    ) -> KexResult<()> {
        let mut hasher = CShake128::from_core(CShake128Core::new(nonce));
        hasher.update(seed);
        hasher.finalize_xof().read(out);
        Ok(())
    }
}
