// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Lattice reconciliation. The responder publishes a two-bit hint per
//! index (help_rec); both sides then decode their approximately equal
//! ring elements to the same 256-bit string (rec). Every comparison on
//! secret data is a sign-bit mask; there are no secret-dependent branches
//! or table lookups.

use crate::kex::{KexResult, SymmetricProvider};
use crate::params::{N, NONCE_BYTES, Q, SEED_BYTES, SHARED_BYTES};
use crate::poly::Poly;
use zeroize::Zeroizing;

// Rounded-up multiples of q/4, the decision thresholds of the two
// candidate lattice roundings.
const Q1_4: i32 = 3073;
const Q2_4: i32 = 6145;
const Q3_4: i32 = 9217;
const Q4_4: i32 = 12289;
const Q5_4: i32 = 15362;
const Q6_4: i32 = 18434;
const Q7_4: i32 = 21506;

const EIGHT_Q: i32 = 8 * Q;

fn abs_mask(x: i32) -> i32 {
    let mask = x >> 31;
    (x + mask) ^ mask
}

/// Compute the reconciliation hint for x, one value in [0, 4) per index.
/// The first 3N/4 indices carry independent hint bits; the last N/4 carry
/// the rounding selector. Coefficients of x must be canonical.
pub fn help_rec<P: SymmetricProvider + ?Sized>(
    r: &mut Poly,
    x: &Poly,
    provider: &P,
    seed: &[u8; SEED_BYTES],
    nonce: u8,
) -> KexResult<()> {
    let mut random_bits = Zeroizing::new([0u8; N / 32]);
    let mut n = [0u8; NONCE_BYTES];
    n[1] = nonce;
    provider.stream_bytes(seed, &n, random_bits.as_mut())?;

    for i in 0..N / 4 {
        let bit = ((random_bits[i >> 3] >> (i & 7)) & 1) as i32;
        let mut v0 = [0i32; 4];
        let mut v1 = [0i32; 4];
        let mut norm = 0i32;
        for j in 0..4 {
            let y = 2 * x.coeffs[i + (N / 4) * j] - bit;
            // v0 rounds y to the nearest multiple of q/2, v1 to the next
            // one down; each threshold contributes through its sign bit
            v0[j] = 4
                + ((y - Q1_4) >> 31)
                + ((y - Q3_4) >> 31)
                + ((y - Q5_4) >> 31)
                + ((y - Q7_4) >> 31);
            v1[j] = 3 + ((y - Q2_4) >> 31) + ((y - Q4_4) >> 31) + ((y - Q6_4) >> 31);
            norm += abs_mask(2 * y - Q * v0[j]);
        }
        // all ones when the nearer rounding wins
        let m = (norm - Q) >> 31;
        let rbit = m + 1;
        let c0 = (v0[0] & m) | (v1[0] & !m);
        let c1 = (v0[1] & m) | (v1[1] & !m);
        let c2 = (v0[2] & m) | (v1[2] & !m);
        let c3 = (v0[3] & m) | (v1[3] & !m);
        r.coeffs[i] = (c0 - c3) & 3;
        r.coeffs[i + N / 4] = (c1 - c3) & 3;
        r.coeffs[i + N / 2] = (c2 - c3) & 3;
        r.coeffs[i + 3 * N / 4] = (2 * c3 + rbit) & 3;
    }
    Ok(())
}

/// Decide one key bit from a 4-dimensional point: 1 when the point lies
/// closer to the origin sublattice than to the shifted one, measured in
/// the l1 norm folded to (-8q, 8q].
fn ld_decode(t: &[i32; 4]) -> u8 {
    let cneg = -EIGHT_Q;
    let mut norm = 0i32;
    for &ti in t.iter() {
        let mask1 = ti >> 31;
        let mask2 = (4 * Q - abs_mask(ti)) >> 31;
        let value = (mask1 & (EIGHT_Q ^ cneg)) ^ cneg;
        norm += abs_mask(ti + (mask2 & value));
    }
    ((((EIGHT_Q - norm) >> 31) ^ 1) & 1) as u8
}

/// Extract the 256-bit shared key from a ring element and the hint
/// vector. Coefficients of x must be canonical.
pub fn rec(key: &mut [u8; SHARED_BYTES], x: &Poly, r: &Poly) {
    key.fill(0);
    for i in 0..N / 4 {
        let hint = r.coeffs[i + 3 * N / 4];
        let t = [
            8 * x.coeffs[i] - (2 * r.coeffs[i] + hint) * Q,
            8 * x.coeffs[i + N / 4] - (2 * r.coeffs[i + N / 4] + hint) * Q,
            8 * x.coeffs[i + N / 2] - (2 * r.coeffs[i + N / 2] + hint) * Q,
            8 * x.coeffs[i + 3 * N / 4] - hint * Q,
        ];
        key[i >> 3] |= ld_decode(&t) << (i & 7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetric::DefaultProvider;

    fn test_poly(seed: u64) -> Poly {
        let mut a = Poly::default();
        let mut state = seed | 1;
        for x in a.coeffs.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *x = (state % Q as u64) as i32;
        }
        a
    }

    #[test]
    fn ld_decode_boundaries() {
        assert_eq!(ld_decode(&[0, 0, 0, 0]), 1);
        assert_eq!(ld_decode(&[4 * Q, 4 * Q, 4 * Q, 4 * Q]), 0);
    }

    #[test]
    fn ld_decode_folds_negatives() {
        // points near -8q fold back to the origin sublattice
        assert_eq!(ld_decode(&[-8 * Q + 1, 0, 0, 0]), 1);
        assert_eq!(ld_decode(&[8 * Q - 1, 0, 0, 0]), 1);
    }

    #[test]
    fn help_rec_output_in_range() {
        let provider = DefaultProvider;
        let seed = [0x11u8; SEED_BYTES];
        let x = test_poly(0xfeed_f00d);
        let mut r = Poly::default();
        help_rec(&mut r, &x, &provider, &seed, 3).unwrap();
        assert!(r.coeffs.iter().all(|&v| (0..4).contains(&v)));
    }

    #[test]
    fn help_rec_is_deterministic() {
        let provider = DefaultProvider;
        let seed = [0x22u8; SEED_BYTES];
        let x = test_poly(0xabad_cafe);
        let mut r1 = Poly::default();
        let mut r2 = Poly::default();
        help_rec(&mut r1, &x, &provider, &seed, 3).unwrap();
        help_rec(&mut r2, &x, &provider, &seed, 3).unwrap();
        assert_eq!(r1.coeffs[..], r2.coeffs[..]);
    }

    #[test]
    fn close_points_reconcile_to_the_same_key() {
        let provider = DefaultProvider;
        let seed = [0x33u8; SEED_BYTES];
        for trial in 0..8u64 {
            let v = test_poly(0x1000 + trial);
            let mut r = Poly::default();
            help_rec(&mut r, &v, &provider, &seed, 3).unwrap();
            let mut key_b = [0u8; SHARED_BYTES];
            rec(&mut key_b, &v, &r);

            // perturb by a bounded noise, far inside the decoding radius
            let mut w = v;
            let mut state = 0x5bd1_e995u64 | trial << 32;
            for c in w.coeffs.iter_mut() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let delta = (state % 201) as i32 - 100;
                *c = (*c + delta).rem_euclid(Q);
            }
            let mut key_a = [0u8; SHARED_BYTES];
            rec(&mut key_a, &w, &r);
            assert_eq!(key_a, key_b, "trial {trial}");
        }
    }

    #[test]
    fn distant_points_disagree() {
        let provider = DefaultProvider;
        let seed = [0x44u8; SEED_BYTES];
        let v = test_poly(0xdddd);
        let mut r = Poly::default();
        help_rec(&mut r, &v, &provider, &seed, 3).unwrap();
        let mut key_b = [0u8; SHARED_BYTES];
        rec(&mut key_b, &v, &r);
        let w = test_poly(0xeeee);
        let mut key_a = [0u8; SHARED_BYTES];
        rec(&mut key_a, &w, &r);
        assert_ne!(key_a, key_b);
    }
}
