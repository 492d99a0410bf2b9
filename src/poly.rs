// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

use crate::kex::{KexResult, SymmetricProvider};
use crate::ntt;
use crate::params::{N, NONCE_BYTES, Q, SEED_BYTES, STREAM_BYTES};
use crate::reduce;
use zeroize::{Zeroize, Zeroizing};

/// Represents a polynomial of degree N over Z_q. Whether the coefficients
/// are in the time domain or the NTT domain is tracked by the caller; the
/// in-memory shape is the same.
#[derive(Clone, Copy)]
pub struct Poly {
    pub coeffs: [i32; N],
}

/// For some reason can't simply derive the Default trait
impl Default for Poly {
    fn default() -> Self {
        Poly { coeffs: [0i32; N] }
    }
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

/// Map every coefficient from a signed representative to canonical [0, q).
pub fn correction(a: &mut Poly) {
    for coeff in a.coeffs.iter_mut() {
        *coeff = reduce::correct(*coeff);
    }
}

/// Reduce every coefficient to a representative in [0, 2q).
pub fn two_reduce(a: &mut Poly) {
    for coeff in a.coeffs.iter_mut() {
        *coeff = reduce::two_reduce(*coeff);
    }
}

/// Multiply every coefficient by a small positive scalar, reducing back to
/// canonical form. Applied to NTT-domain error polynomials with k = 3 or
/// k = 81, so the intermediate product stays well inside 32 bits; the
/// shifted-add reduction is applied twice to cover k up to ~100.
pub fn smul(a: &mut Poly, k: i32) {
    for coeff in a.coeffs.iter_mut() {
        let t = reduce::two_reduce(*coeff * k);
        *coeff = reduce::reduce_once(reduce::two_reduce(t));
    }
}

/// Inplace forward NTT. Standard order in, bit-reversed order out,
/// canonical coefficients out.
pub fn ntt(a: &mut Poly) {
    ntt::forward(&mut a.coeffs);
}

/// Inplace inverse NTT. Bit-reversed order in, standard order out, output
/// coefficients bounded by 2q.
pub fn inv_ntt(a: &mut Poly) {
    ntt::inverse(&mut a.coeffs);
}

/// Pointwise multiplication of polynomials in NTT domain representation.
///
/// # Arguments
///
/// * 'a' - 1st input polynomial
/// * 'b' - 2nd input polynomial
/// * 'c' - output polynomial
pub fn pmul(a: &Poly, b: &Poly, c: &mut Poly) {
    for i in 0..N {
        c.coeffs[i] = reduce::mul_reduce(a.coeffs[i], b.coeffs[i]);
    }
}

/// Pointwise multiply-add in the NTT domain: d = a * b + c with canonical
/// output. The addend must already be canonical.
pub fn pmuladd(a: &Poly, b: &Poly, c: &Poly, d: &mut Poly) {
    for i in 0..N {
        let t = reduce::mul_reduce(a.coeffs[i], b.coeffs[i]);
        d.coeffs[i] = reduce::reduce_once(t + c.coeffs[i]);
    }
}

/// Expand a public seed into a polynomial with every coefficient uniform
/// in [0, q). The result is treated as already being in the NTT domain.
pub fn uniform<P: SymmetricProvider + ?Sized>(
    a: &mut Poly,
    provider: &P,
    seed: &[u8; SEED_BYTES],
) -> KexResult<()> {
    provider.expand_uniform(seed, &mut a.coeffs)
}

/// Sample a polynomial with centered binomial coefficients by streaming
/// 3N bytes and counting bit differences. Each coefficient is the
/// popcount of 12 "plus" bits minus the popcount of 12 "minus" bits, so
/// the result lies in [-12, 12].
///
/// The stream is consumed as little-endian 32-bit words. Word i and word
/// i + N/4 feed two accumulators whose byte lanes hold per-coefficient bit
/// counts; word i + N/2 tops both up, its low nibbles going to the first
/// accumulator and its high nibbles to the second.
pub fn get_error<P: SymmetricProvider + ?Sized>(
    e: &mut Poly,
    provider: &P,
    seed: &[u8; SEED_BYTES],
    nonce: u8,
) -> KexResult<()> {
    let mut stream = Zeroizing::new([0u8; STREAM_BYTES]);
    let mut n = [0u8; NONCE_BYTES];
    n[0] = nonce;
    provider.stream_bytes(seed, &n, stream.as_mut())?;

    let word = |idx: usize| {
        u32::from_le_bytes([
            stream[4 * idx],
            stream[4 * idx + 1],
            stream[4 * idx + 2],
            stream[4 * idx + 3],
        ])
    };
    for i in 0..N / 4 {
        let w0 = word(i);
        let w1 = word(i + N / 4);
        let w2 = word(i + N / 2);
        let mut acc1 = 0u32;
        let mut acc2 = 0u32;
        for j in 0..8 {
            acc1 += (w0 >> j) & 0x01010101;
            acc2 += (w1 >> j) & 0x01010101;
        }
        for j in 0..4 {
            acc1 += (w2 >> j) & 0x01010101;
            acc2 += (w2 >> (j + 4)) & 0x01010101;
        }
        let b = acc1.to_le_bytes();
        e.coeffs[2 * i] = b[0] as i32 - b[1] as i32;
        e.coeffs[2 * i + 1] = b[2] as i32 - b[3] as i32;
        let b = acc2.to_le_bytes();
        e.coeffs[2 * i + N / 2] = b[0] as i32 - b[1] as i32;
        e.coeffs[2 * i + N / 2 + 1] = b[2] as i32 - b[3] as i32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetric::DefaultProvider;

    fn canonicalize(a: &mut Poly) {
        two_reduce(a);
        correction(a);
    }

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

    /// Schoolbook multiplication in Z_q[X]/(X^N + 1), the oracle for the
    /// whole transform pipeline.
    fn negacyclic_mul(a: &Poly, b: &Poly) -> Poly {
        let mut acc = vec![0i64; N];
        for i in 0..N {
            for j in 0..N {
                let k = (i + j) % N;
                let sign = if i + j < N { 1 } else { -1 };
                acc[k] = (acc[k] + sign * a.coeffs[i] as i64 * b.coeffs[j] as i64)
                    .rem_euclid(Q as i64);
            }
        }
        let mut c = Poly::default();
        for i in 0..N {
            c.coeffs[i] = acc[i] as i32;
        }
        c
    }

    #[test]
    fn ntt_multiplication_matches_schoolbook() {
        // small sparse inputs keep the oracle readable; the transform path
        // is identical for dense ones
        let mut a = Poly::default();
        let mut b = Poly::default();
        a.coeffs[0] = 5;
        a.coeffs[1] = 1;
        a.coeffs[1023] = Q - 2;
        b.coeffs[0] = 3;
        b.coeffs[2] = 7;
        b.coeffs[700] = 11;
        let expect = negacyclic_mul(&a, &b);

        let mut c = Poly::default();
        ntt(&mut a);
        ntt(&mut b);
        pmul(&a, &b, &mut c);
        inv_ntt(&mut c);
        canonicalize(&mut c);
        assert_eq!(c.coeffs[..], expect.coeffs[..]);
    }

    #[test]
    fn ntt_multiplication_matches_schoolbook_dense() {
        let mut a = test_poly(0x9e3779b97f4a7c15);
        let mut b = test_poly(0xd1b54a32d192ed03);
        let expect = negacyclic_mul(&a, &b);

        let mut c = Poly::default();
        ntt(&mut a);
        ntt(&mut b);
        pmul(&a, &b, &mut c);
        inv_ntt(&mut c);
        canonicalize(&mut c);
        assert_eq!(c.coeffs[..], expect.coeffs[..]);
    }

    #[test]
    fn pmul_is_commutative() {
        let a = test_poly(1);
        let b = test_poly(2);
        let mut ab = Poly::default();
        let mut ba = Poly::default();
        pmul(&a, &b, &mut ab);
        pmul(&b, &a, &mut ba);
        assert_eq!(ab.coeffs[..], ba.coeffs[..]);
    }

    #[test]
    fn pmul_distributes_over_addition() {
        let a = test_poly(3);
        let b = test_poly(4);
        let c = test_poly(5);
        // (b + c) reduced coefficient-wise
        let mut bc = Poly::default();
        for i in 0..N {
            bc.coeffs[i] = reduce::reduce_once(b.coeffs[i] + c.coeffs[i]);
        }
        let mut lhs = Poly::default();
        pmul(&a, &bc, &mut lhs);
        let mut ab = Poly::default();
        let mut ac = Poly::default();
        pmul(&a, &b, &mut ab);
        pmul(&a, &c, &mut ac);
        for i in 0..N {
            let rhs = reduce::reduce_once(ab.coeffs[i] + ac.coeffs[i]);
            assert_eq!(lhs.coeffs[i], rhs);
        }
    }

    #[test]
    fn pmuladd_matches_pmul_plus_add() {
        let a = test_poly(6);
        let b = test_poly(7);
        let c = test_poly(8);
        let mut d = Poly::default();
        pmuladd(&a, &b, &c, &mut d);
        let mut p = Poly::default();
        pmul(&a, &b, &mut p);
        for i in 0..N {
            assert_eq!(d.coeffs[i], reduce::reduce_once(p.coeffs[i] + c.coeffs[i]));
        }
    }

    #[test]
    fn smul_matches_plain_scaling() {
        for k in [3, 81] {
            let mut a = test_poly(9);
            let expect: Vec<i32> = a.coeffs.iter().map(|&x| (x * k) % Q).collect();
            smul(&mut a, k);
            assert_eq!(a.coeffs[..], expect[..]);
            assert!(a.coeffs.iter().all(|&x| (0..Q).contains(&x)));
        }
    }

    #[test]
    fn get_error_is_deterministic_and_bounded() {
        let provider = DefaultProvider;
        let seed = [0x42u8; SEED_BYTES];
        let mut e1 = Poly::default();
        let mut e2 = Poly::default();
        get_error(&mut e1, &provider, &seed, 0).unwrap();
        get_error(&mut e2, &provider, &seed, 0).unwrap();
        assert_eq!(e1.coeffs[..], e2.coeffs[..]);
        assert!(e1.coeffs.iter().all(|&x| (-12..=12).contains(&x)));
        // the distribution is centered; a wildly skewed sum means the bit
        // counting went wrong
        let sum: i32 = e1.coeffs.iter().sum();
        assert!(sum.abs() < 400, "sum = {sum}");
    }

    #[test]
    fn get_error_differs_per_nonce() {
        let provider = DefaultProvider;
        let seed = [0x42u8; SEED_BYTES];
        let mut e1 = Poly::default();
        let mut e2 = Poly::default();
        get_error(&mut e1, &provider, &seed, 0).unwrap();
        get_error(&mut e2, &provider, &seed, 1).unwrap();
        assert_ne!(e1.coeffs[..], e2.coeffs[..]);
    }

    #[test]
    fn uniform_is_deterministic_and_canonical() {
        let provider = DefaultProvider;
        let seed = [7u8; SEED_BYTES];
        let mut a1 = Poly::default();
        let mut a2 = Poly::default();
        uniform(&mut a1, &provider, &seed).unwrap();
        uniform(&mut a2, &provider, &seed).unwrap();
        assert_eq!(a1.coeffs[..], a2.coeffs[..]);
        assert!(a1.coeffs.iter().all(|&x| (0..Q).contains(&x)));
    }
}
