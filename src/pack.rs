// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

use crate::params::{N, POLY_BYTES, REC_BYTES, SEED_BYTES};
use crate::poly::Poly;

/// Bit-pack a polynomial with canonical coefficients of at most 14 bits.
/// Four coefficients fill seven bytes, little-endian within each byte.
pub fn poly_pack(r: &mut [u8], a: &Poly) {
    for i in 0..N / 4 {
        let c0 = a.coeffs[4 * i] as u32;
        let c1 = a.coeffs[4 * i + 1] as u32;
        let c2 = a.coeffs[4 * i + 2] as u32;
        let c3 = a.coeffs[4 * i + 3] as u32;
        r[7 * i] = c0 as u8;
        r[7 * i + 1] = ((c0 >> 8) | (c1 << 6)) as u8;
        r[7 * i + 2] = (c1 >> 2) as u8;
        r[7 * i + 3] = ((c1 >> 10) | (c2 << 4)) as u8;
        r[7 * i + 4] = (c2 >> 4) as u8;
        r[7 * i + 5] = ((c2 >> 12) | (c3 << 2)) as u8;
        r[7 * i + 6] = (c3 >> 6) as u8;
    }
}

/// Unpack a polynomial with 14-bit coefficients. Exact inverse of
/// poly_pack for inputs in [0, q).
pub fn poly_unpack(r: &mut Poly, a: &[u8]) {
    for i in 0..N / 4 {
        let b0 = a[7 * i] as u32;
        let b1 = a[7 * i + 1] as u32;
        let b2 = a[7 * i + 2] as u32;
        let b3 = a[7 * i + 3] as u32;
        let b4 = a[7 * i + 4] as u32;
        let b5 = a[7 * i + 5] as u32;
        let b6 = a[7 * i + 6] as u32;
        r.coeffs[4 * i] = ((b0 | (b1 << 8)) & 0x3FFF) as i32;
        r.coeffs[4 * i + 1] = (((b1 >> 6) | (b2 << 2) | (b3 << 10)) & 0x3FFF) as i32;
        r.coeffs[4 * i + 2] = (((b3 >> 4) | (b4 << 4) | (b5 << 12)) & 0x3FFF) as i32;
        r.coeffs[4 * i + 3] = (((b5 >> 2) | (b6 << 6)) & 0x3FFF) as i32;
    }
}

/// Pack the reconciliation vector, two bits per index, LSB first.
pub fn rec_pack(r: &mut [u8], a: &Poly) {
    for i in 0..N / 4 {
        r[i] = ((a.coeffs[4 * i] & 3)
            | ((a.coeffs[4 * i + 1] & 3) << 2)
            | ((a.coeffs[4 * i + 2] & 3) << 4)
            | ((a.coeffs[4 * i + 3] & 3) << 6)) as u8;
    }
}

/// Unpack the reconciliation vector.
pub fn rec_unpack(r: &mut Poly, a: &[u8]) {
    for i in 0..N / 4 {
        r.coeffs[4 * i] = (a[i] & 3) as i32;
        r.coeffs[4 * i + 1] = ((a[i] >> 2) & 3) as i32;
        r.coeffs[4 * i + 2] = ((a[i] >> 4) & 3) as i32;
        r.coeffs[4 * i + 3] = ((a[i] >> 6) & 3) as i32;
    }
}

/// Assemble the initiator message: packed public value b followed by the
/// seed for the public polynomial a.
pub fn pack_a(msg: &mut [u8], b: &Poly, seed: &[u8; SEED_BYTES]) {
    poly_pack(&mut msg[..POLY_BYTES], b);
    msg[POLY_BYTES..POLY_BYTES + SEED_BYTES].copy_from_slice(seed);
}

/// Split the initiator message back into b and the seed.
pub fn unpack_a(b: &mut Poly, seed: &mut [u8; SEED_BYTES], msg: &[u8]) {
    poly_unpack(b, &msg[..POLY_BYTES]);
    seed.copy_from_slice(&msg[POLY_BYTES..POLY_BYTES + SEED_BYTES]);
}

/// Assemble the responder message: packed public value u followed by the
/// packed reconciliation vector.
pub fn pack_b(msg: &mut [u8], u: &Poly, r: &Poly) {
    poly_pack(&mut msg[..POLY_BYTES], u);
    rec_pack(&mut msg[POLY_BYTES..POLY_BYTES + REC_BYTES], r);
}

/// Split the responder message back into u and the reconciliation vector.
pub fn unpack_b(u: &mut Poly, r: &mut Poly, msg: &[u8]) {
    poly_unpack(u, &msg[..POLY_BYTES]);
    rec_unpack(r, &msg[POLY_BYTES..POLY_BYTES + REC_BYTES]);
}
