// This file is part of rlwekex.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ring parameters
pub const Q: i32 = 12289; // prime defining the field, q = 3 * 2^12 + 1
pub const N: usize = 1024; // ring defining polynomial degree

// Sampling parameters
pub const SEED_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 8;
pub const STREAM_BYTES: usize = 3 * N; // bytes drawn per error polynomial

// Wire format
pub const POLY_BYTES: usize = 7 * N / 4; // 14 bits per coefficient
pub const REC_BYTES: usize = N / 4; // 2 bits per coefficient
pub const MSG_A_BYTES: usize = POLY_BYTES + SEED_BYTES;
pub const MSG_B_BYTES: usize = POLY_BYTES + REC_BYTES;
pub const SHARED_BYTES: usize = 32;
