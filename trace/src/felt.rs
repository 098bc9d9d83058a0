// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Field element helpers.
//!
//! All arithmetic in the system is over the scalar field of BLS12-377. The
//! element type is re-exported as [Felt]; everything else in this module is a
//! small set of conventions layered on top of it:
//!
//! * [inv0] extends the multiplicative inverse with `inv0(0) = 0`,
//! * comparisons between elements use the canonical unsigned-integer order
//!   (this is the [Ord] impl of the underlying type),
//! * [to_le_bytes] exposes the canonical little-endian representation through
//!   which all byte decompositions flow.

use ark_ff::{BigInteger, Field, PrimeField};

pub use ark_ff::{One, Zero};

/// A field element: a member of the BLS12-377 scalar field.
pub type Felt = ark_bls12_377::Fr;

// HELPER FUNCTIONS
// ================================================================================================

/// Returns the multiplicative inverse of `x`, under the convention that the
/// inverse of zero is zero.
pub fn inv0(x: Felt) -> Felt {
    x.inverse().unwrap_or_else(Felt::zero)
}

/// Raises `x` to the power `n` by square-and-multiply.
pub fn pow(x: Felt, n: u64) -> Felt {
    x.pow([n])
}

/// Returns 2^n as a field element.
pub fn two_pow(n: u32) -> Felt {
    pow(Felt::from(2u64), n as u64)
}

/// Returns the canonical little-endian byte representation of `x`.
pub fn to_le_bytes(x: Felt) -> Vec<u8> {
    x.into_bigint().to_bytes_le()
}

/// Builds a field element from a sign in `{-1, 0, 1}` and a little-endian
/// sequence of 32-bit words, as produced by the binary-file frontend.
pub fn from_words(sign: i8, words: &[u32]) -> Felt {
    let radix = Felt::from(1u64 << 32);
    let mut base = Felt::one();
    let mut val = Felt::zero();
    for &word in words {
        val += Felt::from(word as u64) * base;
        base *= radix;
    }
    if sign < 0 {
        val = -val;
    }
    val
}

// TESTS
// ================================================================================================
