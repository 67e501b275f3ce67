// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Low-level operations on wire-labels, the basic building block of garbled
//! circuits.
//!
//! A [`Bit`] is a λ-byte opaque label carrying one encoded bit; a [`Word`] is
//! an ordered sequence of `Bit`s encoding a small integer, least-significant
//! bit first. Under free-XOR garbling the label for value `1` on a wire with
//! zero-label `L0` is `L0 ⊕ Δ`, where Δ is a process-wide secret offset whose
//! low bit is fixed to `1` so that the two labels of every wire differ in
//! their point-and-permute colour.

use std::ops::{BitXor, BitXorAssign};

use once_cell::sync::OnceCell;
use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};

use crate::errors::Error;

/// Number of bytes in a wire label.
pub const LAMBDA_BYTES: usize = 16;

/// A wire label carrying one garbled bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Bit([u8; LAMBDA_BYTES]);

impl Bit {
    /// Wrap raw label bytes.
    pub fn new(bytes: [u8; LAMBDA_BYTES]) -> Self {
        Bit(bytes)
    }

    /// The raw label bytes.
    pub fn as_bytes(&self) -> &[u8; LAMBDA_BYTES] {
        &self.0
    }

    /// Sample a uniformly random label.
    pub fn rand<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; LAMBDA_BYTES];
        rng.fill_bytes(&mut bytes);
        Bit(bytes)
    }

    /// Sample a label usable as the global offset: byte 0 is forced odd so
    /// that XOR-ing with it flips the colour bit.
    pub fn rand_delta<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut w = Self::rand(rng);
        w.0[0] |= 1;
        w
    }

    /// The point-and-permute colour bit.
    pub fn color(&self) -> bool {
        self.0[0] & 1 == 1
    }

    /// Tweakable hash of the label, truncated back to label length.
    pub fn hash(&self, tweak: u64) -> Bit {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0);
        hasher.update(&tweak.to_le_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; LAMBDA_BYTES];
        out.copy_from_slice(&digest.as_bytes()[..LAMBDA_BYTES]);
        Bit(out)
    }

    /// Re-encode a zero-label: the label for `value` on this wire under the
    /// offset `delta`.
    pub fn encode(&self, value: bool, delta: &Bit) -> Bit {
        if value {
            self ^ delta
        } else {
            *self
        }
    }
}

impl BitXor for Bit {
    type Output = Bit;

    fn bitxor(mut self, rhs: Bit) -> Bit {
        self ^= &rhs;
        self
    }
}

impl BitXor<&Bit> for Bit {
    type Output = Bit;

    fn bitxor(mut self, rhs: &Bit) -> Bit {
        self ^= rhs;
        self
    }
}

impl BitXor<&Bit> for &Bit {
    type Output = Bit;

    fn bitxor(self, rhs: &Bit) -> Bit {
        *self ^ rhs
    }
}

impl BitXor<Bit> for &Bit {
    type Output = Bit;

    fn bitxor(self, rhs: Bit) -> Bit {
        *self ^ rhs
    }
}

impl BitXorAssign<&Bit> for Bit {
    fn bitxor_assign(&mut self, rhs: &Bit) {
        for (x, y) in self.0.iter_mut().zip(rhs.0.iter()) {
            *x ^= y;
        }
    }
}

impl ConstantTimeEq for Bit {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

/// An ordered sequence of labels encoding a `width`-bit integer, LSB first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Word {
    bits: Vec<Bit>,
}

impl Word {
    /// Build a word from its per-bit labels.
    pub fn from_bits(bits: Vec<Bit>) -> Self {
        Word { bits }
    }

    /// Sample a word of `width` uniformly random labels.
    pub fn rand<R: CryptoRng + RngCore>(rng: &mut R, width: usize) -> Self {
        Word {
            bits: (0..width).map(|_| Bit::rand(rng)).collect(),
        }
    }

    /// Number of bits in the word.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// The label for bit `i`.
    pub fn bit(&self, i: usize) -> &Bit {
        &self.bits[i]
    }

    /// Replace the label for bit `i`.
    pub fn set_bit(&mut self, i: usize, bit: Bit) {
        self.bits[i] = bit;
    }

    /// All per-bit labels, LSB first.
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Component-wise XOR; the widths must match.
    pub fn xor(&self, other: &Word) -> Result<Word, Error> {
        if self.width() != other.width() {
            return Err(Error::Config(format!(
                "cannot XOR words of widths {} and {}",
                self.width(),
                other.width()
            )));
        }
        Ok(Word {
            bits: self
                .bits
                .iter()
                .zip(other.bits.iter())
                .map(|(a, b)| a ^ b)
                .collect(),
        })
    }

    /// Re-encode a word of zero-labels: the labels for `value` under the
    /// offset `delta`, bit `i` of `value` encoded on bit `i` of the word.
    pub fn encode(&self, value: u64, delta: &Bit) -> Word {
        Word {
            bits: self
                .bits
                .iter()
                .enumerate()
                .map(|(i, bit)| bit.encode(i < 64 && (value >> i) & 1 == 1, delta))
                .collect(),
        }
    }
}

impl ConstantTimeEq for Word {
    fn ct_eq(&self, other: &Self) -> Choice {
        if self.width() != other.width() {
            return Choice::from(0);
        }
        self.bits
            .iter()
            .zip(other.bits.iter())
            .fold(Choice::from(1), |acc, (a, b)| acc & a.ct_eq(b))
    }
}

static DELTA: OnceCell<Bit> = OnceCell::new();

/// Install the process-wide free-XOR offset Δ.
///
/// Must be called exactly once, before any garbling begins, and only on the
/// garbling side; the evaluator's cell stays empty. The offset must be odd in
/// byte 0. A second install, or an even offset, fails.
pub fn set_delta(delta: Bit) -> Result<(), Error> {
    if !delta.color() {
        return Err(Error::Config(
            "the global offset must be odd in byte 0".into(),
        ));
    }
    DELTA
        .set(delta)
        .map_err(|_| Error::Config("the global offset is already installed".into()))
}

/// Read the installed offset. Garbler-side only.
pub(crate) fn delta() -> Result<Bit, Error> {
    DELTA
        .get()
        .copied()
        .ok_or_else(|| Error::Config("the global offset has not been installed".into()))
}
