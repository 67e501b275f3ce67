// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The gate-level surface shared by the two parties.
//!
//! Protocol fragments are written once against [`Gates`] and executed by both
//! sides: the garbler's implementation works on zero-labels and streams
//! ciphertexts out, the evaluator's works on active labels and consumes the
//! same stream. As long as a fragment makes the same calls in the same order
//! on both sides, the label invariant `active = zero ⊕ value·Δ` is preserved
//! on every wire.
//!
//! Public constants never influence message traffic: `xor_const` costs
//! nothing on the wire, so the garbler may fold secrets it knows in plaintext
//! (such as shuffled slot indices) into constants without the evaluator being
//! able to tell.

use crate::errors::Error;
use crate::label::{Bit, Word};
use crate::waksman::CondSwap;

/// Boolean gates over wire labels, implemented by both parties.
pub trait Gates {
    /// Introduce a fresh input wire chosen by the garbler, carrying `value`.
    /// The evaluator's implementation ignores `value` and takes the active
    /// label off the channel.
    fn feed(&mut self, value: bool) -> Result<Bit, Error>;

    /// XOR two wires. Free: no messages, label XOR on both sides.
    fn xor(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error>;

    /// XOR a wire with a public constant. Free, and invisible on the wire.
    fn xor_const(&mut self, a: &Bit, value: bool) -> Result<Bit, Error>;

    /// AND two wires. Costs two ciphertexts.
    fn and(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error>;

    /// Negate a wire.
    fn not(&mut self, a: &Bit) -> Result<Bit, Error> {
        self.xor_const(a, true)
    }

    /// Component-wise XOR of two words of equal width.
    fn xor_words(&mut self, a: &Word, b: &Word) -> Result<Word, Error> {
        if a.width() != b.width() {
            return Err(Error::Config(format!(
                "cannot XOR words of widths {} and {}",
                a.width(),
                b.width()
            )));
        }
        let bits = a
            .bits()
            .iter()
            .zip(b.bits())
            .map(|(x, y)| self.xor(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Word::from_bits(bits))
    }

    /// AND every bit of `word` with `control`.
    fn and_word(&mut self, control: &Bit, word: &Word) -> Result<Word, Error> {
        let bits = word
            .bits()
            .iter()
            .map(|bit| self.and(control, bit))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Word::from_bits(bits))
    }

    /// Compare `word` against the public constant `value`.
    fn eq_const(&mut self, word: &Word, value: u64) -> Result<Bit, Error> {
        let mut acc: Option<Bit> = None;
        for (i, bit) in word.bits().iter().enumerate() {
            let want = i < 64 && (value >> i) & 1 == 1;
            let term = self.xor_const(bit, !want)?;
            acc = Some(match acc {
                Some(prev) => self.and(&prev, &term)?,
                None => term,
            });
        }
        acc.ok_or_else(|| Error::Config("cannot compare an empty word".into()))
    }

    /// Exchange two words of equal width iff `control` carries 1, by XOR-ing
    /// `control · (a ⊕ b)` into both.
    fn cond_swap_words(&mut self, control: &Bit, a: &mut Word, b: &mut Word) -> Result<(), Error> {
        if a.width() != b.width() {
            return Err(Error::Config(format!(
                "cannot swap words of widths {} and {}",
                a.width(),
                b.width()
            )));
        }
        for i in 0..a.width() {
            let diff = self.xor(a.bit(i), b.bit(i))?;
            let toggle = self.and(control, &diff)?;
            let new_a = self.xor(a.bit(i), &toggle)?;
            let new_b = self.xor(b.bit(i), &toggle)?;
            a.set_bit(i, new_a);
            b.set_bit(i, new_b);
        }
        Ok(())
    }
}

/// Adapts a gate engine to the permutation driver's swap capability: each
/// switch turns its control into a garbler-chosen input wire and swaps in
/// label space. The trace depends only on the word width.
pub struct GarbledSwap<'g, G> {
    gates: &'g mut G,
}

impl<'g, G> GarbledSwap<'g, G> {
    /// Borrow `gates` for the duration of one network execution.
    pub fn new(gates: &'g mut G) -> Self {
        GarbledSwap { gates }
    }
}

impl<'g, G: Gates> CondSwap<Word> for GarbledSwap<'g, G> {
    fn cond_swap(&mut self, cross: bool, a: &mut Word, b: &mut Word) -> Result<(), Error> {
        let control = self.gates.feed(cross)?;
        self.gates.cond_swap_words(&control, a, b)
    }
}
