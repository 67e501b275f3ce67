// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Streaming garbled-circuit execution over a channel.
//!
//! XOR gates are free (label XOR under the global offset Δ); AND gates use
//! the half-gates construction of Zahur, Rosulek and Evans ("Two Halves Make
//! a Whole", EUROCRYPT 2015): two ciphertexts per gate, selected by the
//! point-and-permute colour bits. The hash is the tweaked label hash of
//! [`Bit::hash`], one tweak per half-gate.
//!
//! The [`Garbler`] produces zero-labels and writes ciphertexts as a side
//! effect; the [`Evaluator`] holds active labels and reads the same stream.
//! Neither buffers whole circuits: gates stream through the channel in
//! execution order.

use rand::{CryptoRng, RngCore};

use crate::channel::Channel;
use crate::errors::Error;
use crate::gates::Gates;
use crate::label::{delta, Bit};

mod evaluator;

pub use self::evaluator::Evaluator;

/// Streams garbled gates to the evaluator through a channel.
pub struct Garbler<C, RNG> {
    channel: C,
    delta: Bit,
    rng: RNG,
    gate_index: u64,
}

impl<C: Channel, RNG: CryptoRng + RngCore> Garbler<C, RNG> {
    /// Create a garbler over `channel`. Fails unless the global offset has
    /// been installed.
    pub fn new(channel: C, rng: RNG) -> Result<Self, Error> {
        Ok(Garbler {
            channel,
            delta: delta()?,
            rng,
            gate_index: 0,
        })
    }

    /// The underlying channel, for protocol frames outside the gate stream.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// The garbler's randomness source.
    pub fn rng_mut(&mut self) -> &mut RNG {
        &mut self.rng
    }

    /// Push buffered gate traffic to the evaluator.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.channel.flush()
    }

    /// Tweaks for the two halves of the next non-free gate.
    fn next_tweaks(&mut self) -> (u64, u64) {
        let index = self.gate_index;
        self.gate_index += 1;
        (2 * index, 2 * index + 1)
    }
}

impl<C: Channel, RNG: CryptoRng + RngCore> Gates for Garbler<C, RNG> {
    fn feed(&mut self, value: bool) -> Result<Bit, Error> {
        let zero = Bit::rand(&mut self.rng);
        self.channel.send_bit(&zero.encode(value, &self.delta))?;
        Ok(zero)
    }

    fn xor(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error> {
        Ok(a ^ b)
    }

    fn xor_const(&mut self, a: &Bit, value: bool) -> Result<Bit, Error> {
        // The zero-label of `x ⊕ 1` is the one-label of `x`.
        Ok(a.encode(value, &self.delta))
    }

    fn and(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error> {
        let (tweak_g, tweak_e) = self.next_tweaks();
        let color_a = a.color();
        let color_b = b.color();
        let a_one = a ^ &self.delta;
        let b_one = b ^ &self.delta;

        // Generator half: a ∧ color_b.
        let hash_a0 = a.hash(tweak_g);
        let hash_a1 = a_one.hash(tweak_g);
        let mut ct_g = hash_a0 ^ hash_a1;
        if color_b {
            ct_g ^= &self.delta;
        }
        let w_g = if color_a { hash_a0 ^ ct_g } else { hash_a0 };

        // Evaluator half: a ∧ (b ⊕ color_b).
        let hash_b0 = b.hash(tweak_e);
        let hash_b1 = b_one.hash(tweak_e);
        let ct_e = hash_b0 ^ hash_b1 ^ a;
        let w_e = if color_b { hash_b1 } else { hash_b0 };

        self.channel.send_bit(&ct_g)?;
        self.channel.send_bit(&ct_e)?;
        Ok(w_g ^ w_e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemChannel;
    use crate::gates::GarbledSwap;
    use crate::label::Word;
    use crate::test_utils::test_delta;
    use crate::waksman::{permute, CondSwap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engines(seed: u64) -> (Garbler<MemChannel, StdRng>, Evaluator<MemChannel>) {
        test_delta();
        let channel = MemChannel::new();
        let garbler = Garbler::new(channel.clone(), StdRng::seed_from_u64(seed)).unwrap();
        let evaluator = Evaluator::new(channel);
        (garbler, evaluator)
    }

    #[test]
    fn and_gate_truth_table() {
        let delta = test_delta();
        for &(va, vb) in &[(false, false), (false, true), (true, false), (true, true)] {
            let (mut gb, mut ev) = engines(7);
            let a0 = gb.feed(va).unwrap();
            let b0 = gb.feed(vb).unwrap();
            let c0 = gb.and(&a0, &b0).unwrap();

            let a = ev.feed(false).unwrap();
            let b = ev.feed(false).unwrap();
            let c = ev.and(&a, &b).unwrap();

            assert_eq!(a, a0.encode(va, &delta));
            assert_eq!(b, b0.encode(vb, &delta));
            assert_eq!(c, c0.encode(va && vb, &delta), "{} ∧ {}", va, vb);
        }
    }

    #[test]
    fn xor_and_not_are_free() {
        let delta = test_delta();
        for &(va, vb) in &[(false, true), (true, true)] {
            let (mut gb, mut ev) = engines(8);
            let a0 = gb.feed(va).unwrap();
            let b0 = gb.feed(vb).unwrap();
            let x0 = gb.xor(&a0, &b0).unwrap();
            let n0 = gb.not(&x0).unwrap();

            let a = ev.feed(false).unwrap();
            let b = ev.feed(false).unwrap();
            let x = ev.xor(&a, &b).unwrap();
            let n = ev.not(&x).unwrap();

            assert_eq!(x, x0.encode(va ^ vb, &delta));
            assert_eq!(n, n0.encode(!(va ^ vb), &delta));
        }
    }

    #[test]
    fn eq_const_recognises_its_constant() {
        let delta = test_delta();
        for value in 0..8u64 {
            for constant in 0..8u64 {
                let (mut gb, mut ev) = engines(value * 8 + constant);
                let mut gb_bits = Vec::new();
                let mut ev_bits = Vec::new();
                for i in 0..3 {
                    gb_bits.push(gb.feed((value >> i) & 1 == 1).unwrap());
                    ev_bits.push(ev.feed(false).unwrap());
                }
                let word0 = Word::from_bits(gb_bits);
                let word = Word::from_bits(ev_bits);
                let eq0 = gb.eq_const(&word0, constant).unwrap();
                let eq = ev.eq_const(&word, constant).unwrap();
                assert_eq!(eq, eq0.encode(value == constant, &delta));
            }
        }
    }

    #[test]
    fn garbled_cond_swap_swaps_values_not_labels() {
        let delta = test_delta();
        for &cross in &[false, true] {
            let (mut gb, mut ev) = engines(31);
            let mut a0 = Word::rand(gb.rng_mut(), 4);
            let mut b0 = Word::rand(gb.rng_mut(), 4);
            let (va, vb) = (0b1010u64, 0b0111u64);
            let mut a = a0.encode(va, &delta);
            let mut b = b0.encode(vb, &delta);

            {
                let mut swap = GarbledSwap::new(&mut gb);
                swap.cond_swap(cross, &mut a0, &mut b0).unwrap();
            }
            {
                let mut swap = GarbledSwap::new(&mut ev);
                swap.cond_swap(false, &mut a, &mut b).unwrap();
            }

            let (want_a, want_b) = if cross { (vb, va) } else { (va, vb) };
            assert_eq!(a, a0.encode(want_a, &delta));
            assert_eq!(b, b0.encode(want_b, &delta));
        }
    }

    // Both parties push a word vector through the same network; the garbler
    // routes, the evaluator runs blind, and the active labels land permuted.
    #[test]
    fn garbled_network_permutes_under_the_garbler_routing() {
        let delta = test_delta();
        let (mut gb, mut ev) = engines(64);
        let width = 5;
        let indices = vec![3, 6, 0, 7, 2, 5, 1, 4];
        let n = indices.len();

        let zero_words: Vec<Word> = (0..n).map(|_| Word::rand(gb.rng_mut(), width)).collect();
        let values: Vec<u64> = (0..n as u64).map(|v| v * 3 % 17).collect();
        let active_words: Vec<Word> = zero_words
            .iter()
            .zip(values.iter())
            .map(|(w, &v)| w.encode(v, &delta))
            .collect();

        let gb_out = {
            let mut swap = GarbledSwap::new(&mut gb);
            permute(zero_words, &indices, &mut swap).unwrap()
        };
        let ev_out = {
            let mut swap = GarbledSwap::new(&mut ev);
            permute(active_words, &[], &mut swap).unwrap()
        };

        for (i, &target) in indices.iter().enumerate() {
            assert_eq!(ev_out[target], gb_out[target].encode(values[i], &delta));
        }
    }
}
