// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::channel::Channel;
use crate::errors::Error;
use crate::gates::Gates;
use crate::label::Bit;

/// Streaming evaluator: walks the same gate sequence as the garbler,
/// consuming ciphertexts from the channel as needed.
///
/// The evaluator holds only active labels and never touches the global
/// offset; which plaintext value any wire carries is invisible to it.
pub struct Evaluator<C> {
    channel: C,
    gate_index: u64,
}

impl<C: Channel> Evaluator<C> {
    /// Create an evaluator over `channel`.
    pub fn new(channel: C) -> Self {
        Evaluator {
            channel,
            gate_index: 0,
        }
    }

    /// The underlying channel, for protocol frames outside the gate stream.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Tweaks for the two halves of the next non-free gate; must mirror the
    /// garbler's numbering exactly.
    fn next_tweaks(&mut self) -> (u64, u64) {
        let index = self.gate_index;
        self.gate_index += 1;
        (2 * index, 2 * index + 1)
    }
}

impl<C: Channel> Gates for Evaluator<C> {
    fn feed(&mut self, _value: bool) -> Result<Bit, Error> {
        self.channel.recv_bit()
    }

    fn xor(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error> {
        Ok(a ^ b)
    }

    fn xor_const(&mut self, a: &Bit, _value: bool) -> Result<Bit, Error> {
        // Constant XOR shifts the garbler's zero-label; the active label is
        // untouched.
        Ok(*a)
    }

    fn and(&mut self, a: &Bit, b: &Bit) -> Result<Bit, Error> {
        let (tweak_g, tweak_e) = self.next_tweaks();
        let ct_g = self.channel.recv_bit()?;
        let ct_e = self.channel.recv_bit()?;

        let mut w_g = a.hash(tweak_g);
        if a.color() {
            w_g ^= &ct_g;
        }
        let mut w_e = b.hash(tweak_e);
        if b.color() {
            w_e ^= &(ct_e ^ a);
        }
        Ok(w_g ^ w_e)
    }
}
