// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};

use super::{check_params, scan};
use crate::channel::{Channel, ChannelKind};
use crate::errors::Error;
use crate::garble::Garbler as Gb;
use crate::gates::GarbledSwap;
use crate::label::{delta, Bit, Word};
use crate::waksman::permute;

/// The garbling party of the two-party ORAM.
///
/// Owns the zero-labels of every memory slot and the secret slot shuffle;
/// everything the evaluator sees is active labels and half-gate ciphertexts.
pub struct Garbler<C, RNG> {
    addr_width: usize,
    word_width: usize,
    num_accesses: u64,
    accesses_done: u64,
    rng: Option<RNG>,
    engine: Option<Gb<C, RNG>>,
    memory: Vec<Word>,
    slot_ids: Vec<u64>,
}

impl<C: Channel, RNG: CryptoRng + RngCore> Garbler<C, RNG> {
    /// Create the garbling side. The global offset must already be
    /// installed.
    pub fn new(
        addr_width: usize,
        word_width: usize,
        num_accesses: u64,
        rng: RNG,
    ) -> Result<Self, Error> {
        check_params(addr_width, word_width)?;
        delta()?;
        Ok(Garbler {
            addr_width,
            word_width,
            num_accesses,
            accesses_done: 0,
            rng: Some(rng),
            engine: None,
            memory: Vec::new(),
            slot_ids: Vec::new(),
        })
    }

    /// Send the parameter frame and the initial memory labels, then shuffle
    /// the slots through the switching network under a fresh secret
    /// permutation.
    pub fn initialize(&mut self, channel: C) -> Result<(), Error> {
        if self.engine.is_some() {
            return Err(Error::Config("the garbler is already initialized".into()));
        }
        let rng = self
            .rng
            .take()
            .ok_or_else(|| Error::Config("the garbler is already initialized".into()))?;
        let mut engine = Gb::new(channel, rng)?;

        let channel = engine.channel_mut();
        channel.send_u64(self.addr_width as u64)?;
        channel.send_u64(self.word_width as u64)?;
        channel.send_u64(self.num_accesses)?;

        // The initial memory is all zeroes, so the active labels the
        // evaluator needs are exactly the zero-labels.
        let num_slots = 1usize << self.addr_width;
        let mut memory = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            let word = Word::rand(engine.rng_mut(), self.word_width);
            engine.channel_mut().send_word(&word)?;
            memory.push(word);
        }

        let mut shuffle: Vec<usize> = (0..num_slots).collect();
        shuffle.shuffle(engine.rng_mut());
        debug!(
            "garbler: shuffling {} slots through the switching network",
            num_slots
        );
        let memory = {
            let mut swap = GarbledSwap::new(&mut engine);
            permute(memory, &shuffle, &mut swap)?
        };
        let mut slot_ids = vec![0u64; num_slots];
        for (logical, &physical) in shuffle.iter().enumerate() {
            slot_ids[physical] = logical as u64;
        }

        engine.flush()?;
        self.engine = Some(engine);
        self.memory = memory;
        self.slot_ids = slot_ids;
        Ok(())
    }

    /// Garble one access. `addr`, `is_write` and `new_data` are the
    /// zero-labels of this access's inputs; the returned word is the
    /// zero-labels of the pre-access value.
    pub fn access(&mut self, addr: Word, is_write: Bit, new_data: Word) -> Result<Word, Error> {
        if addr.width() != self.addr_width || new_data.width() != self.word_width {
            return Err(Error::Config(format!(
                "access widths ({}, {}) do not match the configured ({}, {})",
                addr.width(),
                new_data.width(),
                self.addr_width,
                self.word_width
            )));
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| Error::Config("access before initialize".into()))?;
        if self.accesses_done == self.num_accesses {
            return Err(Error::Protocol(format!(
                "all {} accesses already performed",
                self.num_accesses
            )));
        }
        trace!("garbler: access {}", self.accesses_done);
        let old = scan(
            engine,
            &mut self.memory,
            &self.slot_ids,
            &addr,
            &is_write,
            &new_data,
        )?;
        // Socket carriers buffer; bound the evaluator's latency to one
        // access. The in-memory carrier has nothing to push.
        if engine.channel_mut().kind() != ChannelKind::Mem {
            engine.flush()?;
        }
        self.accesses_done += 1;
        Ok(old)
    }
}
