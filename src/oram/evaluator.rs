// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use log::{debug, trace};

use super::{check_params, scan};
use crate::channel::Channel;
use crate::errors::Error;
use crate::garble::Evaluator as Ev;
use crate::gates::GarbledSwap;
use crate::label::{Bit, Word};
use crate::waksman::permute;

/// The evaluating party of the two-party ORAM.
///
/// Holds only active labels; the slot shuffle and every control bit stay with
/// the garbler.
pub struct Evaluator<C> {
    addr_width: usize,
    word_width: usize,
    num_accesses: u64,
    accesses_done: u64,
    engine: Option<Ev<C>>,
    memory: Vec<Word>,
    slot_ids: Vec<u64>,
}

impl<C: Channel> Evaluator<C> {
    /// Create the evaluating side.
    pub fn new(addr_width: usize, word_width: usize, num_accesses: u64) -> Result<Self, Error> {
        check_params(addr_width, word_width)?;
        Ok(Evaluator {
            addr_width,
            word_width,
            num_accesses,
            accesses_done: 0,
            engine: None,
            memory: Vec::new(),
            slot_ids: Vec::new(),
        })
    }

    /// Check the garbler's parameter frame, take delivery of the initial
    /// memory labels, and follow the setup shuffle blind.
    pub fn initialize(&mut self, channel: C) -> Result<(), Error> {
        if self.engine.is_some() {
            return Err(Error::Config("the evaluator is already initialized".into()));
        }
        let mut engine = Ev::new(channel);

        let channel = engine.channel_mut();
        let peer_addr_width = channel.recv_u64()?;
        let peer_word_width = channel.recv_u64()?;
        let peer_num_accesses = channel.recv_u64()?;
        if (peer_addr_width, peer_word_width, peer_num_accesses)
            != (
                self.addr_width as u64,
                self.word_width as u64,
                self.num_accesses,
            )
        {
            return Err(Error::Protocol(format!(
                "parameter frame ({}, {}, {}) does not match ({}, {}, {})",
                peer_addr_width,
                peer_word_width,
                peer_num_accesses,
                self.addr_width,
                self.word_width,
                self.num_accesses
            )));
        }

        let num_slots = 1usize << self.addr_width;
        let mut memory = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            memory.push(engine.channel_mut().recv_word(self.word_width)?);
        }

        debug!(
            "evaluator: following the setup shuffle of {} slots",
            num_slots
        );
        let memory = {
            let mut swap = GarbledSwap::new(&mut engine);
            permute(memory, &[], &mut swap)?
        };

        self.engine = Some(engine);
        self.memory = memory;
        // Slot ids feed constant folding on the garbler's side only; any
        // values keep the evaluator's gate stream aligned.
        self.slot_ids = vec![0; num_slots];
        Ok(())
    }

    /// Evaluate one access. `addr`, `is_write` and `new_data` are the active
    /// labels of this access's inputs; the returned word is the active
    /// labels of the pre-access value.
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
        trace!("evaluator: access {}", self.accesses_done);
        let old = scan(
            engine,
            &mut self.memory,
            &self.slot_ids,
            &addr,
            &is_write,
            &new_data,
        )?;
        self.accesses_done += 1;
        Ok(old)
    }
}
