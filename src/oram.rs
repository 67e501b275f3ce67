// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The two-party oblivious RAM harness.
//!
//! Two symmetric roles jointly simulate a RAM of `2^addr_width` words of
//! `word_width` bits over a fixed number of accesses. Setup sends the
//! evaluator the labels of the all-zero initial memory and shuffles the slot
//! vector through the AS-Waksman network under a garbler-chosen secret
//! permutation; each access then runs one oblivious linear scan, so the
//! memory walk, the gate count, and the transcript length are independent of
//! the address, the data, and the read/write flag.

use rand::rngs::ThreadRng;

use crate::channel::Channel;
use crate::errors::Error;
use crate::gates::Gates;
use crate::label::{Bit, Word};

mod evaluator;
mod garbler;

pub use self::evaluator::Evaluator;
pub use self::garbler::Garbler;

/// Widest supported address space; memory is materialised per slot.
const MAX_ADDR_WIDTH: usize = 24;
/// Words encode via `u64`.
const MAX_WORD_WIDTH: usize = 64;

pub(crate) fn check_params(addr_width: usize, word_width: usize) -> Result<(), Error> {
    if addr_width == 0 || addr_width > MAX_ADDR_WIDTH {
        return Err(Error::Config(format!(
            "addr_width must lie in 1..={}, got {}",
            MAX_ADDR_WIDTH, addr_width
        )));
    }
    if word_width == 0 || word_width > MAX_WORD_WIDTH {
        return Err(Error::Config(format!(
            "word_width must lie in 1..={}, got {}",
            MAX_WORD_WIDTH, word_width
        )));
    }
    Ok(())
}

/// One oblivious linear pass over the memory: accumulate the labels of the
/// addressed word and fold in the write-back, gate for gate identical on both
/// sides. `slot_ids` carries the logical address of each physical slot; it
/// only shapes the garbler's constant folding, so the evaluator may pass
/// anything.
pub(crate) fn scan<G: Gates>(
    gates: &mut G,
    memory: &mut [Word],
    slot_ids: &[u64],
    addr: &Word,
    is_write: &Bit,
    new_data: &Word,
) -> Result<Word, Error> {
    let mut old: Option<Word> = None;
    for (slot, &id) in memory.iter_mut().zip(slot_ids.iter()) {
        let here = gates.eq_const(addr, id)?;
        let read = gates.and_word(&here, slot)?;
        old = Some(match old {
            Some(acc) => gates.xor_words(&acc, &read)?,
            None => read,
        });
        let store = gates.and(&here, is_write)?;
        let diff = gates.xor_words(slot, new_data)?;
        let update = gates.and_word(&store, &diff)?;
        *slot = gates.xor_words(slot, &update)?;
    }
    old.ok_or_else(|| Error::Config("memory has no slots".into()))
}

/// A single party's end of the protocol, chosen by the `is_garbler` flag.
pub enum Oram<C: Channel> {
    /// The garbling side; requires the global offset to be installed.
    Garbler(Garbler<C, ThreadRng>),
    /// The evaluating side; never holds the offset.
    Evaluator(Evaluator<C>),
}

impl<C: Channel> Oram<C> {
    /// Construct one party of a `2^addr_width × word_width` RAM good for
    /// `num_accesses` accesses.
    pub fn new(
        addr_width: usize,
        word_width: usize,
        num_accesses: u64,
        is_garbler: bool,
    ) -> Result<Self, Error> {
        if is_garbler {
            Ok(Oram::Garbler(Garbler::new(
                addr_width,
                word_width,
                num_accesses,
                rand::thread_rng(),
            )?))
        } else {
            Ok(Oram::Evaluator(Evaluator::new(
                addr_width,
                word_width,
                num_accesses,
            )?))
        }
    }

    /// Exchange setup material and build the initial memory.
    pub fn initialize(&mut self, channel: C) -> Result<(), Error> {
        match self {
            Oram::Garbler(garbler) => garbler.initialize(channel),
            Oram::Evaluator(evaluator) => evaluator.initialize(channel),
        }
    }

    /// Perform one read-or-write access; returns the labels of the word that
    /// resided at `addr` before any write took effect.
    pub fn access(&mut self, addr: Word, is_write: Bit, new_data: Word) -> Result<Word, Error> {
        match self {
            Oram::Garbler(garbler) => garbler.access(addr, is_write, new_data),
            Oram::Evaluator(evaluator) => evaluator.access(addr, is_write, new_data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemChannel;
    use crate::test_utils::test_delta;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Garble a short access trace into a memory channel, then evaluate it
    // and check every returned word against a plaintext reference memory.
    #[test]
    fn garble_then_evaluate_small_ram() {
        let delta = test_delta();
        let mut rng = StdRng::seed_from_u64(0xb0);
        let (addr_width, word_width, num_accesses) = (2usize, 3usize, 16u64);

        let mut reference = vec![0u64; 1 << addr_width];
        let mut addr_vals = Vec::new();
        let mut write_vals = Vec::new();
        let mut data_vals = Vec::new();
        let mut old_vals = Vec::new();
        for _ in 0..num_accesses {
            let addr = rng.gen_range(0..1u64 << addr_width);
            let is_write = rng.gen::<bool>();
            let data = rng.gen_range(0..1u64 << word_width);
            old_vals.push(reference[addr as usize]);
            if is_write {
                reference[addr as usize] = data;
            }
            addr_vals.push(addr);
            write_vals.push(is_write);
            data_vals.push(data);
        }

        let addr_labels: Vec<Word> = (0..num_accesses)
            .map(|_| Word::rand(&mut rng, addr_width))
            .collect();
        let write_labels: Vec<Bit> = (0..num_accesses).map(|_| Bit::rand(&mut rng)).collect();
        let data_labels: Vec<Word> = (0..num_accesses)
            .map(|_| Word::rand(&mut rng, word_width))
            .collect();

        let channel = MemChannel::new();
        let mut garbler = Oram::new(addr_width, word_width, num_accesses, true).unwrap();
        garbler.initialize(channel.clone()).unwrap();
        let old_zero_labels: Vec<Word> = (0..num_accesses as usize)
            .map(|i| {
                garbler
                    .access(
                        addr_labels[i].clone(),
                        write_labels[i],
                        data_labels[i].clone(),
                    )
                    .unwrap()
            })
            .collect();

        let mut evaluator = Oram::new(addr_width, word_width, num_accesses, false).unwrap();
        evaluator.initialize(channel).unwrap();
        for i in 0..num_accesses as usize {
            let old = evaluator
                .access(
                    addr_labels[i].encode(addr_vals[i], &delta),
                    write_labels[i].encode(write_vals[i], &delta),
                    data_labels[i].encode(data_vals[i], &delta),
                )
                .unwrap();
            assert_eq!(
                old,
                old_zero_labels[i].encode(old_vals[i], &delta),
                "access {}",
                i
            );
        }
    }

    #[test]
    fn parameter_frames_must_agree() {
        test_delta();
        let channel = MemChannel::new();
        let mut garbler = Oram::new(3, 4, 4, true).unwrap();
        garbler.initialize(channel.clone()).unwrap();
        let mut evaluator = Oram::new(3, 5, 4, false).unwrap();
        assert!(matches!(
            evaluator.initialize(channel),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn access_budget_is_enforced() {
        let delta = test_delta();
        let mut rng = StdRng::seed_from_u64(3);
        let channel = MemChannel::new();
        let mut garbler = Oram::new(2, 2, 1, true).unwrap();
        garbler.initialize(channel.clone()).unwrap();
        let addr = Word::rand(&mut rng, 2);
        let data = Word::rand(&mut rng, 2);
        let flag = Bit::rand(&mut rng);
        garbler
            .access(addr.clone(), flag, data.clone())
            .unwrap();
        assert!(matches!(
            garbler.access(addr, flag, data),
            Err(Error::Protocol(_))
        ));
        let _ = delta;
    }

    #[test]
    fn bad_widths_are_rejected() {
        test_delta();
        assert!(matches!(
            Oram::<MemChannel>::new(0, 4, 1, true),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Oram::<MemChannel>::new(3, 65, 1, false),
            Err(Error::Config(_))
        ));
        let mut rng = StdRng::seed_from_u64(9);
        let channel = MemChannel::new();
        let mut garbler = Oram::new(2, 4, 1, true).unwrap();
        garbler.initialize(channel).unwrap();
        let too_wide = Word::rand(&mut rng, 3);
        let data = Word::rand(&mut rng, 4);
        assert!(matches!(
            garbler.access(too_wide, Bit::rand(&mut rng), data),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn access_before_initialize_fails() {
        test_delta();
        let mut rng = StdRng::seed_from_u64(10);
        let mut garbler = Oram::<MemChannel>::new(2, 4, 1, true).unwrap();
        assert!(matches!(
            garbler.access(
                Word::rand(&mut rng, 2),
                Bit::rand(&mut rng),
                Word::rand(&mut rng, 4)
            ),
            Err(Error::Config(_))
        ));
    }
}
