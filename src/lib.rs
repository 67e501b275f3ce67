// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! `picogram` is a two-party oblivious RAM evaluated inside a garbled
//! circuit. A garbler and an evaluator jointly simulate a word-addressed
//! memory; neither party learns the addresses, the data, or whether an
//! access reads or writes — the evaluator only ever sees wire labels, which
//! decode under the garbler's secret free-XOR offset.
//!
//! The crate is built around an AS-Waksman switching network: a topology
//! generator, a deterministic routing solver, a validator, and a permutation
//! driver parametrised over a conditional-swap capability, so the same
//! network runs in plaintext for self-checks and obliviously on wire labels
//! during the protocol. Around it sit the label algebra ([`Bit`], [`Word`],
//! [`set_delta`]), a streaming half-gates garbler and evaluator, byte
//! channels (in-memory, TCP, dual-socket TCP), and the [`Oram`] harness
//! driving the per-access protocol.

pub mod channel;
pub mod errors;
pub mod garble;
pub mod gates;
pub mod label;
pub mod oram;
pub mod permutation;
pub mod waksman;

pub use crate::channel::{
    Channel, ChannelKind, HighSpeedTcpChannel, MemChannel, TcpChannel, TrackChannel,
};
pub use crate::errors::Error;
pub use crate::gates::{GarbledSwap, Gates};
pub use crate::label::{set_delta, Bit, Word, LAMBDA_BYTES};
pub use crate::oram::Oram;
pub use crate::permutation::IntegerPermutation;
pub use crate::waksman::{
    generate_topology, num_columns, permute, route, valid_routing, CondSwap, PlainSwap, PortDests,
    Routing, Topology,
};
