// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Errors that can occur while routing, garbling, or running the protocol.

use std::io;

/// The error type surfaced by every fallible operation in this crate.
///
/// Routing-validator disagreement is deliberately absent: a routing that
/// fails its self-check indicates a solver bug and aborts the process
/// instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration: bad widths, a malformed or reinstalled
    /// global offset, or misuse of a party's lifecycle.
    #[error("configuration error: {0}")]
    Config(String),
    /// The supplied index list is not a bijection.
    #[error("invalid permutation: {0}")]
    Permutation(String),
    /// The underlying channel failed or hit end-of-stream early.
    #[error("channel error: {0}")]
    Channel(#[from] io::Error),
    /// The two parties disagree about the message stream.
    #[error("protocol error: {0}")]
    Protocol(String),
}
