// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Arbitrary-size (AS) Waksman switching networks.
//!
//! An AS-Waksman network routes any permutation of `n` packets through
//! `2⌈log₂n⌉ − 1` columns of 2×2 switches, each operating in "straight" or
//! "cross" mode. For `n ≥ 2` the network is built recursively: `⌊n/2⌋`
//! switches on the left, `⌊n/2⌋` on the right, and two sub-networks of
//! `⌊n/2⌋` (upper) and `⌈n/2⌉` (lower) packets in between. See Beauquier and
//! Darrot, "On arbitrary size Waksman networks and their vulnerability",
//! Parallel Processing Letters 2002.
//!
//! A switch occupies two adjacent rows; the coordinate of its top ports is
//! its *canonical position*, and that is where its control bit lives. A grid
//! position carrying a plain wire instead of a switch port is encoded by
//! giving it equal straight and cross destinations.
//!
//! [`permute`] drives a packet vector through the network column by column,
//! delegating each switch to a [`CondSwap`] capability, so the same driver
//! serves plaintext routing checks and oblivious label-space execution.

use std::mem;

use log::debug;

use crate::errors::Error;
use crate::permutation::IntegerPermutation;

mod routing;

pub use self::routing::{route, valid_routing};

/// Destination rows in the next column for the packet at one grid position,
/// under each of the two switch modes. Equal destinations mark a
/// pass-through wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct PortDests {
    /// Destination when the switch is set straight.
    pub straight: usize,
    /// Destination when the switch is set to cross.
    pub cross: usize,
}

impl PortDests {
    /// Whether this position is a plain wire rather than a switch port.
    pub fn is_pass_through(&self) -> bool {
        self.straight == self.cross
    }
}

/// The full wiring of an AS-Waksman network: one `PortDests` per column and
/// row. Purely a function of the packet count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Topology {
    num_packets: usize,
    columns: Vec<Vec<PortDests>>,
}

impl Topology {
    /// Number of packets the network carries.
    pub fn num_packets(&self) -> usize {
        self.num_packets
    }

    /// Number of switch columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// The wiring of column `c`.
    pub fn column(&self, c: usize) -> &[PortDests] {
        &self.columns[c]
    }
}

/// Switch settings: `Some(false)` = straight, `Some(true)` = cross at each
/// canonical position, `None` elsewhere. Consumers treat a missing canonical
/// entry as straight, but [`route`] populates every canonical position it
/// owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Routing {
    columns: Vec<Vec<Option<bool>>>,
}

impl Routing {
    pub(crate) fn with_dimensions(num_columns: usize, num_packets: usize) -> Self {
        Routing {
            columns: vec![vec![None; num_packets]; num_columns],
        }
    }

    /// Number of switch columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// The setting at `(column, row)`, if that canonical position has one.
    pub fn get(&self, column: usize, row: usize) -> Option<bool> {
        self.columns[column][row]
    }

    pub(crate) fn set(&mut self, column: usize, row: usize, cross: bool) {
        let slot = &mut self.columns[column][row];
        debug_assert!(slot.map_or(true, |prev| prev == cross));
        *slot = Some(cross);
    }
}

/// A capability that exchanges two values iff its control is set.
///
/// The driver stays agnostic of what the control means: a plaintext
/// simulation swaps eagerly, while a garbled implementation turns the control
/// into a wire label and swaps in label space, with a trace that does not
/// depend on the control's value.
pub trait CondSwap<T> {
    /// Swap `a` and `b` iff `cross`.
    fn cond_swap(&mut self, cross: bool, a: &mut T, b: &mut T) -> Result<(), Error>;
}

/// Swap capability operating directly on plaintext values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSwap;

impl<T> CondSwap<T> for PlainSwap {
    fn cond_swap(&mut self, cross: bool, a: &mut T, b: &mut T) -> Result<(), Error> {
        if cross {
            mem::swap(a, b);
        }
        Ok(())
    }
}

/// Number of switch columns in an AS-Waksman network for `num_packets`.
pub fn num_columns(num_packets: usize) -> usize {
    if num_packets > 1 {
        2 * ceil_log2(num_packets) - 1
    } else {
        0
    }
}

fn ceil_log2(n: usize) -> usize {
    debug_assert!(n > 1);
    (usize::BITS - (n - 1).leading_zeros()) as usize
}

/// Rows `[lo, lo + size/2)` hold the upper sub-network.
pub(crate) fn top_height(size: usize) -> usize {
    size / 2
}

/// The row in the adjacent middle column wired to the switch at `canonical`:
/// its top port reaches the upper sub-network, its bottom port the lower one.
/// The same arithmetic serves both the left column (outputs) and the right
/// column (inputs).
pub(crate) fn switch_port(lo: usize, size: usize, canonical: usize, use_top: bool) -> usize {
    debug_assert_eq!((canonical - lo) % 2, 0);
    lo + (canonical - lo) / 2 + if use_top { 0 } else { top_height(size) }
}

/// The wiring of an AS-Waksman network for `num_packets`.
pub fn generate_topology(num_packets: usize) -> Topology {
    let width = num_columns(num_packets);
    let unset = PortDests {
        straight: usize::MAX,
        cross: usize::MAX,
    };
    let mut columns = vec![vec![unset; num_packets]; width];
    if num_packets > 1 {
        let rhs_dests: Vec<usize> = (0..num_packets).collect();
        construct_inner(0, width - 1, 0, num_packets - 1, &rhs_dests, &mut columns);
    }
    Topology {
        num_packets,
        columns,
    }
}

/// Wire the sub-network spanning columns `[left, right]` and rows
/// `[lo, hi]`, whose outputs must land on `rhs_dests` in the column after
/// `right`.
fn construct_inner(
    left: usize,
    right: usize,
    lo: usize,
    hi: usize,
    rhs_dests: &[usize],
    columns: &mut [Vec<PortDests>],
) {
    if left > right {
        return;
    }
    let size = hi - lo + 1;
    debug_assert_eq!(rhs_dests.len(), size);
    let width = num_columns(size);
    debug_assert!(right - left + 1 >= width);

    if right - left + 1 > width {
        // More columns than this sub-network needs: straight wires on both
        // flanks, then recurse on the narrower span. Also covers size 1.
        for row in lo..=hi {
            columns[left][row] = PortDests {
                straight: row,
                cross: row,
            };
            columns[right][row] = PortDests {
                straight: rhs_dests[row - lo],
                cross: rhs_dests[row - lo],
            };
        }
        let inner: Vec<usize> = (lo..=hi).collect();
        construct_inner(left + 1, right - 1, lo, hi, &inner, columns);
    } else if size == 2 {
        columns[left][lo] = PortDests {
            straight: rhs_dests[0],
            cross: rhs_dests[1],
        };
        columns[left][hi] = PortDests {
            straight: rhs_dests[1],
            cross: rhs_dests[0],
        };
    } else {
        let d = top_height(size);
        let mut inner = vec![usize::MAX; size];
        for k in 0..d {
            let row = lo + 2 * k;
            let top = switch_port(lo, size, row, true);
            let bottom = switch_port(lo, size, row, false);
            columns[left][row] = PortDests {
                straight: top,
                cross: bottom,
            };
            columns[left][row + 1] = PortDests {
                straight: bottom,
                cross: top,
            };
            inner[top - lo] = row;
            inner[bottom - lo] = row + 1;
            columns[right][row] = PortDests {
                straight: rhs_dests[row - lo],
                cross: rhs_dests[row + 1 - lo],
            };
            columns[right][row + 1] = PortDests {
                straight: rhs_dests[row + 1 - lo],
                cross: rhs_dests[row - lo],
            };
        }
        if size % 2 == 1 {
            // The odd packet bypasses both switch columns on plain wires and
            // rides the last row of the lower sub-network.
            columns[left][hi] = PortDests {
                straight: hi,
                cross: hi,
            };
            columns[right][hi] = PortDests {
                straight: rhs_dests[hi - lo],
                cross: rhs_dests[hi - lo],
            };
            inner[hi - lo] = hi;
        }
        construct_inner(left + 1, right - 1, lo, lo + d - 1, &inner[..d], columns);
        construct_inner(left + 1, right - 1, lo + d, hi, &inner[d..], columns);
    }
}

/// Drive `input` through an AS-Waksman network.
///
/// With a non-empty `permutation_indices`, the network is routed so that
/// `input[i]` ends up at position `permutation_indices[i]`; the indices must
/// form a bijection and match the input length. With an empty list the
/// network is still executed switch for switch, every control passed to
/// `swap` as `false`; whatever permutation is then realised is defined
/// entirely by the swap capability's own control semantics, which is how the
/// garbled execution hides its routing.
///
/// The number of `cond_swap` invocations and their order depend only on the
/// input length, never on the permutation.
pub fn permute<T, S>(
    input: Vec<T>,
    permutation_indices: &[usize],
    swap: &mut S,
) -> Result<Vec<T>, Error>
where
    T: Default,
    S: CondSwap<T>,
{
    let num_packets = input.len();
    if !permutation_indices.is_empty() && permutation_indices.len() != num_packets {
        return Err(Error::Config(format!(
            "permutation of length {} does not match input of length {}",
            permutation_indices.len(),
            num_packets
        )));
    }

    let topology = generate_topology(num_packets);
    let routing = if permutation_indices.is_empty() {
        None
    } else {
        let permutation = IntegerPermutation::from_mapping(permutation_indices)?;
        let routing = route(&permutation);
        if !valid_routing(&permutation, &routing) {
            // A routing that fails its own self-check is a solver bug, not a
            // recoverable condition.
            panic!("AS-Waksman routing does not realise its permutation");
        }
        Some(routing)
    };
    debug!(
        "permuting {} packets across {} columns",
        num_packets,
        topology.num_columns()
    );

    let mut current = input;
    let mut next: Vec<T> = (0..num_packets).map(|_| T::default()).collect();
    for column in 0..topology.num_columns() {
        let mut row = 0;
        while row < num_packets {
            let dests = topology.column(column)[row];
            if row == num_packets - 1 || dests.is_pass_through() {
                debug_assert!(dests.is_pass_through());
                next[dests.straight] = mem::take(&mut current[row]);
                row += 1;
                continue;
            }
            let cross = routing
                .as_ref()
                .and_then(|r| r.get(column, row))
                .unwrap_or(false);
            let mut top = mem::take(&mut current[row]);
            let mut bottom = mem::take(&mut current[row + 1]);
            swap.cond_swap(cross, &mut top, &mut bottom)?;
            next[dests.straight] = top;
            next[dests.cross] = bottom;
            row += 2;
        }
        mem::swap(&mut current, &mut next);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_counts_match_reference() {
        assert_eq!(num_columns(0), 0);
        assert_eq!(num_columns(1), 0);
        let reference = [1, 3, 3, 5, 5, 5, 5];
        for (n, &want) in (2..=8).zip(reference.iter()) {
            assert_eq!(num_columns(n), want, "n = {}", n);
        }
        assert_eq!(num_columns(9), 7);
        assert_eq!(num_columns(64), 11);
        assert_eq!(num_columns(65), 13);
    }

    #[test]
    fn topology_dimensions() {
        for n in 1..=33 {
            let topology = generate_topology(n);
            assert_eq!(topology.num_packets(), n);
            assert_eq!(topology.num_columns(), num_columns(n));
            for c in 0..topology.num_columns() {
                assert_eq!(topology.column(c).len(), n);
            }
        }
    }

    // Every next-column slot must receive exactly one packet per column.
    #[test]
    fn topology_columns_cover_every_slot() {
        for n in 1..=40 {
            let topology = generate_topology(n);
            for c in 0..topology.num_columns() {
                let mut hits = vec![0usize; n];
                let mut row = 0;
                while row < n {
                    let dests = topology.column(c)[row];
                    if row == n - 1 || dests.is_pass_through() {
                        assert!(dests.is_pass_through());
                        hits[dests.straight] += 1;
                        row += 1;
                    } else {
                        hits[dests.straight] += 1;
                        hits[dests.cross] += 1;
                        row += 2;
                    }
                }
                assert!(hits.iter().all(|&h| h == 1), "n = {}, column = {}", n, c);
            }
        }
    }

    #[test]
    fn two_packet_network_is_one_switch() {
        let topology = generate_topology(2);
        assert_eq!(topology.num_columns(), 1);
        assert_eq!(
            topology.column(0)[0],
            PortDests {
                straight: 0,
                cross: 1
            }
        );
        assert_eq!(
            topology.column(0)[1],
            PortDests {
                straight: 1,
                cross: 0
            }
        );
    }

    #[test]
    fn permute_rejects_length_mismatch() {
        let result = permute(vec![1u32, 2, 3], &[0, 1], &mut PlainSwap);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn permute_rejects_non_bijections() {
        let result = permute(vec![1u32, 2, 3], &[0, 0, 1], &mut PlainSwap);
        assert!(matches!(result, Err(Error::Permutation(_))));
    }

    #[test]
    fn permute_with_empty_indices_is_identity_under_plain_swaps() {
        for n in 0..=9 {
            let input: Vec<usize> = (0..n).collect();
            let output = permute(input.clone(), &[], &mut PlainSwap).unwrap();
            assert_eq!(output, input);
        }
    }
}
