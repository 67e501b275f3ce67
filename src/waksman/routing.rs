// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The AS-Waksman routing solver.
//!
//! Choosing the outer switch settings is a 2-colouring problem: pairing the
//! packets of each left switch and each right switch yields an implicit
//! bipartite constraint graph whose edges say "these packets must traverse
//! opposite halves of the network". Each connected component is coloured by
//! walking it depth-first and alternating the colour, then the induced upper
//! and lower sub-permutations are routed recursively. The graph is never
//! materialised; the walk is plain index arithmetic on switch positions.
//!
//! The solver is deterministic: a component with free choice starts at its
//! lowest-index packet and routes it straight; for even sizes the bottom
//! left switch is redundant and pinned straight; for odd sizes the fixed
//! bottom wire seeds its component's colours.

use log::debug;

use super::{generate_topology, num_columns, switch_port, top_height, Routing};
use crate::permutation::IntegerPermutation;

/// The canonical position of the switch covering `row`.
fn canonical(lo: usize, row: usize) -> usize {
    lo + ((row - lo) & !1)
}

/// The other port of the switch covering `row`.
fn sibling(lo: usize, row: usize) -> usize {
    let canon = canonical(lo, row);
    canon + 1 - (row - canon)
}

/// Switch mode that carries the packet at `row` through the chosen half of
/// the network (`use_top`), and, read in the other direction, the half
/// traversed by the packet at `row` under a given mode.
fn setting_for(lo: usize, row: usize, use_top: bool) -> bool {
    (row == canonical(lo, row)) ^ use_top
}

/// Half of the network traversed by the packet at `row` when its switch is
/// set to `cross`. Involution of [`setting_for`].
fn half_for(lo: usize, row: usize, cross: bool) -> bool {
    (row == canonical(lo, row)) ^ cross
}

/// Compute switch settings realising `permutation` on an AS-Waksman network
/// of matching size. The permutation must be valid; `route` is deterministic
/// and populates every canonical position of the columns it owns.
pub fn route(permutation: &IntegerPermutation) -> Routing {
    debug_assert!(permutation.is_valid());
    let n = permutation.size();
    let width = num_columns(n);
    debug!("routing a {}-packet permutation over {} columns", n, width);
    let mut routing = Routing::with_dimensions(width, n);
    if n > 1 {
        let inverse = permutation.inverse();
        route_inner(0, width - 1, 0, n - 1, permutation, &inverse, &mut routing);
    }
    routing
}

/// Route the sub-permutation living on rows `[lo, hi]` across columns
/// `[left, right]`.
fn route_inner(
    left: usize,
    right: usize,
    lo: usize,
    hi: usize,
    permutation: &IntegerPermutation,
    inverse: &IntegerPermutation,
    routing: &mut Routing,
) {
    if left > right {
        return;
    }
    let size = hi - lo + 1;
    let width = num_columns(size);

    if right - left + 1 > width {
        // The topology padded this span with straight wires; skip inward.
        route_inner(left + 1, right - 1, lo, hi, permutation, inverse, routing);
        return;
    }
    if size == 2 {
        routing.set(left, lo, permutation.get(lo) != lo);
        return;
    }

    let d = top_height(size);
    let mut middle = IntegerPermutation::identity_range(lo, hi);
    let mut middle_inv = IntegerPermutation::identity_range(lo, hi);
    let mut routed = vec![false; size];

    // Seed the walk with the pinned constraint: the odd bottom wire, or the
    // redundant even bottom-left switch.
    let (mut to_route, mut route_left) = if size % 2 == 1 {
        if permutation.get(hi) == hi {
            // The fixed wire already lands where it must; no colours pinned.
            middle.set(hi, hi);
            middle_inv.set(hi, hi);
            routed[hi - lo] = true;
            (lo, true)
        } else {
            let dest = permutation.get(hi);
            let rhs_switch = canonical(lo, dest);
            // The packet arrives through the lower sub-network.
            routing.set(right, rhs_switch, setting_for(lo, dest, false));
            let exit = switch_port(lo, size, rhs_switch, false);
            middle.set(hi, exit);
            middle_inv.set(exit, hi);
            routed[hi - lo] = true;
            (sibling(lo, dest), false)
        }
    } else {
        routing.set(left, hi - 1, false);
        (hi, true)
    };

    loop {
        if route_left {
            // `to_route` is an input-side packet awaiting a path. Its switch
            // may be unconstrained, in which case it is coloured straight.
            let lhs_switch = canonical(lo, to_route);
            let setting = match routing.get(left, lhs_switch) {
                Some(setting) => setting,
                None => {
                    routing.set(left, lhs_switch, false);
                    false
                }
            };
            let use_top = half_for(lo, to_route, setting);
            let entry = switch_port(lo, size, lhs_switch, use_top);
            let dest = permutation.get(to_route);
            routed[to_route - lo] = true;
            if size % 2 == 1 && dest == hi {
                // Exits through the fixed bottom wire.
                middle.set(entry, hi);
                middle_inv.set(hi, entry);
            } else {
                let rhs_switch = canonical(lo, dest);
                routing.set(right, rhs_switch, setting_for(lo, dest, use_top));
                let exit = switch_port(lo, size, rhs_switch, use_top);
                middle.set(entry, exit);
                middle_inv.set(exit, entry);
                to_route = sibling(lo, dest);
                route_left = false;
                continue;
            }
        } else {
            // `to_route` is an output-side port whose switch was just fixed;
            // back-route the packet that must exit through it.
            let rhs_switch = canonical(lo, to_route);
            let setting = routing.get(right, rhs_switch).unwrap_or(false);
            let source = inverse.get(to_route);
            if !routed[source - lo] {
                let use_top = half_for(lo, to_route, setting);
                let lhs_switch = canonical(lo, source);
                routing.set(left, lhs_switch, setting_for(lo, source, use_top));
                let entry = switch_port(lo, size, lhs_switch, use_top);
                let exit = switch_port(lo, size, rhs_switch, use_top);
                middle.set(entry, exit);
                middle_inv.set(exit, entry);
                routed[source - lo] = true;
                to_route = sibling(lo, source);
                route_left = true;
                if !routed[to_route - lo] {
                    continue;
                }
            }
        }
        // Chain exhausted: restart at the lowest unrouted packet.
        match routed.iter().position(|&done| !done) {
            Some(offset) => {
                to_route = lo + offset;
                route_left = true;
            }
            None => break,
        }
    }
    debug_assert!(middle.is_valid());

    route_inner(
        left + 1,
        right - 1,
        lo,
        lo + d - 1,
        &middle.slice(lo, lo + d - 1),
        &middle_inv.slice(lo, lo + d - 1),
        routing,
    );
    route_inner(
        left + 1,
        right - 1,
        lo + d,
        hi,
        &middle.slice(lo + d, hi),
        &middle_inv.slice(lo + d, hi),
        routing,
    );
}

/// Whether `routing` realises `permutation`: simulate the network on the
/// identity vector and require that packet `i` lands at `permutation(i)`.
/// Missing canonical entries count as straight.
pub fn valid_routing(permutation: &IntegerPermutation, routing: &Routing) -> bool {
    let n = permutation.size();
    let topology = generate_topology(n);
    if routing.num_columns() != topology.num_columns() {
        return false;
    }
    let mut current: Vec<usize> = (0..n).collect();
    for column in 0..topology.num_columns() {
        let mut next = vec![usize::MAX; n];
        let mut row = 0;
        while row < n {
            let dests = topology.column(column)[row];
            if row == n - 1 || dests.is_pass_through() {
                next[dests.straight] = current[row];
                row += 1;
            } else {
                let cross = routing.get(column, row).unwrap_or(false);
                let (top, bottom) = if cross {
                    (current[row + 1], current[row])
                } else {
                    (current[row], current[row + 1])
                };
                next[dests.straight] = top;
                next[dests.cross] = bottom;
                row += 2;
            }
        }
        current = next;
    }
    (0..n).all(|i| current[permutation.get(i)] == i)
}
