// -*- mode: rust; -*-
//
// This file is part of `picogram`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Integer permutations over a contiguous index range.
//!
//! The routing solver decomposes a network recursively and needs to talk
//! about permutations of sub-ranges `[lo, hi]` without re-basing indices, so
//! the representation keeps its range offset alongside the images.

use itertools::Itertools;

use crate::errors::Error;

/// A bijection on a contiguous range of indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerPermutation {
    min: usize,
    contents: Vec<usize>,
}

impl IntegerPermutation {
    /// The identity permutation on `[0, n)`.
    pub fn identity(n: usize) -> Self {
        IntegerPermutation {
            min: 0,
            contents: (0..n).collect(),
        }
    }

    /// The identity permutation on the inclusive range `[lo, hi]`.
    pub(crate) fn identity_range(lo: usize, hi: usize) -> Self {
        IntegerPermutation {
            min: lo,
            contents: (lo..=hi).collect(),
        }
    }

    /// Build a permutation on `[0, n)` from the image list `indices`, where
    /// element `i` maps to `indices[i]`. Fails unless the list is a
    /// bijection.
    pub fn from_mapping(indices: &[usize]) -> Result<Self, Error> {
        let perm = IntegerPermutation {
            min: 0,
            contents: indices.to_vec(),
        };
        if !perm.is_valid() {
            return Err(Error::Permutation(format!(
                "index list of length {} is not a bijection",
                indices.len()
            )));
        }
        Ok(perm)
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.contents.len()
    }

    /// The image of `index`.
    pub fn get(&self, index: usize) -> usize {
        self.contents[index - self.min]
    }

    /// Set the image of `index`.
    pub fn set(&mut self, index: usize, value: usize) {
        self.contents[index - self.min] = value;
    }

    /// Whether every index in the range appears exactly once as an image.
    pub fn is_valid(&self) -> bool {
        self.contents
            .iter()
            .copied()
            .sorted()
            .eq(self.min..self.min + self.contents.len())
    }

    /// The inverse permutation. The permutation must be valid.
    pub fn inverse(&self) -> Self {
        let mut contents = vec![0; self.contents.len()];
        for (offset, &image) in self.contents.iter().enumerate() {
            contents[image - self.min] = self.min + offset;
        }
        IntegerPermutation {
            min: self.min,
            contents,
        }
    }

    /// The restriction to the inclusive sub-range `[lo, hi]`, which must map
    /// into itself.
    pub fn slice(&self, lo: usize, hi: usize) -> Self {
        debug_assert!(lo >= self.min && hi < self.min + self.contents.len() && lo <= hi);
        IntegerPermutation {
            min: lo,
            contents: self.contents[lo - self.min..=hi - self.min].to_vec(),
        }
    }
}
