// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Random channel ID allocation for renamed channels.

use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::core::{EditError, Result};

/// Number of distinct 16-bit channel IDs.
const ID_SPACE: usize = 1 << 16;

/// Draws channel IDs uniformly from the IDs not yet in use.
///
/// Seeded with every channel ID of the source file. Each allocated ID is
/// reserved, so several renames in one file never share an ID. The OS
/// random source is used by default; any [`TryRngCore`] can be supplied.
#[derive(Debug)]
pub struct ChannelIdAllocator<R = OsRng> {
    taken: HashSet<u16>,
    rng: R,
}

impl ChannelIdAllocator<OsRng> {
    /// Allocator backed by the operating system's random source.
    pub fn new(existing: impl IntoIterator<Item = u16>) -> Self {
        Self::with_rng(existing, OsRng)
    }
}

impl<R: TryRngCore> ChannelIdAllocator<R> {
    /// Allocator backed by `rng`.
    pub fn with_rng(existing: impl IntoIterator<Item = u16>, rng: R) -> Self {
        Self {
            taken: existing.into_iter().collect(),
            rng,
        }
    }

    /// Return a fresh ID and reserve it.
    pub fn allocate(&mut self) -> Result<u16> {
        if self.taken.len() >= ID_SPACE {
            return Err(EditError::entropy("channel id space exhausted"));
        }

        let mut buf = [0u8; 2];
        loop {
            self.rng
                .try_fill_bytes(&mut buf)
                .map_err(|e| EditError::entropy(e.to_string()))?;
            let id = u16::from_le_bytes(buf);
            if self.taken.insert(id) {
                return Ok(id);
            }
        }
    }

    /// Mark `id` as used.
    pub fn reserve(&mut self, id: u16) {
        self.taken.insert(id);
    }

    /// Whether `id` is in use.
    pub fn is_taken(&self, id: u16) -> bool {
        self.taken.contains(&id)
    }

    /// IDs still available.
    pub fn available(&self) -> usize {
        ID_SPACE - self.taken.len()
    }
}
