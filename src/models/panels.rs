// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tracks which pin detail panels are open.
//!
//! At most one panel should be open at a time: opening a panel closes every
//! other one first.

use super::pin::PinId;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct PanelRegistry {
    open: BTreeSet<PinId>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as open after closing all other panels.
    ///
    /// Returns the pins whose panels were closed, one entry per close event.
    pub fn open(&mut self, id: PinId) -> Vec<PinId> {
        let closed: Vec<PinId> = self.open.iter().copied().filter(|other| *other != id).collect();
        self.open.retain(|other| *other == id);
        self.open.insert(id);
        closed
    }

    /// Unregister `id`. Returns false if it was not open.
    pub fn close(&mut self, id: PinId) -> bool {
        self.open.remove(&id)
    }

    /// Close every panel, returning the pins that were open.
    pub fn close_all(&mut self) -> Vec<PinId> {
        std::mem::take(&mut self.open).into_iter().collect()
    }

    pub fn is_open(&self, id: PinId) -> bool {
        self.open.contains(&id)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// The open panel, if any.
    pub fn current(&self) -> Option<PinId> {
        self.open.iter().next().copied()
    }
}
