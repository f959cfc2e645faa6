// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory registry of the pins placed in the current session.

use super::pin::{Pin, PinId};
use crate::util::geometry::Point;
use image::RgbaImage;
use std::collections::HashMap;

/// Authoritative map from pin id to pin data.
///
/// Iteration order is unspecified.
#[derive(Debug, Default)]
pub struct PinStore {
    pins: HashMap<PinId, Pin>,
    next_id: u64,
}

impl PinStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> PinId {
        let id = PinId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create an unnamed pin at `position` and return its id.
    pub fn create(&mut self, position: Point) -> PinId {
        self.insert(Pin::at(position))
    }

    /// Add an existing pin (e.g. one read from the save file).
    pub fn insert(&mut self, pin: Pin) -> PinId {
        let id = self.allocate_id();
        self.pins.insert(id, pin);
        id
    }

    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(&id)
    }

    pub fn get_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(&id)
    }

    pub fn contains(&self, id: PinId) -> bool {
        self.pins.contains_key(&id)
    }

    /// Move a pin. Unknown ids are logged and ignored.
    pub fn update_position(&mut self, id: PinId, position: Point) -> bool {
        match self.pins.get_mut(&id) {
            Some(pin) => {
                pin.map_position = position;
                log::debug!("Updated {} position to {:?}", id, position);
                true
            }
            None => {
                log::warn!("Cannot move {}: not in store", id);
                false
            }
        }
    }

    /// Replace a pin's name, description and image. Unknown ids are logged
    /// and ignored.
    pub fn update_content(
        &mut self,
        id: PinId,
        name: impl Into<String>,
        description: impl Into<String>,
        image: Option<RgbaImage>,
    ) -> bool {
        match self.pins.get_mut(&id) {
            Some(pin) => {
                pin.name = name.into();
                pin.description = description.into();
                pin.image = image;
                log::debug!("Updated {} content: name='{}'", id, pin.name);
                true
            }
            None => {
                log::warn!("Cannot update {}: not in store", id);
                false
            }
        }
    }

    /// Detach a pin's image, leaving it without one.
    pub fn take_image(&mut self, id: PinId) -> Option<RgbaImage> {
        self.pins.get_mut(&id).and_then(|pin| pin.image.take())
    }

    /// Set only the image of a pin.
    pub fn update_image(&mut self, id: PinId, image: Option<RgbaImage>) -> bool {
        match self.pins.get_mut(&id) {
            Some(pin) => {
                pin.image = image;
                true
            }
            None => {
                log::warn!("Cannot set image of {}: not in store", id);
                false
            }
        }
    }

    /// Remove a pin. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: PinId) -> Option<Pin> {
        self.pins.remove(&id)
    }

    /// Snapshot of every pin.
    pub fn all(&self) -> Vec<(PinId, &Pin)> {
        self.pins.iter().map(|(id, pin)| (*id, pin)).collect()
    }

    /// Pins that have a name and will be saved.
    pub fn committed(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values().filter(|pin| pin.is_committed())
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Drop every pin. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.pins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_unique_ids() {
        let mut store = PinStore::new();
        let a = store.create(Point::new(1.0, 1.0));
        let b = store.create(Point::new(2.0, 2.0));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert!(!store.get(a).unwrap().is_committed());
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut store = PinStore::new();
        assert!(!store.update_position(PinId(42), Point::ZERO));
        assert!(!store.update_content(PinId(42), "x", "y", None));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_content_and_position() {
        let mut store = PinStore::new();
        let id = store.create(Point::ZERO);
        assert!(store.update_content(id, "Lighthouse", "North cape", None));
        assert!(store.update_position(id, Point::new(-4.0, 9.5)));

        store.get_mut(id).unwrap().description.push_str(" point");
        let pin = store.get(id).unwrap();
        assert_eq!(pin.name, "Lighthouse");
        assert_eq!(pin.description, "North cape point");
        assert_eq!(pin.map_position, Point::new(-4.0, 9.5));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = PinStore::new();
        let id = store.create(Point::ZERO);
        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
        assert!(!store.contains(id));
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut store = PinStore::new();
        let a = store.create(Point::ZERO);
        store.clear();
        let b = store.create(Point::ZERO);
        assert_ne!(a, b);
    }

    #[test]
    fn test_committed_skips_unnamed() {
        let mut store = PinStore::new();
        store.create(Point::ZERO);
        store.insert(Pin::new("Camp", "", Point::ZERO));
        assert_eq!(store.all().len(), 2);
        assert_eq!(store.committed().count(), 1);
    }
}
