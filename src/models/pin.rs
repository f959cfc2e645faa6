// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pin data structures.
//!
//! A pin is a user-placed point of interest on the map with a name,
//! a description, an optional image and a position in map-local space.

use crate::util::geometry::Point;
use image::RgbaImage;
use std::fmt;

/// Stable identity of a pin, allocated by the pin store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub u64);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

/// A placed pin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pin {
    pub name: String,
    pub description: String,
    pub image: Option<RgbaImage>,
    pub map_position: Point,
}

impl Pin {
    /// Create an unnamed pin at the given map-local position.
    pub fn at(map_position: Point) -> Self {
        Self {
            map_position,
            ..Default::default()
        }
    }

    /// Create a pin with content and no image.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        map_position: Point,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: None,
            map_position,
        }
    }

    /// Pins without a name have not been committed and are never saved.
    pub fn is_committed(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pin_is_uncommitted() {
        let pin = Pin::at(Point::new(3.0, 4.0));
        assert!(!pin.is_committed());
        assert!(pin.image.is_none());
        assert_eq!(pin.map_position, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_named_pin_is_committed() {
        assert!(Pin::new("Harbor", "", Point::ZERO).is_committed());
    }
}
