// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screen to map coordinate conversion.
//!
//! A pointer position goes through three frames before it becomes a pin
//! position:
//!
//! 1. screen space, as reported by the pointer API;
//! 2. UI space, which equals screen space in overlay mode and is obtained
//!    through the inverse camera projection in camera-projected mode;
//! 3. map-local space, reached through the inverse of the UI surface
//!    transform followed by the inverse of the map element's own transform.
//!
//! Everything here is a pure function of its inputs and safe to call every
//! frame.

use crate::util::geometry::{Affine2, ElementTransform, Point};
use serde::{Deserialize, Serialize};

/// How the UI surface is presented on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// UI coordinates are screen pixels.
    #[default]
    Overlay,
    /// UI coordinates come from projecting through a camera.
    CameraProjected,
}

/// Orthographic camera looking at the UI plane.
///
/// World y grows upward while screen y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    /// World position at the center of the screen
    pub position: Point,
    /// Half of the visible world height
    pub half_height: f32,
    /// Screen size in pixels
    pub screen_size: Point,
}

impl OrthoCamera {
    fn units_per_pixel(&self) -> Option<f32> {
        if self.screen_size.y <= 0.0 || self.half_height <= 0.0 {
            return None;
        }
        Some(2.0 * self.half_height / self.screen_size.y)
    }

    /// Unproject a screen point onto the UI plane.
    pub fn screen_to_world(&self, screen: Point) -> Option<Point> {
        let upp = self.units_per_pixel()?;
        let half = self.screen_size * 0.5;
        Some(Point::new(
            self.position.x + (screen.x - half.x) * upp,
            self.position.y - (screen.y - half.y) * upp,
        ))
    }

    /// Project a point on the UI plane to the screen.
    pub fn world_to_screen(&self, world: Point) -> Option<Point> {
        let upp = self.units_per_pixel()?;
        let half = self.screen_size * 0.5;
        Some(Point::new(
            (world.x - self.position.x) / upp + half.x,
            half.y - (world.y - self.position.y) / upp,
        ))
    }
}

/// Everything needed to convert between screen and map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrame {
    pub render_mode: RenderMode,
    /// Camera bound to the UI surface, only used in camera-projected mode
    pub camera: Option<OrthoCamera>,
    /// UI surface (the map's parent) to UI space
    pub surface: Option<Affine2>,
    /// Map element relative to the surface
    pub map: Option<ElementTransform>,
    /// UI scale factor, pointer deltas are divided by it
    pub ui_scale: f32,
}

impl ViewFrame {
    /// Overlay frame with the surface origin at `surface_origin` on screen.
    pub fn overlay(surface_origin: Point, map: ElementTransform) -> Self {
        Self {
            render_mode: RenderMode::Overlay,
            camera: None,
            surface: Some(Affine2::translation(surface_origin)),
            map: Some(map),
            ui_scale: 1.0,
        }
    }

    /// Screen space to UI space.
    fn screen_to_ui(&self, screen: Point) -> Point {
        match self.render_mode {
            RenderMode::Overlay => screen,
            RenderMode::CameraProjected => {
                let world = self.camera.and_then(|c| c.screen_to_world(screen));
                world.unwrap_or_else(|| {
                    log::warn!("No usable camera in camera-projected mode, using screen space");
                    screen
                })
            }
        }
    }

    /// UI space to screen space.
    fn ui_to_screen(&self, ui: Point) -> Point {
        match self.render_mode {
            RenderMode::Overlay => ui,
            RenderMode::CameraProjected => {
                let screen = self.camera.and_then(|c| c.world_to_screen(ui));
                screen.unwrap_or_else(|| {
                    log::warn!("No usable camera in camera-projected mode, using UI space");
                    ui
                })
            }
        }
    }

    /// Map-local space to UI space, if both references are resolved.
    fn map_to_ui(&self) -> Option<Affine2> {
        let Some(surface) = self.surface else {
            log::error!("UI surface not set for coordinate conversion");
            return None;
        };
        let Some(map) = self.map else {
            log::error!("Map transform not set for coordinate conversion");
            return None;
        };
        Some(surface.then_after(map.to_parent()))
    }
}

/// Convert a screen point to map-local coordinates.
///
/// Returns `screen` unchanged when the frame is missing a reference or the
/// map transform is degenerate.
pub fn screen_to_map(screen: Point, frame: &ViewFrame) -> Point {
    let Some(ui_to_map) = frame.map_to_ui().and_then(|m| m.inverse()) else {
        log::error!("Cannot convert screen point {:?} to map coordinates", screen);
        return screen;
    };

    let ui = frame.screen_to_ui(screen);
    let local = ui_to_map.transform_point(ui);
    log::trace!("Screen {:?} -> UI {:?} -> map local {:?}", screen, ui, local);
    local
}

/// Convert a map-local point back to screen coordinates.
pub fn map_to_screen(local: Point, frame: &ViewFrame) -> Point {
    let Some(map_to_ui) = frame.map_to_ui() else {
        log::error!("Cannot convert map point {:?} to screen coordinates", local);
        return local;
    };
    frame.ui_to_screen(map_to_ui.transform_point(local))
}

/// Convert a screen-space pointer delta into a map-local delta.
pub fn screen_delta_to_map(delta: Point, scale: f32, frame: &ViewFrame) -> Point {
    let ui_scale = if frame.ui_scale > 0.0 { frame.ui_scale } else { 1.0 };
    if scale <= 0.0 {
        return delta * (1.0 / ui_scale);
    }
    delta * (1.0 / (scale * ui_scale))
}
