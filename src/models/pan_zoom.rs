// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Discrete zoom and bounded panning.
//!
//! The map is zoomed through a fixed table of scale steps. The first step is
//! always 1.0, where the whole map fits in the viewport and panning is
//! disabled. Map-local units stay those of the source map; a fit factor
//! derived from the viewport maps them onto the screen at step 0. At higher
//! steps the pan offset is clamped so the scaled map never exposes empty
//! space at the viewport edges.

use crate::util::geometry::{ElementTransform, Point};
use anyhow::{bail, Result};

/// Scroll deltas at or below this magnitude are ignored.
const SCROLL_THRESHOLD: f32 = 0.01;

/// Outcome of a zoom request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomChange {
    Changed { from: usize, to: usize },
    Unchanged,
}

impl ZoomChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, ZoomChange::Changed { .. })
    }
}

/// Check that a zoom table is usable.
pub fn validate_zoom_steps(steps: &[f32]) -> Result<()> {
    let Some(&first) = steps.first() else {
        bail!("zoom step table is empty");
    };
    if (first - 1.0).abs() > f32::EPSILON {
        bail!("first zoom step must be 1.0, got {}", first);
    }
    if let Some(w) = steps.windows(2).find(|w| !w[1].is_finite() || w[1] <= w[0]) {
        bail!("zoom steps must be strictly ascending ({} then {})", w[0], w[1]);
    }
    Ok(())
}

/// Factor that makes a map of `base_size` fit inside `viewport_size`.
///
/// Falls back to 1.0 when either size is empty or not finite.
pub fn fit_scale(base_size: Point, viewport_size: Point) -> f32 {
    let fit = (viewport_size.x / base_size.x).min(viewport_size.y / base_size.y);
    if fit.is_finite() && fit > 0.0 {
        fit
    } else {
        1.0
    }
}

/// Clamp a pan offset so the scaled map covers the viewport.
///
/// If the scaled map fits inside the viewport on both axes the offset is
/// forced to zero. Otherwise each axis is clamped independently to
/// `±(scaled/2 - viewport/2)`, which is zero on any axis that still fits.
pub fn clamp_offset(offset: Point, base_size: Point, viewport_size: Point, scale: f32) -> Point {
    let scaled = base_size * scale;
    if scaled.x <= viewport_size.x && scaled.y <= viewport_size.y {
        return Point::ZERO;
    }

    let limit_x = ((scaled.x - viewport_size.x) * 0.5).max(0.0);
    let limit_y = ((scaled.y - viewport_size.y) * 0.5).max(0.0);
    Point::new(offset.x.clamp(-limit_x, limit_x), offset.y.clamp(-limit_y, limit_y))
}

/// Zoom and pan state of the map view. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PanZoomState {
    zoom_steps: Vec<f32>,
    index: usize,
    offset: Point,
    base_size: Point,
    viewport_size: Point,
    fit: f32,
    drag_multiplier: f32,
    initial_projection_size: f32,
    projection_size: f32,
    initial_camera_position: Point,
    camera_position: Point,
}

impl PanZoomState {
    /// Create the state at the fully zoomed out step.
    ///
    /// `base_size` is the unscaled map size and `viewport_size` the size of
    /// the area it is shown in; the map is fitted to the viewport.
    /// `projection_size` is the camera's view size at scale 1.
    pub fn new(
        zoom_steps: Vec<f32>,
        base_size: Point,
        viewport_size: Point,
        drag_multiplier: f32,
        projection_size: f32,
    ) -> Result<Self> {
        validate_zoom_steps(&zoom_steps)?;
        let mut state = Self {
            zoom_steps,
            index: 0,
            offset: Point::ZERO,
            base_size,
            viewport_size,
            fit: fit_scale(base_size, viewport_size),
            drag_multiplier,
            initial_projection_size: projection_size,
            projection_size,
            initial_camera_position: Point::ZERO,
            camera_position: Point::ZERO,
        };
        state.apply_zoom();
        Ok(state)
    }

    pub fn zoom_steps(&self) -> &[f32] {
        &self.zoom_steps
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current map scale.
    pub fn scale(&self) -> f32 {
        self.zoom_steps[self.index]
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn base_size(&self) -> Point {
        self.base_size
    }

    pub fn viewport_size(&self) -> Point {
        self.viewport_size
    }

    /// Screen units per map unit at zoom step 0.
    pub fn fit(&self) -> f32 {
        self.fit
    }

    /// Map size on screen at step 0.
    pub fn fitted_size(&self) -> Point {
        self.base_size * self.fit
    }

    /// Screen units per map unit at the current step.
    pub fn display_scale(&self) -> f32 {
        self.fit * self.scale()
    }

    /// Camera view size derived from the current scale.
    ///
    /// Tracked for camera rigs that zoom by shrinking the view. The built-in
    /// camera-projected frame keeps a fixed projection and scales the map
    /// instead, so it does not read this.
    pub fn projection_size(&self) -> f32 {
        self.projection_size
    }

    pub fn camera_position(&self) -> Point {
        self.camera_position
    }

    /// Map transform relative to the viewport center.
    pub fn map_transform(&self) -> ElementTransform {
        ElementTransform::new(self.offset, self.display_scale())
    }

    pub fn zoom_in(&mut self) -> ZoomChange {
        self.set_zoom_index(self.index.saturating_add(1))
    }

    pub fn zoom_out(&mut self) -> ZoomChange {
        self.set_zoom_index(self.index.saturating_sub(1))
    }

    /// Zoom in on positive scroll, out on negative scroll.
    pub fn handle_scroll(&mut self, delta_y: f32) -> ZoomChange {
        if delta_y.abs() <= SCROLL_THRESHOLD {
            return ZoomChange::Unchanged;
        }
        if delta_y > 0.0 {
            log::debug!("Zooming in");
            self.zoom_in()
        } else {
            log::debug!("Zooming out");
            self.zoom_out()
        }
    }

    /// Jump to a zoom step, clamped to the table.
    pub fn set_zoom_index(&mut self, index: usize) -> ZoomChange {
        let target = index.min(self.zoom_steps.len() - 1);
        if target == self.index {
            log::debug!("Zoom index unchanged at {}", self.index);
            return ZoomChange::Unchanged;
        }

        let from = self.index;
        self.index = target;
        self.apply_zoom();
        log::debug!("Zoom index {} -> {} (scale {})", from, target, self.scale());
        ZoomChange::Changed { from, to: target }
    }

    /// Pan by a screen-space pointer delta.
    ///
    /// Does nothing at scale 1 or below. Returns whether the offset moved.
    pub fn pan(&mut self, delta: Point) -> bool {
        let scale = self.scale();
        if scale <= 1.0 {
            log::trace!("Pan disabled at scale {}", scale);
            return false;
        }

        let before = self.offset;
        self.offset += delta * (self.drag_multiplier / scale);
        self.clamp();
        self.offset != before
    }

    /// Update the viewport size, e.g. after a window resize.
    pub fn resize_viewport(&mut self, viewport_size: Point) {
        if self.viewport_size == viewport_size {
            return;
        }
        self.viewport_size = viewport_size;
        self.fit = fit_scale(self.base_size, viewport_size);
        self.clamp();
    }

    /// Replace the unscaled map size, e.g. after a new map image is opened.
    pub fn set_base_size(&mut self, base_size: Point) {
        self.base_size = base_size;
        self.fit = fit_scale(base_size, self.viewport_size);
        self.clamp();
    }

    fn apply_zoom(&mut self) {
        let scale = self.scale();
        self.projection_size = self.initial_projection_size / scale;

        if self.index == 0 {
            self.offset = Point::ZERO;
            self.camera_position = self.initial_camera_position;
        } else {
            self.clamp();
        }
    }

    fn clamp(&mut self) {
        if self.index == 0 {
            self.offset = Point::ZERO;
            return;
        }
        self.offset = clamp_offset(
            self.offset,
            self.fitted_size(),
            self.viewport_size,
            self.scale(),
        );
    }
}
