// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map surface with pins.
//!
//! This module draws the map and its pins into the central area and turns
//! pointer activity into [`InputEvent`]s for the controller. It never
//! changes state itself.

use crate::controller::{InputEvent, MapController};
use crate::models::pan_zoom::PanZoomState;
use crate::models::pin::PinId;
use crate::util::geometry::{Affine2, Point};
use crate::util::transform::{map_to_screen, OrthoCamera, RenderMode, ViewFrame};
use std::collections::HashMap;

const PIN_RADIUS: f32 = 7.0;
const PIN_HIT_SIZE: f32 = 18.0;
const GRID_SPACING: f32 = 64.0;

/// What the map view produced this frame.
pub struct MapViewOutput {
    pub events: Vec<InputEvent>,
    pub frame: ViewFrame,
    /// Size of the area the map is shown in
    pub viewport_size: Point,
}

pub fn to_pos2(p: Point) -> egui::Pos2 {
    egui::pos2(p.x, p.y)
}

pub fn from_pos2(p: egui::Pos2) -> Point {
    Point::new(p.x, p.y)
}

/// Build the coordinate frame for a viewport rectangle.
///
/// The map is centered in the viewport. In camera-projected mode the UI
/// plane is viewed through an orthographic camera at one world unit per
/// point, with world y pointing up.
pub fn build_frame(
    render_mode: RenderMode,
    viewport: egui::Rect,
    screen: egui::Rect,
    pan_zoom: &PanZoomState,
) -> ViewFrame {
    let center = from_pos2(viewport.center());
    match render_mode {
        RenderMode::Overlay => ViewFrame::overlay(center, pan_zoom.map_transform()),
        RenderMode::CameraProjected => {
            let camera = OrthoCamera {
                position: pan_zoom.camera_position(),
                half_height: screen.height() * 0.5,
                screen_size: Point::new(screen.width(), screen.height()),
            };
            let flip_y = Affine2::scaling(Point::new(1.0, -1.0));
            let surface = camera
                .screen_to_world(center)
                .map(|origin| Affine2::translation(origin).then_after(flip_y));
            ViewFrame {
                render_mode,
                camera: Some(camera),
                surface,
                map: Some(pan_zoom.map_transform()),
                ui_scale: 1.0,
            }
        }
    }
}

/// Draw the map and pins, and collect pointer input.
pub fn show(
    ui: &mut egui::Ui,
    controller: &MapController,
    render_mode: RenderMode,
    map_texture: Option<&egui::TextureHandle>,
    pin_textures: &HashMap<PinId, egui::TextureHandle>,
) -> MapViewOutput {
    let mut events = Vec::new();

    let (rect, response) =
        ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let screen = ui.ctx().screen_rect();
    let pan_zoom = controller.pan_zoom();
    let frame = build_frame(render_mode, rect, screen, pan_zoom);

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    // Map extent in screen space
    let half = pan_zoom.base_size() * 0.5;
    let map_rect = egui::Rect::from_two_pos(
        to_pos2(map_to_screen(Point::new(-half.x, -half.y), &frame)),
        to_pos2(map_to_screen(half, &frame)),
    );

    match map_texture {
        Some(texture) => {
            painter.image(
                texture.id(),
                map_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => draw_placeholder_map(&painter, map_rect, pan_zoom.display_scale()),
    }

    // Map interactions: scroll zooms, left-drag pans, right-click places a pin
    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            events.push(InputEvent::Scroll { delta_y: scroll });
        }
    }
    if let Some(pos) = response.interact_pointer_pos() {
        let pos = from_pos2(pos);
        if response.drag_started_by(egui::PointerButton::Primary) {
            events.push(InputEvent::DragStart { pos });
        } else if response.dragged_by(egui::PointerButton::Primary) {
            events.push(InputEvent::DragMove { pos });
        }
        if response.secondary_clicked() {
            events.push(InputEvent::PlacePin { pos });
        }
    }
    if response.drag_stopped() {
        events.push(InputEvent::DragEnd);
    }

    // Pins, drawn in creation order
    let mut pins = controller.pins().all();
    pins.sort_by_key(|(id, _)| *id);

    for (id, pin) in pins {
        let Some(local) = controller.pin_position(id) else {
            continue;
        };
        let center = to_pos2(map_to_screen(local, &frame));
        let hit_rect = egui::Rect::from_center_size(center, egui::vec2(PIN_HIT_SIZE, PIN_HIT_SIZE));
        let pin_response =
            ui.interact(hit_rect, ui.id().with(("pin", id.0)), egui::Sense::click_and_drag());

        let open = controller.panels().is_open(id);
        let fill = if open {
            egui::Color32::YELLOW
        } else if pin.is_committed() {
            egui::Color32::from_rgb(220, 60, 60)
        } else {
            egui::Color32::LIGHT_BLUE
        };

        if let Some(texture) = pin_textures.get(&id) {
            let thumb_center = center - egui::vec2(0.0, 26.0);
            let thumb = egui::Rect::from_center_size(thumb_center, egui::vec2(24.0, 24.0));
            painter.image(
                texture.id(),
                thumb,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        painter.circle_filled(center, PIN_RADIUS, fill);
        painter.circle_stroke(center, PIN_RADIUS, egui::Stroke::new(1.5, egui::Color32::BLACK));

        let label = if pin.is_committed() {
            pin.name.as_str()
        } else {
            "(unnamed)"
        };
        painter.text(
            center + egui::vec2(0.0, PIN_RADIUS + 2.0),
            egui::Align2::CENTER_TOP,
            label,
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );

        if pin_response.clicked() {
            events.push(InputEvent::PinClicked { id });
        }
        if pin_response.dragged_by(egui::PointerButton::Primary) {
            let delta = pin_response.drag_delta();
            if delta != egui::Vec2::ZERO {
                events.push(InputEvent::PinDragMove {
                    id,
                    delta: Point::new(delta.x, delta.y),
                });
            }
        }
        if pin_response.drag_stopped() {
            events.push(InputEvent::PinDragEnd { id });
        }
        let hover = if pin.description.is_empty() {
            label
        } else {
            pin.description.as_str()
        };
        pin_response.on_hover_text(hover);
    }

    MapViewOutput {
        events,
        frame,
        viewport_size: Point::new(rect.width(), rect.height()),
    }
}

/// Grid shown when no map image is loaded.
fn draw_placeholder_map(painter: &egui::Painter, map_rect: egui::Rect, scale: f32) {
    painter.rect_filled(map_rect, 0.0, egui::Color32::from_rgb(58, 74, 62));
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(80, 100, 84));
    let step = GRID_SPACING * scale;

    let mut x = map_rect.min.x;
    while x <= map_rect.max.x {
        painter.line_segment(
            [egui::pos2(x, map_rect.min.y), egui::pos2(x, map_rect.max.y)],
            stroke,
        );
        x += step;
    }
    let mut y = map_rect.min.y;
    while y <= map_rect.max.y {
        painter.line_segment(
            [egui::pos2(map_rect.min.x, y), egui::pos2(map_rect.max.x, y)],
            stroke,
        );
        y += step;
    }
    painter.rect_stroke(map_rect, 0.0, egui::Stroke::new(2.0, egui::Color32::from_gray(20)));
}
