// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with zoom and save controls.
//!
//! This module shows the current zoom step, pin count and the status of
//! the last save-file operation.

use crate::controller::MapController;
use std::time::Instant;

/// Button pressed in the toolbar this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Save,
    Load,
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, controller: &MapController, now: Instant) -> Option<ToolbarAction> {
    let mut action = None;
    let pan_zoom = controller.pan_zoom();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Zoom:");
        let at_min = pan_zoom.index() == 0;
        let at_max = pan_zoom.index() + 1 >= pan_zoom.zoom_steps().len();

        if ui.add_enabled(!at_min, egui::Button::new("➖")).on_hover_text("Zoom out").clicked() {
            action = Some(ToolbarAction::ZoomOut);
        }
        ui.label(format!("x{:.1}", pan_zoom.scale()));
        if ui.add_enabled(!at_max, egui::Button::new("➕")).on_hover_text("Zoom in").clicked() {
            action = Some(ToolbarAction::ZoomIn);
        }
        if ui.add_enabled(!at_min, egui::Button::new("Reset")).clicked() {
            action = Some(ToolbarAction::ResetZoom);
        }

        ui.separator();

        if ui.button("💾 Save").clicked() {
            action = Some(ToolbarAction::Save);
        }
        if ui.button("📂 Load").clicked() {
            action = Some(ToolbarAction::Load);
        }

        ui.separator();

        let pins = controller.pins();
        ui.label(format!("{} pins ({} named)", pins.len(), pins.committed().count()));

        ui.separator();

        let status = controller.persist_status();
        let text = egui::RichText::new(status.to_string());
        if status.is_failure() {
            ui.label(text.color(egui::Color32::LIGHT_RED));
        } else {
            ui.label(text.weak());
        }

        if let Some(remaining) = controller.auto_save_remaining(now) {
            let text = format!("auto-save in {}s", remaining.as_secs());
            ui.label(egui::RichText::new(text).italics().weak());
        }
    });

    action
}
