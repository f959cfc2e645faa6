// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Floating panel for viewing and editing a single pin.

use crate::controller::PanelMode;
use crate::models::pin::{Pin, PinId};
use crate::util::geometry::Point;

const THUMBNAIL_SIZE: egui::Vec2 = egui::vec2(180.0, 120.0);

/// Text being edited in an open panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelDraft {
    pub name: String,
    pub description: String,
}

impl PanelDraft {
    pub fn from_pin(pin: &Pin) -> Self {
        Self {
            name: pin.name.clone(),
            description: pin.description.clone(),
        }
    }
}

/// Button pressed in the panel this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Save,
    RequestImage,
    Edit,
    Delete,
    Close,
}

/// Show the panel for `id` with its top-left corner at `anchor`.
pub fn show(
    ctx: &egui::Context,
    id: PinId,
    mode: PanelMode,
    anchor: Point,
    draft: &mut PanelDraft,
    texture: Option<&egui::TextureHandle>,
) -> Option<PanelAction> {
    let mut action = None;
    let editing = mode == PanelMode::Edit;

    let title = if draft.name.is_empty() {
        format!("New {}", id)
    } else {
        draft.name.clone()
    };

    egui::Window::new(title)
        .id(egui::Id::new(("pin_panel", id.0)))
        .fixed_pos(egui::pos2(anchor.x, anchor.y))
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.set_width(THUMBNAIL_SIZE.x);

            if editing {
                ui.label("Name:");
                ui.add(egui::TextEdit::singleline(&mut draft.name).hint_text("Pin name"));
                ui.label("Description:");
                ui.add(egui::TextEdit::multiline(&mut draft.description).desired_rows(3));
            } else {
                ui.heading(&draft.name);
                if draft.description.is_empty() {
                    ui.label(egui::RichText::new("No description").italics().weak());
                } else {
                    ui.label(&draft.description);
                }
            }

            ui.separator();

            match texture {
                Some(texture) => {
                    ui.add(egui::Image::new(texture).max_size(THUMBNAIL_SIZE));
                }
                None => {
                    ui.label(egui::RichText::new("No image").weak());
                }
            }

            ui.separator();

            ui.horizontal(|ui| {
                if editing {
                    // Unnamed pins are never saved
                    let named = !draft.name.trim().is_empty();
                    if ui.add_enabled(named, egui::Button::new("Save")).clicked() {
                        action = Some(PanelAction::Save);
                    }
                    if ui.button("Choose Image…").clicked() {
                        action = Some(PanelAction::RequestImage);
                    }
                } else if ui.button("Edit").clicked() {
                    action = Some(PanelAction::Edit);
                }
                if ui.button("🗑 Delete").clicked() {
                    action = Some(PanelAction::Delete);
                }
                if ui.button("Close").clicked() {
                    action = Some(PanelAction::Close);
                }
            });
        });

    action
}
