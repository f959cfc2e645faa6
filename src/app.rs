// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the [`MapController`] and the GPU-side resources (map and
//! pin textures). Each frame it feeds pointer input from the map view into
//! the controller and reacts to the events the controller emits.

use crate::config::MapConfig;
use crate::controller::{MapController, PanelMode, ViewEvent};
use crate::io::{media, persistence::PinPersistence};
use crate::models::pan_zoom::PanZoomState;
use crate::models::pin::PinId;
use crate::ui::{map_view, pin_panel, toolbar};
use crate::util::geometry::Point;
use crate::util::transform::{RenderMode, ViewFrame};
use anyhow::Result;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

const REPAINT_INTERVAL: Duration = Duration::from_secs(1);

/// Map image decoded on a worker thread.
struct LoadedMap {
    path: PathBuf,
    image: RgbaImage,
}

/// Main application state.
pub struct MapPinsApp {
    controller: MapController,

    render_mode: RenderMode,

    /// Map image waiting to be uploaded as a texture
    pending_map: Option<RgbaImage>,

    map_texture: Option<egui::TextureHandle>,

    /// Textures for pin images, dropped whenever the pin changes
    pin_textures: HashMap<PinId, egui::TextureHandle>,

    /// Edit buffers for open panels
    drafts: HashMap<PinId, pin_panel::PanelDraft>,

    /// Frame used by the most recent map view
    frame: Option<ViewFrame>,

    /// Receiver for background map loading
    map_loader: Option<Receiver<Result<LoadedMap, String>>>,

    /// Loading state message
    loading_message: Option<String>,
}

impl MapPinsApp {
    pub fn new(config: MapConfig) -> Result<Self> {
        let now = Instant::now();

        let mut pending_map = None;
        let mut base_size = config.map_size();
        if let Some(path) = &config.map_image {
            match media::load_image(path) {
                Ok(image) => {
                    log::info!(
                        "Loaded map {} ({}x{})",
                        path.display(),
                        image.width(),
                        image.height()
                    );
                    base_size = Point::new(image.width() as f32, image.height() as f32);
                    pending_map = Some(image);
                }
                Err(e) => log::error!("Failed to load map image: {:#}", e),
            }
        }

        let pan_zoom = PanZoomState::new(
            config.zoom_steps.clone(),
            base_size,
            base_size,
            config.drag_multiplier,
            base_size.y * 0.5,
        )?;

        let persistence = match PinPersistence::from_config(&config) {
            Ok(persistence) => persistence,
            Err(e) => {
                log::warn!("No data directory ({:#}); saving in the working directory", e);
                PinPersistence::new(&config.save_file_name)
            }
        };
        log::info!("Pin save file: {}", persistence.save_path().display());

        Ok(Self {
            controller: MapController::new(pan_zoom, persistence, &config, now),
            render_mode: config.render_mode,
            pending_map,
            map_texture: None,
            pin_textures: HashMap::new(),
            drafts: HashMap::new(),
            frame: None,
            map_loader: None,
            loading_message: None,
        })
    }

    /// Decode a map image on a worker thread.
    fn open_map_image(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.map_loader = Some(receiver);
        self.loading_message = Some("Loading map...".to_string());

        std::thread::spawn(move || {
            let result = media::load_image(&path)
                .map(|image| LoadedMap { path, image })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    fn poll_map_loader(&mut self) {
        let Some(receiver) = &self.map_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.map_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => {
                log::info!(
                    "Loaded map {} ({}x{})",
                    loaded.path.display(),
                    loaded.image.width(),
                    loaded.image.height()
                );
                let size = Point::new(loaded.image.width() as f32, loaded.image.height() as f32);
                self.controller.set_map_size(size);
                self.pending_map = Some(loaded.image);
            }
            Err(e) => log::error!("Failed to load map image: {}", e),
        }
    }

    fn upload_textures(&mut self, ctx: &egui::Context) {
        if let Some(image) = self.pending_map.take() {
            let texture = ctx.load_texture(
                "map",
                media::to_color_image(&image),
                egui::TextureOptions::LINEAR,
            );
            self.map_texture = Some(texture);
        }

        for (id, pin) in self.controller.pins().all() {
            if self.pin_textures.contains_key(&id) {
                continue;
            }
            if let Some(image) = &pin.image {
                let texture = ctx.load_texture(
                    format!("pin_{}", id.0),
                    media::to_color_image(image),
                    egui::TextureOptions::LINEAR,
                );
                self.pin_textures.insert(id, texture);
            }
        }
    }

    /// React to controller events.
    fn process_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                ViewEvent::PinCreated(id) => log::debug!("Created {}", id),
                ViewEvent::PinUpdated(id) => {
                    self.pin_textures.remove(&id);
                }
                ViewEvent::PinRemoved(id) => {
                    self.pin_textures.remove(&id);
                    self.drafts.remove(&id);
                }
                ViewEvent::PanelOpened { id, mode } => {
                    let draft = self
                        .controller
                        .pins()
                        .get(id)
                        .map(pin_panel::PanelDraft::from_pin)
                        .unwrap_or_default();
                    log::debug!("Opened panel for {} in {:?} mode", id, mode);
                    self.drafts.insert(id, draft);
                }
                ViewEvent::PanelClosed(id) => {
                    self.drafts.remove(&id);
                }
                ViewEvent::ZoomChanged { index, scale } => {
                    log::debug!("Zoom step {} (x{})", index, scale)
                }
                ViewEvent::PinsLoaded { count } => log::info!("{} pins loaded", count),
                ViewEvent::Saved { count } => log::info!("{} pins saved", count),
                ViewEvent::PersistenceFailed(msg) => log::error!("Pin save file: {}", msg),
            }
        }
    }

    fn pick_pin_image(&mut self, id: PinId) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp"])
            .pick_file()
        else {
            return;
        };
        match media::load_image(&path) {
            Ok(image) => self.controller.on_request_image(id, image),
            Err(e) => log::error!("Failed to load pin image: {:#}", e),
        }
    }

    fn show_pin_panel(&mut self, ctx: &egui::Context) {
        let (Some(id), Some(frame)) = (self.controller.panels().current(), self.frame.as_ref())
        else {
            return;
        };
        let Some(anchor) = self.controller.panel_anchor(id, frame) else {
            return;
        };
        let mode = self.controller.panel_mode(id).unwrap_or(PanelMode::View);
        let draft = self.drafts.entry(id).or_default();

        let action = pin_panel::show(ctx, id, mode, anchor, draft, self.pin_textures.get(&id));
        match action {
            Some(pin_panel::PanelAction::Save) => {
                let draft = self.drafts.get(&id).cloned().unwrap_or_default();
                self.controller.on_save(id, draft.name.trim(), &draft.description);
            }
            Some(pin_panel::PanelAction::RequestImage) => self.pick_pin_image(id),
            Some(pin_panel::PanelAction::Edit) => self.controller.begin_edit(id),
            Some(pin_panel::PanelAction::Delete) => self.controller.discard(id),
            Some(pin_panel::PanelAction::Close) => self.controller.on_close(id),
            None => {}
        }
    }

    fn apply_toolbar(&mut self, action: toolbar::ToolbarAction, now: Instant) {
        match action {
            toolbar::ToolbarAction::ZoomIn => {
                self.controller.zoom_in();
            }
            toolbar::ToolbarAction::ZoomOut => {
                self.controller.zoom_out();
            }
            toolbar::ToolbarAction::ResetZoom => {
                self.controller.reset_zoom();
            }
            toolbar::ToolbarAction::Save => {
                self.controller.save(now);
            }
            toolbar::ToolbarAction::Load => {
                self.controller.load();
            }
        }
    }
}

impl eframe::App for MapPinsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.poll_map_loader();
        self.controller.tick(now);
        self.process_events();
        self.upload_textures(ctx);

        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Map Image...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "tiff", "tif"])
                            .pick_file()
                        {
                            self.open_map_image(path);
                        }
                        ui.close_menu();
                    }

                    ui.separator();

                    if ui.button("Save Pins").clicked() {
                        self.controller.save(now);
                        ui.close_menu();
                    }
                    if ui.button("Load Pins").clicked() {
                        self.controller.load();
                        ui.close_menu();
                    }
                    if ui.button("Delete Save File").clicked() {
                        self.controller.delete_save_file();
                        ui.close_menu();
                    }
                    if let Some(info) = self.controller.save_file_info() {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} pins, {} bytes, saved {}",
                                info.pin_count, info.size_bytes, info.save_date
                            ))
                            .weak(),
                        );
                    }

                    ui.separator();

                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.controller.zoom_in();
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.controller.zoom_out();
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        self.controller.reset_zoom();
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.controller, now))
            .inner;
        if let Some(action) = toolbar_action {
            self.apply_toolbar(action, now);
        }

        // Keyboard shortcuts
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                if let Some(id) = self.controller.panels().current() {
                    self.controller.on_close(id);
                }
            }
            if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
                self.controller.save(now);
            }
        }

        // Map (center)
        let output = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(message) = &self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    None
                } else {
                    Some(map_view::show(
                        ui,
                        &self.controller,
                        self.render_mode,
                        self.map_texture.as_ref(),
                        &self.pin_textures,
                    ))
                }
            })
            .inner;

        if let Some(output) = output {
            let screen = ctx.screen_rect();
            self.controller.set_screen_size(Point::new(screen.width(), screen.height()));
            self.controller.resize_viewport(output.viewport_size);
            for event in output.events {
                self.controller.handle_input(event, &output.frame);
            }
            self.frame = Some(output.frame);
        }

        self.process_events();
        self.show_pin_panel(ctx);
        self.process_events();

        // Keep unsaved work when the window closes
        let closing = ctx.input(|i| i.viewport().close_requested());
        if closing && self.controller.auto_save_remaining(now).is_some() {
            log::info!("Saving pins before exit");
            self.controller.save(now);
        }

        // Keep ticking for auto-save and the deferred startup load
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
