// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map interaction controller.
//!
//! The controller owns the pan/zoom state, the pin store and the panel
//! registry, and is handed the persistence component at construction.
//! The UI feeds it [`InputEvent`]s and panel actions; it answers with
//! [`ViewEvent`]s that the UI drains once per frame to create, refresh or
//! drop on-screen state.

use crate::config::MapConfig;
use crate::io::persistence::{AutoSaveTimer, PersistStatus, PinPersistence, SaveFileInfo};
use crate::models::pan_zoom::{PanZoomState, ZoomChange};
use crate::models::panels::PanelRegistry;
use crate::models::pin::{Pin, PinId};
use crate::models::pin_store::PinStore;
use crate::util::geometry::Point;
use crate::util::transform::{map_to_screen, screen_delta_to_map, screen_to_map, ViewFrame};
use image::RgbaImage;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Pointer positions further than this outside the screen are ignored
/// while panning.
const DRAG_SCREEN_MARGIN: f32 = 10.0;

/// Pointer input, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Scroll { delta_y: f32 },
    DragStart { pos: Point },
    DragMove { pos: Point },
    DragEnd,
    PlacePin { pos: Point },
    PinClicked { id: PinId },
    PinDragMove { id: PinId, delta: Point },
    PinDragEnd { id: PinId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    View,
    Edit,
}

/// State changes the UI needs to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    PinCreated(PinId),
    PinUpdated(PinId),
    PinRemoved(PinId),
    PanelOpened { id: PinId, mode: PanelMode },
    PanelClosed(PinId),
    ZoomChanged { index: usize, scale: f32 },
    PinsLoaded { count: usize },
    Saved { count: usize },
    PersistenceFailed(String),
}

#[derive(Debug, Clone, Copy)]
struct PinDrag {
    id: PinId,
    position: Point,
}

pub struct MapController {
    pan_zoom: PanZoomState,
    pins: PinStore,
    panels: PanelRegistry,
    panel_modes: HashMap<PinId, PanelMode>,
    persistence: PinPersistence,
    auto_save: AutoSaveTimer,
    /// Deadline of the deferred startup load
    pending_load: Option<Instant>,
    load_replaces: bool,
    panel_offset: Point,
    screen_size: Option<Point>,
    /// Last pointer position of an in-progress map pan
    pan_pointer: Option<Point>,
    pin_drag: Option<PinDrag>,
    events: Vec<ViewEvent>,
}

impl MapController {
    pub fn new(
        pan_zoom: PanZoomState,
        persistence: PinPersistence,
        config: &MapConfig,
        now: Instant,
    ) -> Self {
        let pending_load = config
            .auto_load_on_start
            .then(|| now + config.load_delay());

        Self {
            pan_zoom,
            pins: PinStore::new(),
            panels: PanelRegistry::new(),
            panel_modes: HashMap::new(),
            persistence,
            auto_save: AutoSaveTimer::from_config(config, now),
            pending_load,
            load_replaces: config.load_replaces,
            panel_offset: config.panel_offset(),
            screen_size: None,
            pan_pointer: None,
            pin_drag: None,
            events: Vec::new(),
        }
    }

    pub fn pan_zoom(&self) -> &PanZoomState {
        &self.pan_zoom
    }

    pub fn pins(&self) -> &PinStore {
        &self.pins
    }

    pub fn panels(&self) -> &PanelRegistry {
        &self.panels
    }

    pub fn persist_status(&self) -> &PersistStatus {
        self.persistence.status()
    }

    pub fn save_file_info(&self) -> Option<SaveFileInfo> {
        self.persistence.save_file_info()
    }

    pub fn auto_save_remaining(&self, now: Instant) -> Option<Duration> {
        self.auto_save.remaining(now)
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Size of the screen the pointer reports positions in.
    pub fn set_screen_size(&mut self, size: Point) {
        self.screen_size = Some(size);
    }

    pub fn resize_viewport(&mut self, size: Point) {
        self.pan_zoom.resize_viewport(size);
    }

    pub fn set_map_size(&mut self, size: Point) {
        self.pan_zoom.set_base_size(size);
    }

    /// Route one input event.
    pub fn handle_input(&mut self, event: InputEvent, frame: &ViewFrame) {
        match event {
            InputEvent::Scroll { delta_y } => {
                let change = self.pan_zoom.handle_scroll(delta_y);
                self.note_zoom(change);
            }
            InputEvent::DragStart { pos } => {
                self.pan_pointer = Some(pos);
                log::debug!("Drag started at {:?}", pos);
            }
            InputEvent::DragMove { pos } => self.drag_map(pos),
            InputEvent::DragEnd => {
                self.pan_pointer = None;
                log::debug!("Drag ended");
            }
            InputEvent::PlacePin { pos } => {
                self.place_pin(pos, frame);
            }
            InputEvent::PinClicked { id } => self.click_pin(id),
            InputEvent::PinDragMove { id, delta } => self.drag_pin(id, delta, frame),
            InputEvent::PinDragEnd { id } => self.finish_pin_drag(id),
        }
    }

    fn drag_map(&mut self, pos: Point) {
        let Some(last) = self.pan_pointer else {
            return;
        };
        self.pan_pointer = Some(pos);

        if let Some(screen) = self.screen_size {
            let outside = pos.x < -DRAG_SCREEN_MARGIN
                || pos.y < -DRAG_SCREEN_MARGIN
                || pos.x > screen.x + DRAG_SCREEN_MARGIN
                || pos.y > screen.y + DRAG_SCREEN_MARGIN;
            if outside {
                return;
            }
        }

        self.pan_zoom.pan(pos - last);
    }

    /// Create a pin under a screen position and open its panel for editing.
    pub fn place_pin(&mut self, screen_pos: Point, frame: &ViewFrame) -> PinId {
        let local = screen_to_map(screen_pos, frame);
        let id = self.pins.create(local);
        log::info!("Created {} at map position {:?}", id, local);
        self.events.push(ViewEvent::PinCreated(id));
        self.open_panel(id, PanelMode::Edit);
        id
    }

    fn click_pin(&mut self, id: PinId) {
        if self.pin_drag.is_some_and(|drag| drag.id == id) {
            return;
        }
        if !self.pins.contains(id) {
            log::warn!("Click on unknown {}", id);
            return;
        }
        if self.panels.is_open(id) {
            self.close_panel(id);
        } else {
            self.open_panel(id, PanelMode::View);
        }
    }

    fn drag_pin(&mut self, id: PinId, delta: Point, frame: &ViewFrame) {
        let start = match self.pin_drag {
            Some(drag) if drag.id == id => drag.position,
            _ => match self.pins.get(id) {
                Some(pin) => pin.map_position,
                None => {
                    log::warn!("Drag of unknown {}", id);
                    return;
                }
            },
        };
        let moved = screen_delta_to_map(delta, self.pan_zoom.display_scale(), frame);
        self.pin_drag = Some(PinDrag {
            id,
            position: start + moved,
        });
    }

    fn finish_pin_drag(&mut self, id: PinId) {
        match self.pin_drag.take() {
            Some(drag) if drag.id == id => {
                log::debug!("{} drag ended at {:?}", id, drag.position);
                if self.pins.update_position(id, drag.position) {
                    self.events.push(ViewEvent::PinUpdated(id));
                }
            }
            other => self.pin_drag = other,
        }
    }

    /// Current position of a pin, including an in-progress drag.
    pub fn pin_position(&self, id: PinId) -> Option<Point> {
        match self.pin_drag {
            Some(drag) if drag.id == id => Some(drag.position),
            _ => self.pins.get(id).map(|pin| pin.map_position),
        }
    }

    /// Screen position for the panel of `id`.
    pub fn panel_anchor(&self, id: PinId, frame: &ViewFrame) -> Option<Point> {
        let local = self.pin_position(id)?;
        Some(map_to_screen(local, frame) + self.panel_offset)
    }

    pub fn panel_mode(&self, id: PinId) -> Option<PanelMode> {
        self.panel_modes.get(&id).copied()
    }

    fn open_panel(&mut self, id: PinId, mode: PanelMode) {
        for closed in self.panels.open(id) {
            self.panel_modes.remove(&closed);
            self.events.push(ViewEvent::PanelClosed(closed));
        }
        self.panel_modes.insert(id, mode);
        self.events.push(ViewEvent::PanelOpened { id, mode });
    }

    fn close_panel(&mut self, id: PinId) {
        if self.panels.close(id) {
            self.panel_modes.remove(&id);
            self.events.push(ViewEvent::PanelClosed(id));
        }
    }

    /// Panel "save": store the edited text and close the panel.
    pub fn on_save(&mut self, id: PinId, name: &str, description: &str) {
        let image = self.pins.take_image(id);
        if self.pins.update_content(id, name, description, image) {
            self.events.push(ViewEvent::PinUpdated(id));
        }
        self.close_panel(id);
    }

    /// Panel "choose image": attach a picked image to the pin.
    pub fn on_request_image(&mut self, id: PinId, image: RgbaImage) {
        if self.pins.update_image(id, Some(image)) {
            self.events.push(ViewEvent::PinUpdated(id));
        }
    }

    pub fn on_close(&mut self, id: PinId) {
        self.close_panel(id);
    }

    /// Switch an open panel to edit mode.
    pub fn begin_edit(&mut self, id: PinId) {
        if let Some(mode) = self.panel_modes.get_mut(&id) {
            *mode = PanelMode::Edit;
        }
    }

    /// Remove a pin and its panel.
    pub fn discard(&mut self, id: PinId) {
        self.close_panel(id);
        if self.pin_drag.is_some_and(|drag| drag.id == id) {
            self.pin_drag = None;
        }
        if self.pins.remove(id).is_some() {
            log::info!("Removed {}", id);
            self.events.push(ViewEvent::PinRemoved(id));
        }
    }

    pub fn zoom_in(&mut self) -> ZoomChange {
        let change = self.pan_zoom.zoom_in();
        self.note_zoom(change);
        change
    }

    pub fn zoom_out(&mut self) -> ZoomChange {
        let change = self.pan_zoom.zoom_out();
        self.note_zoom(change);
        change
    }

    pub fn reset_zoom(&mut self) -> ZoomChange {
        let change = self.pan_zoom.set_zoom_index(0);
        self.note_zoom(change);
        change
    }

    fn note_zoom(&mut self, change: ZoomChange) {
        if change.is_changed() {
            self.events.push(ViewEvent::ZoomChanged {
                index: self.pan_zoom.index(),
                scale: self.pan_zoom.scale(),
            });
        }
    }

    /// Save named pins now.
    pub fn save(&mut self, now: Instant) -> PersistStatus {
        let status = self.persistence.save(self.pins.committed());
        self.auto_save.mark(now);
        self.note_persist(&status);
        status
    }

    /// Load pins from the save file and add them to the store.
    pub fn load(&mut self) -> PersistStatus {
        let loaded: Vec<Pin> = self.persistence.load();
        let status = self.persistence.status().clone();

        if self.load_replaces && !status.is_failure() {
            for id in self.panels.close_all() {
                self.panel_modes.remove(&id);
                self.events.push(ViewEvent::PanelClosed(id));
            }
            for (id, _) in self.pins.all() {
                self.events.push(ViewEvent::PinRemoved(id));
            }
            self.pins.clear();
            self.pin_drag = None;
        }

        let mut count = 0;
        for pin in loaded.into_iter().filter(Pin::is_committed) {
            let id = self.pins.insert(pin);
            self.events.push(ViewEvent::PinCreated(id));
            count += 1;
        }
        log::info!("Created {} pins from saved data", count);

        if status.is_failure() {
            self.note_persist(&status);
        } else {
            self.events.push(ViewEvent::PinsLoaded { count });
        }
        status
    }

    pub fn delete_save_file(&mut self) -> PersistStatus {
        let status = self.persistence.delete_save_file();
        self.note_persist(&status);
        status
    }

    fn note_persist(&mut self, status: &PersistStatus) {
        match status {
            PersistStatus::Saved { count } => self.events.push(ViewEvent::Saved { count: *count }),
            PersistStatus::Failed(msg) => {
                self.events.push(ViewEvent::PersistenceFailed(msg.clone()))
            }
            _ => {}
        }
    }

    /// Per-frame housekeeping: the deferred startup load and auto-save.
    pub fn tick(&mut self, now: Instant) {
        if self.pending_load.is_some_and(|deadline| now >= deadline) {
            self.pending_load = None;
            self.load();
        }
        if self.auto_save.due(now) {
            log::debug!("Auto-save");
            self.save(now);
        }
    }

    /// Whether the startup load has not run yet.
    pub fn load_pending(&self) -> bool {
        self.pending_load.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::ElementTransform;

    struct Fixture {
        _dir: tempfile::TempDir,
        controller: MapController,
        start: Instant,
    }

    fn fixture_with(config: MapConfig) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let persistence = PinPersistence::new(dir.path().join("map_pins_data.json"));
        let pan_zoom = PanZoomState::new(
            config.zoom_steps.clone(),
            Point::new(800.0, 600.0),
            Point::new(800.0, 600.0),
            config.drag_multiplier,
            5.0,
        )
        .unwrap();
        let start = Instant::now();
        let controller = MapController::new(pan_zoom, persistence, &config, start);
        Fixture {
            _dir: dir,
            controller,
            start,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MapConfig {
            auto_load_on_start: false,
            ..Default::default()
        })
    }

    fn drag_start(x: f32, y: f32) -> InputEvent {
        InputEvent::DragStart {
            pos: Point::new(x, y),
        }
    }

    fn drag_move(x: f32, y: f32) -> InputEvent {
        InputEvent::DragMove {
            pos: Point::new(x, y),
        }
    }

    fn pin_drag(id: PinId, x: f32, y: f32) -> InputEvent {
        InputEvent::PinDragMove {
            id,
            delta: Point::new(x, y),
        }
    }

    fn frame(controller: &MapController) -> ViewFrame {
        ViewFrame::overlay(Point::new(400.0, 300.0), controller.pan_zoom().map_transform())
    }

    #[test]
    fn test_place_pin_opens_edit_panel() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(450.0, 280.0), &frame);

        let pin = f.controller.pins().get(id).unwrap();
        assert!(pin.map_position.approx_eq(Point::new(50.0, -20.0), 1e-4));
        assert_eq!(f.controller.panel_mode(id), Some(PanelMode::Edit));
        assert_eq!(
            f.controller.drain_events(),
            vec![
                ViewEvent::PinCreated(id),
                ViewEvent::PanelOpened {
                    id,
                    mode: PanelMode::Edit,
                },
            ]
        );
    }

    #[test]
    fn test_place_pin_at_zoom_uses_map_coordinates() {
        let mut f = fixture();
        f.controller.zoom_in();
        f.controller.zoom_in(); // scale 2
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(500.0, 300.0), &frame);
        let pin = f.controller.pins().get(id).unwrap();
        assert!(pin.map_position.approx_eq(Point::new(50.0, 0.0), 1e-4));
    }

    #[test]
    fn test_fitted_map_keeps_map_units() {
        let mut f = fixture();
        f.controller.resize_viewport(Point::new(400.0, 300.0)); // fit 0.5
        let map = f.controller.pan_zoom().map_transform();
        let frame = ViewFrame::overlay(Point::new(200.0, 150.0), map);

        let id = f.controller.place_pin(Point::new(250.0, 150.0), &frame);
        let origin = f.controller.pins().get(id).unwrap().map_position;
        assert!(origin.approx_eq(Point::new(100.0, 0.0), 1e-4));

        let drag = pin_drag(id, 10.0, 0.0);
        f.controller.handle_input(drag, &frame);
        f.controller.handle_input(InputEvent::PinDragEnd { id }, &frame);
        let moved = f.controller.pins().get(id).unwrap().map_position;
        assert!(moved.approx_eq(Point::new(120.0, 0.0), 1e-4));
    }

    #[test]
    fn test_opening_second_panel_closes_first() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let a = f.controller.place_pin(Point::new(100.0, 100.0), &frame);
        let b = f.controller.place_pin(Point::new(200.0, 200.0), &frame);

        assert!(!f.controller.panels().is_open(a));
        assert!(f.controller.panels().is_open(b));
        assert!(f.controller.drain_events().contains(&ViewEvent::PanelClosed(a)));
    }

    #[test]
    fn test_pin_click_toggles_panel() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(100.0, 100.0), &frame);
        f.controller.on_save(id, "Ford", "shallow crossing");
        assert!(!f.controller.panels().is_open(id));

        f.controller.handle_input(InputEvent::PinClicked { id }, &frame);
        assert_eq!(f.controller.panel_mode(id), Some(PanelMode::View));
        f.controller.handle_input(InputEvent::PinClicked { id }, &frame);
        assert!(!f.controller.panels().is_open(id));
    }

    #[test]
    fn test_click_during_drag_is_ignored() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(100.0, 100.0), &frame);
        f.controller.on_close(id);

        let drag = pin_drag(id, 5.0, 0.0);
        f.controller.handle_input(drag, &frame);
        f.controller.handle_input(InputEvent::PinClicked { id }, &frame);
        assert!(!f.controller.panels().is_open(id));
    }

    #[test]
    fn test_pin_drag_commits_on_end() {
        let mut f = fixture();
        f.controller.zoom_in();
        f.controller.zoom_in(); // scale 2
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(400.0, 300.0), &frame);
        let origin = f.controller.pins().get(id).unwrap().map_position;

        let drag = pin_drag(id, 10.0, 4.0);
        f.controller.handle_input(drag, &frame);
        f.controller.handle_input(drag, &frame);

        // Store is untouched until the drag ends
        assert_eq!(f.controller.pins().get(id).unwrap().map_position, origin);
        let dragged = f.controller.pin_position(id).unwrap();
        assert!(dragged.approx_eq(origin + Point::new(10.0, 4.0), 1e-4));

        f.controller.handle_input(InputEvent::PinDragEnd { id }, &frame);
        let moved = f.controller.pins().get(id).unwrap().map_position;
        assert!(moved.approx_eq(origin + Point::new(10.0, 4.0), 1e-4));
    }

    #[test]
    fn test_map_drag_pans_when_zoomed() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        f.controller.set_screen_size(Point::new(800.0, 600.0));

        f.controller.handle_input(drag_start(100.0, 100.0), &frame);
        f.controller.handle_input(drag_move(150.0, 100.0), &frame);
        assert_eq!(f.controller.pan_zoom().offset(), Point::ZERO);

        f.controller.zoom_in();
        f.controller.zoom_in(); // scale 2
        f.controller.handle_input(drag_move(250.0, 100.0), &frame);
        assert!(f.controller.pan_zoom().offset().approx_eq(Point::new(50.0, 0.0), 1e-4));

        // Far outside the screen: position is tracked but nothing moves
        f.controller.handle_input(drag_move(900.0, 100.0), &frame);
        assert!(f.controller.pan_zoom().offset().approx_eq(Point::new(50.0, 0.0), 1e-4));

        f.controller.handle_input(InputEvent::DragEnd, &frame);
        f.controller.handle_input(drag_move(0.0, 0.0), &frame);
        assert!(f.controller.pan_zoom().offset().approx_eq(Point::new(50.0, 0.0), 1e-4));
    }

    #[test]
    fn test_scroll_emits_zoom_event() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        f.controller.handle_input(InputEvent::Scroll { delta_y: -3.0 }, &frame);
        assert!(f.controller.drain_events().is_empty());

        f.controller.handle_input(InputEvent::Scroll { delta_y: 3.0 }, &frame);
        assert_eq!(
            f.controller.drain_events(),
            vec![ViewEvent::ZoomChanged {
                index: 1,
                scale: 1.5,
            }]
        );
    }

    #[test]
    fn test_discard_removes_pin() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(10.0, 10.0), &frame);
        f.controller.drain_events();

        f.controller.discard(id);
        assert!(f.controller.pins().is_empty());
        assert_eq!(
            f.controller.drain_events(),
            vec![ViewEvent::PanelClosed(id), ViewEvent::PinRemoved(id)]
        );

        // Second discard is a no-op
        f.controller.discard(id);
        assert!(f.controller.drain_events().is_empty());
    }

    #[test]
    fn test_save_load_roundtrip_skips_unnamed() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let named = f.controller.place_pin(Point::new(420.0, 310.0), &frame);
        f.controller.on_save(named, "Mine", "abandoned");
        f.controller.place_pin(Point::new(100.0, 100.0), &frame);
        assert_eq!(f.controller.pins().len(), 2);

        assert_eq!(f.controller.save(f.start), PersistStatus::Saved { count: 1 });

        let path = f.controller.persistence.save_path().to_path_buf();
        let config = MapConfig {
            auto_load_on_start: false,
            ..Default::default()
        };
        let pan_zoom = f.controller.pan_zoom().clone();
        let mut other = Fixture {
            _dir: tempfile::tempdir().unwrap(),
            controller: MapController::new(pan_zoom, PinPersistence::new(path), &config, f.start),
            start: f.start,
        };

        assert_eq!(other.controller.load(), PersistStatus::Loaded { count: 1 });
        let pins = other.controller.pins().all();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].1.name, "Mine");
        assert!(pins[0].1.map_position.approx_eq(Point::new(20.0, 10.0), 1e-4));
    }

    #[test]
    fn test_load_replaces_existing_pins() {
        let mut f = fixture_with(MapConfig {
            auto_load_on_start: false,
            load_replaces: true,
            ..Default::default()
        });
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(400.0, 300.0), &frame);
        f.controller.on_save(id, "Saved", "");
        f.controller.save(f.start);
        f.controller.place_pin(Point::new(100.0, 100.0), &frame);
        assert_eq!(f.controller.pins().len(), 2);

        f.controller.load();
        assert_eq!(f.controller.pins().len(), 1);
        assert_eq!(f.controller.panels().open_count(), 0);
    }

    #[test]
    fn test_deferred_auto_load() {
        let mut f = fixture_with(MapConfig {
            auto_load_on_start: true,
            load_delay_secs: 2.0,
            ..Default::default()
        });
        assert!(f.controller.load_pending());

        f.controller.tick(f.start + Duration::from_secs(1));
        assert!(f.controller.load_pending());

        f.controller.tick(f.start + Duration::from_secs(2));
        assert!(!f.controller.load_pending());
        assert_eq!(f.controller.persist_status(), &PersistStatus::NoSaveFile);
    }

    #[test]
    fn test_auto_save_on_tick() {
        let mut f = fixture_with(MapConfig {
            auto_load_on_start: false,
            auto_save_interval_secs: 10.0,
            ..Default::default()
        });
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(400.0, 300.0), &frame);
        f.controller.on_save(id, "Depot", "");
        f.controller.drain_events();

        f.controller.tick(f.start + Duration::from_secs(5));
        assert!(f.controller.drain_events().is_empty());

        f.controller.tick(f.start + Duration::from_secs(10));
        assert_eq!(f.controller.drain_events(), vec![ViewEvent::Saved { count: 1 }]);
    }

    #[test]
    fn test_manual_save_postpones_auto_save() {
        let mut f = fixture_with(MapConfig {
            auto_load_on_start: false,
            auto_save_interval_secs: 10.0,
            ..Default::default()
        });
        f.controller.save(f.start + Duration::from_secs(10));
        f.controller.drain_events();

        f.controller.tick(f.start + Duration::from_secs(10));
        assert!(f.controller.drain_events().is_empty());
    }

    #[test]
    fn test_panel_anchor_follows_pin() {
        let mut f = fixture();
        let frame = frame(&f.controller);
        let id = f.controller.place_pin(Point::new(300.0, 200.0), &frame);
        let anchor = f.controller.panel_anchor(id, &frame).unwrap();
        assert!(anchor.approx_eq(Point::new(450.0, 200.0), 1e-3));
    }

    #[test]
    fn test_on_request_image_keeps_image_through_save() {
        let mut f = fixture();
        let frame = ViewFrame::overlay(Point::ZERO, ElementTransform::default());
        let id = f.controller.place_pin(Point::ZERO, &frame);
        f.controller.on_request_image(id, RgbaImage::new(3, 3));
        f.controller.on_save(id, "Bridge", "");

        let pin = f.controller.pins().get(id).unwrap();
        assert_eq!(pin.name, "Bridge");
        assert!(pin.image.is_some());
    }
}
