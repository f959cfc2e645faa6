// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map Pins - a zoomable map viewer with user-placed pins.
//!
//! Pins carry a name, a description and an optional image, and are kept in
//! a JSON save file between sessions.

mod app;
mod config;
mod controller;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::MapPinsApp;
use config::MapConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = MapConfig::load_or_default();
    let app = MapPinsApp::new(config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Map Pins"),
        ..Default::default()
    };

    eframe::run_native("Map Pins", options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
