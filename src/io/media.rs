// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading and writing.
//!
//! Map images and pin images are decoded into RGBA buffers that can be
//! turned into egui textures; pin images are written back as PNG.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

/// Decode an image file into RGBA pixels.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("opening image {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// Write RGBA pixels as a PNG file.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing image {}", path.display()))?;
    Ok(())
}

/// Convert RGBA pixels into an egui image.
pub fn to_color_image(img: &RgbaImage) -> egui::ColorImage {
    let size = [img.width() as usize, img.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw())
}
