// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pin save file.
//!
//! Named pins are written to a single indented JSON document together with
//! a save timestamp and a format version. Pin images go to PNG files in a
//! per-save directory under a sibling `<save stem>_images` directory and are
//! referenced from the document by relative path.
//!
//! The file is overwritten in place; an interrupted write can leave a
//! corrupt save file, which the next load reports as malformed.

use crate::config::MapConfig;
use crate::io::media;
use crate::models::pin::Pin;
use crate::util::geometry::Point;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Version written into new save documents.
pub const SAVE_FORMAT_VERSION: &str = "1.0.0";

/// Major format version this build can read.
const SUPPORTED_MAJOR_VERSION: u64 = 1;

const SAVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_version() -> String {
    SAVE_FORMAT_VERSION.to_string()
}

/// On-disk save document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub pins: Vec<SerializablePin>,
    #[serde(default)]
    pub save_timestamp: i64,
    #[serde(default)]
    pub save_date: String,
    #[serde(default = "default_version")]
    pub version: String,
}

/// On-disk form of a single pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializablePin {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub map_position: Point,
    /// Image file relative to the save file's directory, empty if none
    #[serde(default)]
    pub image_path: String,
}

impl SaveDocument {
    /// Wrap pins in a document stamped with `now`.
    pub fn new(pins: Vec<SerializablePin>, now: DateTime<Utc>) -> Self {
        Self {
            pins,
            save_timestamp: now.timestamp(),
            save_date: now.format(SAVE_DATE_FORMAT).to_string(),
            version: SAVE_FORMAT_VERSION.to_string(),
        }
    }

    /// Parse and version-check a document.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SaveDocument = serde_json::from_str(json).context("malformed save document")?;
        check_version(&doc.version)?;
        Ok(doc)
    }
}

/// Accept any version with a supported major number.
fn check_version(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse::<u64>().ok())
        .with_context(|| format!("unreadable save format version '{}'", version))?;
    if major != SUPPORTED_MAJOR_VERSION {
        bail!(
            "unsupported save format version '{}' (expected {}.x)",
            version,
            SUPPORTED_MAJOR_VERSION
        );
    }
    Ok(())
}

/// Result of the most recent save-file operation, shown to the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PersistStatus {
    #[default]
    Idle,
    Saved { count: usize },
    Loaded { count: usize },
    NoSaveFile,
    Deleted,
    Failed(String),
}

impl PersistStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, PersistStatus::Failed(_))
    }
}

impl fmt::Display for PersistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistStatus::Idle => write!(f, "Not saved yet"),
            PersistStatus::Saved { count } => write!(f, "Saved {} pins", count),
            PersistStatus::Loaded { count } => write!(f, "Loaded {} pins", count),
            PersistStatus::NoSaveFile => write!(f, "No save file"),
            PersistStatus::Deleted => write!(f, "Save file deleted"),
            PersistStatus::Failed(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Summary of the save file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    pub pin_count: usize,
    pub save_date: String,
}

/// Reads and writes the pin save file.
#[derive(Debug)]
pub struct PinPersistence {
    save_path: PathBuf,
    status: PersistStatus,
}

impl PinPersistence {
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            status: PersistStatus::Idle,
        }
    }

    /// Resolve the save location from settings and make sure its directory
    /// exists.
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        let path = config
            .save_path()
            .context("cannot resolve a data directory for the save file")?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating save directory {}", dir.display()))?;
        }
        Ok(Self::new(path))
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn status(&self) -> &PersistStatus {
        &self.status
    }

    fn base_dir(&self) -> PathBuf {
        self.save_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Directory name for pin images, relative to the save file's directory.
    fn images_dir_name(&self) -> String {
        let stem = self
            .save_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pins".to_string());
        format!("{}_images", stem)
    }

    fn images_dir(&self) -> PathBuf {
        self.base_dir().join(self.images_dir_name())
    }

    /// Write named pins to disk, returning how many were saved.
    pub fn try_save<'a>(&self, pins: impl IntoIterator<Item = &'a Pin>) -> Result<usize> {
        self.save_with(pins, |path, json| std::fs::write(path, json))
    }

    /// Save, writing the document through `write_json`.
    ///
    /// Images of this save go to a fresh directory; those of earlier saves
    /// are removed only once the document is written, so a failed write
    /// leaves the previous save and its images usable.
    fn save_with<'a, W>(
        &self,
        pins: impl IntoIterator<Item = &'a Pin>,
        write_json: W,
    ) -> Result<usize>
    where
        W: FnOnce(&Path, &str) -> std::io::Result<()>,
    {
        let committed: Vec<&Pin> = pins.into_iter().filter(|pin| pin.is_committed()).collect();

        let mut generation = None;
        let mut serializable = Vec::with_capacity(committed.len());
        for (n, pin) in committed.iter().enumerate() {
            let image_path = match &pin.image {
                Some(img) => self.write_pin_image(&mut generation, n, img).unwrap_or_else(|e| {
                    log::warn!("Dropping image of pin '{}': {:#}", pin.name, e);
                    String::new()
                }),
                None => String::new(),
            };
            serializable.push(SerializablePin {
                name: pin.name.clone(),
                description: pin.description.clone(),
                map_position: pin.map_position,
                image_path,
            });
        }

        let doc = SaveDocument::new(serializable, Utc::now());
        let written = serde_json::to_string_pretty(&doc)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                write_json(&self.save_path, &json)
                    .with_context(|| format!("writing {}", self.save_path.display()))
            });
        if let Err(e) = written {
            if let Some(generation) = &generation {
                let dir = self.images_dir().join(generation);
                if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                    log::warn!("Could not remove unused images in {}: {}", dir.display(), cleanup);
                }
            }
            return Err(e);
        }

        self.remove_stale_images(generation.as_deref());
        Ok(committed.len())
    }

    /// Claim a new image directory name under the images directory.
    fn new_generation(&self) -> Result<String> {
        let root = self.images_dir();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating image directory {}", root.display()))?;

        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
        for attempt in 0..100u32 {
            let name = if attempt == 0 {
                stamp.clone()
            } else {
                format!("{}-{}", stamp, attempt)
            };
            match std::fs::create_dir(root.join(&name)) {
                Ok(()) => return Ok(name),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    let dir = root.join(&name);
                    return Err(e).with_context(|| format!("creating {}", dir.display()));
                }
            }
        }
        bail!("no free image directory name in {}", root.display())
    }

    fn write_pin_image(
        &self,
        generation: &mut Option<String>,
        n: usize,
        img: &image::RgbaImage,
    ) -> Result<String> {
        if generation.is_none() {
            *generation = Some(self.new_generation()?);
        }
        let generation = generation.as_deref().unwrap_or_default();
        let file_name = format!("pin_{}.png", n);
        media::save_png(img, &self.images_dir().join(generation).join(&file_name))?;
        Ok(format!("{}/{}/{}", self.images_dir_name(), generation, file_name))
    }

    /// Delete every image entry except the directory `keep`.
    fn remove_stale_images(&self, keep: Option<&str>) {
        let root = self.images_dir();
        let Ok(entries) = std::fs::read_dir(&root) else {
            return;
        };
        for entry in entries.flatten() {
            if keep.is_some_and(|keep| entry.file_name() == keep) {
                continue;
            }
            let path = entry.path();
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            if let Err(e) = removed {
                log::warn!("Could not remove old image {}: {}", path.display(), e);
            }
        }
        if keep.is_none() {
            // Only succeeds when empty
            let _ = std::fs::remove_dir(&root);
        }
    }

    /// Save named pins. Failures are logged and reported through the
    /// returned status instead of propagating.
    pub fn save<'a>(&mut self, pins: impl IntoIterator<Item = &'a Pin>) -> PersistStatus {
        self.status = match self.try_save(pins) {
            Ok(count) => {
                log::info!("Saved {} pins to {}", count, self.save_path.display());
                PersistStatus::Saved { count }
            }
            Err(e) => {
                log::error!("Failed to save pins: {:#}", e);
                PersistStatus::Failed(format!("save failed: {}", e))
            }
        };
        self.status.clone()
    }

    /// Read pins from disk. `Ok(None)` means there is no save file.
    pub fn try_load(&self) -> Result<Option<Vec<Pin>>> {
        if !self.save_path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.save_path)
            .with_context(|| format!("reading {}", self.save_path.display()))?;
        let doc = SaveDocument::from_json(&json)?;

        let base_dir = self.base_dir();
        let pins = doc
            .pins
            .into_iter()
            .filter(|p| !p.name.is_empty())
            .map(|p| {
                let image = if p.image_path.is_empty() {
                    None
                } else {
                    match media::load_image(&base_dir.join(&p.image_path)) {
                        Ok(img) => Some(img),
                        Err(e) => {
                            log::warn!("Image of pin '{}' not restored: {:#}", p.name, e);
                            None
                        }
                    }
                };
                Pin {
                    name: p.name,
                    description: p.description,
                    image,
                    map_position: p.map_position,
                }
            })
            .collect();
        Ok(Some(pins))
    }

    /// Load pins. A missing or unreadable save file yields no pins.
    pub fn load(&mut self) -> Vec<Pin> {
        let (pins, status) = match self.try_load() {
            Ok(Some(pins)) => {
                log::info!("Loaded {} pins from {}", pins.len(), self.save_path.display());
                let count = pins.len();
                (pins, PersistStatus::Loaded { count })
            }
            Ok(None) => {
                log::info!("Save file not found. No pins to load.");
                (Vec::new(), PersistStatus::NoSaveFile)
            }
            Err(e) => {
                log::error!("Failed to load pins: {:#}", e);
                (Vec::new(), PersistStatus::Failed(format!("load failed: {}", e)))
            }
        };
        self.status = status;
        pins
    }

    pub fn save_file_exists(&self) -> bool {
        self.save_path.exists()
    }

    /// Remove the save file and its images.
    pub fn delete_save_file(&mut self) -> PersistStatus {
        let result = (|| -> Result<()> {
            if self.save_path.exists() {
                std::fs::remove_file(&self.save_path)?;
            }
            let images_dir = self.images_dir();
            if images_dir.exists() {
                std::fs::remove_dir_all(&images_dir)?;
            }
            Ok(())
        })();

        self.status = match result {
            Ok(()) => {
                log::info!("Deleted save file: {}", self.save_path.display());
                PersistStatus::Deleted
            }
            Err(e) => {
                log::error!("Failed to delete save file: {:#}", e);
                PersistStatus::Failed(format!("delete failed: {}", e))
            }
        };
        self.status.clone()
    }

    /// Describe the save file, or `None` if it is missing or unreadable.
    pub fn save_file_info(&self) -> Option<SaveFileInfo> {
        let metadata = std::fs::metadata(&self.save_path).ok()?;
        let doc = std::fs::read_to_string(&self.save_path)
            .ok()
            .and_then(|json| serde_json::from_str::<SaveDocument>(&json).ok());

        Some(SaveFileInfo {
            path: self.save_path.clone(),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            pin_count: doc.as_ref().map_or(0, |d| d.pins.len()),
            save_date: doc
                .map(|d| d.save_date)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

/// Decides when the periodic auto-save runs.
///
/// Manual saves call [`AutoSaveTimer::mark`] too, so a manual save and an
/// auto-save falling in the same tick produce a single write.
#[derive(Debug, Clone)]
pub struct AutoSaveTimer {
    enabled: bool,
    interval: Duration,
    last: Instant,
}

impl AutoSaveTimer {
    pub fn new(enabled: bool, interval: Duration, now: Instant) -> Self {
        Self {
            enabled,
            interval,
            last: now,
        }
    }

    pub fn from_config(config: &MapConfig, now: Instant) -> Self {
        Self::new(config.auto_save, config.auto_save_interval(), now)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn due(&self, now: Instant) -> bool {
        self.enabled && now.saturating_duration_since(self.last) >= self.interval
    }

    /// Record that a save happened at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = now;
    }

    /// Time left until the next auto-save.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        Some(self.interval.saturating_sub(now.saturating_duration_since(self.last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn persistence(dir: &tempfile::TempDir) -> PinPersistence {
        PinPersistence::new(dir.path().join("map_pins_data.json"))
    }

    #[test]
    fn test_named_pin_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);

        let pin = Pin::new("Old Mill", "By the river", Point::new(-120.25, 48.5));
        assert_eq!(store.save([&pin]), PersistStatus::Saved { count: 1 });

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Old Mill");
        assert_eq!(loaded[0].description, "By the river");
        assert!(loaded[0].map_position.approx_eq(pin.map_position, 1e-4));
        assert_eq!(store.status(), &PersistStatus::Loaded { count: 1 });
    }

    #[test]
    fn test_unnamed_pins_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);

        let named = Pin::new("Well", "", Point::ZERO);
        let unnamed = Pin::at(Point::new(5.0, 5.0));
        assert_eq!(store.save([&named, &unnamed]), PersistStatus::Saved { count: 1 });

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Well");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        assert!(store.load().is_empty());
        assert_eq!(store.status(), &PersistStatus::NoSaveFile);
        assert!(store.save_file_info().is_none());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        std::fs::write(store.save_path(), "{ \"pins\": 12 }").unwrap();

        assert!(store.load().is_empty());
        assert!(store.status().is_failure());
    }

    #[test]
    fn test_load_unknown_major_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        let json = r#"{
            "pins": [{
                "name": "A",
                "description": "",
                "mapPosition": { "x": 1.0, "y": 2.0 },
                "imagePath": ""
            }],
            "saveTimestamp": 0,
            "saveDate": "",
            "version": "2.0.0"
        }"#;
        std::fs::write(store.save_path(), json).unwrap();

        assert!(store.load().is_empty());
        assert!(store.status().is_failure());
    }

    #[test]
    fn test_load_minor_version_and_missing_fields() {
        let json = r#"{
            "pins": [{ "name": "A", "mapPosition": { "x": 1.0, "y": 2.0 } }],
            "version": "1.4.2"
        }"#;
        let doc = SaveDocument::from_json(json).unwrap();
        assert_eq!(doc.pins[0].image_path, "");

        let no_version = r#"{ "pins": [] }"#;
        assert_eq!(SaveDocument::from_json(no_version).unwrap().version, SAVE_FORMAT_VERSION);
    }

    #[test]
    fn test_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        store.save([&Pin::new("Tower", "tall", Point::new(1.5, -2.0))]);

        let json = std::fs::read_to_string(store.save_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["pins"][0]["mapPosition"]["x"], 1.5);
        assert_eq!(value["pins"][0]["imagePath"], "");
        assert!(value["saveTimestamp"].is_i64());

        let date = value["saveDate"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(date, SAVE_DATE_FORMAT).is_ok());
    }

    #[test]
    fn test_image_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);

        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 1, image::Rgba([200, 100, 50, 255]));
        let pin = Pin {
            image: Some(img.clone()),
            ..Pin::new("Statue", "", Point::ZERO)
        };
        store.save([&pin]);

        let json = std::fs::read_to_string(store.save_path()).unwrap();
        let doc = SaveDocument::from_json(&json).unwrap();
        let image_path = &doc.pins[0].image_path;
        assert!(image_path.starts_with("map_pins_data_images/"));
        assert!(image_path.ends_with("/pin_0.png"));
        assert!(dir.path().join(image_path).exists());

        let loaded = store.load();
        assert_eq!(loaded[0].image.as_ref(), Some(&img));
    }

    fn image_pin(name: &str, shade: u8) -> Pin {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(1, 1, image::Rgba([shade, shade, shade, 255]));
        Pin {
            image: Some(img),
            ..Pin::new(name, "", Point::ZERO)
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        let first = image_pin("Tower", 10);
        store.save([&first]);

        let second = image_pin("Bridge", 200);
        let result = store.save_with([&second], |_, _| Err(std::io::Error::other("disk full")));
        assert!(result.is_err());

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Tower");
        assert_eq!(loaded[0].image, first.image);

        // Images of the failed save are cleaned up
        let dirs = std::fs::read_dir(dir.path().join("map_pins_data_images")).unwrap().count();
        assert_eq!(dirs, 1);
    }

    #[test]
    fn test_resave_removes_old_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        store.save([&image_pin("Tower", 10)]);
        let bridge = image_pin("Bridge", 200);
        store.save([&bridge]);

        let dirs = std::fs::read_dir(dir.path().join("map_pins_data_images")).unwrap().count();
        assert_eq!(dirs, 1);
        assert_eq!(store.load()[0].image, bridge.image);

        store.save([&Pin::new("Plain", "", Point::ZERO)]);
        assert!(!dir.path().join("map_pins_data_images").exists());
    }

    #[test]
    fn test_missing_image_keeps_pin() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        let pin = Pin {
            image: Some(RgbaImage::new(1, 1)),
            ..Pin::new("Gate", "", Point::ZERO)
        };
        store.save([&pin]);
        std::fs::remove_dir_all(dir.path().join("map_pins_data_images")).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].image.is_none());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        store.save([&Pin::new("A", "", Point::ZERO), &Pin::new("B", "", Point::ZERO)]);
        store.save([&Pin::new("C", "", Point::ZERO)]);

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "C");
    }

    #[test]
    fn test_save_into_missing_directory_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PinPersistence::new(dir.path().join("missing/dir/pins.json"));
        let status = store.save([&Pin::new("A", "", Point::ZERO)]);
        assert!(status.is_failure());
    }

    #[test]
    fn test_save_file_info_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = persistence(&dir);
        store.save([&Pin::new("A", "", Point::ZERO), &Pin::new("B", "", Point::ZERO)]);

        let info = store.save_file_info().unwrap();
        assert_eq!(info.pin_count, 2);
        assert!(info.size_bytes > 0);
        assert_ne!(info.save_date, "Unknown");

        assert_eq!(store.delete_save_file(), PersistStatus::Deleted);
        assert!(!store.save_file_exists());
    }

    #[test]
    fn test_auto_save_timer() {
        let start = Instant::now();
        let mut timer = AutoSaveTimer::new(true, Duration::from_secs(30), start);
        assert!(!timer.due(start + Duration::from_secs(29)));
        assert!(timer.due(start + Duration::from_secs(30)));

        // A manual save resets the interval
        timer.mark(start + Duration::from_secs(30));
        assert!(!timer.due(start + Duration::from_secs(30)));
        assert_eq!(timer.remaining(start + Duration::from_secs(40)), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_disabled_timer_never_due() {
        let start = Instant::now();
        let timer = AutoSaveTimer::new(false, Duration::from_secs(1), start);
        assert!(!timer.due(start + Duration::from_secs(100)));
        assert_eq!(timer.remaining(start), None);
    }
}
