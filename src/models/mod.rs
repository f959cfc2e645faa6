// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: pins, the pin store, view state and panel tracking.

pub mod pan_zoom;
pub mod panels;
pub mod pin;
pub mod pin_store;
