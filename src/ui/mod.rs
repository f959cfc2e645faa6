// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the map pins viewer.

pub mod map_view;
pub mod pin_panel;
pub mod toolbar;
