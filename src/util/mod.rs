// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry and coordinate conversion helpers.

pub mod geometry;
pub mod transform;
