// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Regulator classes the SDM845 clock controllers vote on.
//!
//! CX and MX are shared by camcc, dispcc and gpucc, so a board builds one
//! handle per rail and passes clones of it to every controller.

use std::sync::Arc;

use clkctl::{Corner, RegulatorHandle, VoltageRail};

pub const VDD_CX: &str = "vdd_cx";
pub const VDD_MX: &str = "vdd_mx";
pub const VDD_GFX: &str = "vdd_gfx";

/// Levels of the CX and MX rails.
pub const CX_MX_LEVELS: &[Corner] = &[
    Corner::Min,
    Corner::Lower,
    Corner::Low,
    Corner::LowL1,
    Corner::Nominal,
    Corner::High,
];

/// Levels of the graphics rail.
pub const GX_LEVELS: &[Corner] = &[
    Corner::Min,
    Corner::Lower,
    Corner::Low,
    Corner::LowL1,
    Corner::Nominal,
    Corner::NominalL1,
    Corner::High,
    Corner::HighL1,
];

pub fn cx(rail: Arc<dyn VoltageRail>) -> RegulatorHandle {
    RegulatorHandle::new(VDD_CX, CX_MX_LEVELS, rail)
}

pub fn mx(rail: Arc<dyn VoltageRail>) -> RegulatorHandle {
    RegulatorHandle::new(VDD_MX, CX_MX_LEVELS, rail)
}

pub fn gfx(rail: Arc<dyn VoltageRail>) -> RegulatorHandle {
    RegulatorHandle::new(VDD_GFX, GX_LEVELS, rail)
}
