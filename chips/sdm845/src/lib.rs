// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock-controller tables for the Qualcomm SDM845 and its SDM670
//! derivative.
//!
//! Each controller is a `static` [`clkctl::desc::ControllerDesc`] to hand to
//! [`clkctl::ControllerBuilder`]. The SDM670 parts reuse the same tables and
//! select the `"sdm670"` variant at build time.

mod tables;
#[cfg(test)]
mod testing;

pub mod camcc;
pub mod dispcc;
pub mod gpucc;
pub mod vdd;

pub use camcc::CAM_CC;
pub use dispcc::DISP_CC;
pub use gpucc::GPU_CC;

/// Variant tag of the SDM670 fixups carried by every controller here.
pub const SDM670: &str = "sdm670";
