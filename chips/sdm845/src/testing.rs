// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Emulated rails for the controller tests.

use std::sync::Arc;

use clkctl::emu::{EmulatedRail, Trace};
use clkctl::RegulatorHandle;

use crate::vdd;

/// One handle per rail, each journaling corner changes into `trace`.
pub(crate) struct Rails {
    pub(crate) cx: RegulatorHandle,
    pub(crate) mx: RegulatorHandle,
    pub(crate) gfx: RegulatorHandle,
}

impl Rails {
    pub(crate) fn new(trace: Trace) -> Rails {
        Rails {
            cx: vdd::cx(Arc::new(EmulatedRail::new(vdd::VDD_CX, trace.clone()))),
            mx: vdd::mx(Arc::new(EmulatedRail::new(vdd::VDD_MX, trace.clone()))),
            gfx: vdd::gfx(Arc::new(EmulatedRail::new(vdd::VDD_GFX, trace))),
        }
    }
}
