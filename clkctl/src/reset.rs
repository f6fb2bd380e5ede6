// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Block reset lines.

use crate::config::CONFIG;
use crate::desc::ResetDesc;
use crate::port::RegisterPort;

fn bit(desc: &ResetDesc) -> u32 {
    1 << desc.bit
}

pub(crate) fn assert(port: &dyn RegisterPort, desc: &ResetDesc) {
    port.update32(desc.offset, bit(desc), bit(desc));
}

pub(crate) fn deassert(port: &dyn RegisterPort, desc: &ResetDesc) {
    port.update32(desc.offset, bit(desc), 0);
}

/// Hold the block in reset for the configured time, then release it.
pub(crate) fn pulse(port: &dyn RegisterPort, desc: &ResetDesc) {
    assert(port, desc);
    port.delay_us(CONFIG.reset_hold_us);
    deassert(port, desc);
}

pub(crate) fn status(port: &dyn RegisterPort, desc: &ResetDesc) -> bool {
    port.read32(desc.offset) & bit(desc) != 0
}
