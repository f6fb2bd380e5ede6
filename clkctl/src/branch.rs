// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Branch clock gates.
//!
//! A branch is ungated by setting its enable bit. Where the block has a
//! usable `CLK_OFF` status bit, the transition is only complete once that bit
//! agrees; see [`HaltCheck`] for the variants.

use crate::config::CONFIG;
use crate::desc::{BranchDesc, HaltCheck};
use crate::error::{ClockError, Result};
use crate::port::RegisterPort;
use crate::registers::{CbcrVal, CBCR};
use crate::state::BranchState;

/// Decode the gate state from the enable bit and `CLK_OFF`.
pub(crate) fn read_state(port: &dyn RegisterPort, desc: &BranchDesc) -> BranchState {
    let enabled = port.read32(desc.enable_reg) & desc.enable_mask != 0;
    let off = match desc.halt_check {
        HaltCheck::Halt | HaltCheck::HaltVoted => {
            CbcrVal::new(port.read32(desc.halt_reg)).is_set(CBCR::CLK_OFF)
        }
        HaltCheck::Delay | HaltCheck::Skip => !enabled,
    };
    match (enabled, off) {
        (false, true) => BranchState::Gated,
        (true, false) => BranchState::Ungated,
        (true, true) => BranchState::PendingHaltClear,
        (false, false) => BranchState::PendingHaltSet,
    }
}

pub(crate) fn enable(port: &dyn RegisterPort, desc: &BranchDesc, node: &'static str) -> Result<()> {
    port.update32(desc.enable_reg, desc.enable_mask, desc.enable_mask);
    wait(port, desc, node, true)
}

pub(crate) fn disable(
    port: &dyn RegisterPort,
    desc: &BranchDesc,
    node: &'static str,
) -> Result<()> {
    port.update32(desc.enable_reg, desc.enable_mask, 0);
    wait(port, desc, node, false)
}

fn wait(
    port: &dyn RegisterPort,
    desc: &BranchDesc,
    node: &'static str,
    enabling: bool,
) -> Result<()> {
    match desc.halt_check {
        HaltCheck::Skip => Ok(()),
        HaltCheck::Delay => {
            port.delay_us(CONFIG.branch_delay_us);
            Ok(())
        }
        // Another master may still hold the clock on.
        HaltCheck::HaltVoted if !enabling => Ok(()),
        HaltCheck::Halt | HaltCheck::HaltVoted => {
            let off = CBCR::CLK_OFF::SET.value;
            let expected = if enabling { 0 } else { off };
            port.poll32(desc.halt_reg, off, expected, CONFIG.branch_halt_timeout)
                .map_err(|timeout| ClockError::EnableTimeout {
                    node,
                    offset: desc.halt_reg,
                    last: timeout.last,
                })
        }
    }
}
