// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Globally distributed switch controller (power domain).
//!
//! Powering a domain means releasing its IO clamp, clearing `SW_COLLAPSE`
//! and waiting for the power-up status. Collapsing runs the same steps in
//! reverse, optionally keeping flip-flop state with `RETAIN_FF_ENABLE`.

use crate::config::CONFIG;
use crate::desc::{GdscControl, GdscDesc, PowerStates};
use crate::error::{ClockError, Result};
use crate::port::RegisterPort;
use crate::registers::{CfgGdscrVal, GdscrVal, CFG_GDSCR, CFG_GDSCR_OFFSET, CLAMP_IO, GDSCR};
use crate::state::PowerState;

/// How a requested power transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Confirm {
    Confirmed,
    /// A hardware-retained domain did not report the new state in time. The
    /// request stands; the hardware state machine finishes it.
    Deferred { offset: u32, last: u32 },
}

pub(crate) fn read_state(port: &dyn RegisterPort, desc: &GdscDesc) -> PowerState {
    let gdscr = GdscrVal::new(port.read32(desc.gdscr));
    if is_on(port, desc) {
        PowerState::On
    } else if gdscr.is_set(GDSCR::RETAIN_FF_ENABLE) {
        PowerState::Retained
    } else {
        PowerState::Off
    }
}

fn is_on(port: &dyn RegisterPort, desc: &GdscDesc) -> bool {
    if let Some(status) = desc.status_reg {
        GdscrVal::new(port.read32(status)).is_set(GDSCR::PWR_ON)
    } else if desc.poll_cfg {
        CfgGdscrVal::new(port.read32(desc.gdscr + CFG_GDSCR_OFFSET))
            .is_set(CFG_GDSCR::POWER_UP_COMPLETE)
    } else {
        GdscrVal::new(port.read32(desc.gdscr)).is_set(GDSCR::PWR_ON)
    }
}

pub(crate) fn enable(
    port: &dyn RegisterPort,
    desc: &GdscDesc,
    node: &'static str,
) -> Result<Confirm> {
    if let Some(clamp) = desc.clamp_io_ctrl {
        port.update32(clamp, CLAMP_IO::CLAMP::SET.value, 0);
    }
    port.update32(desc.gdscr, GDSCR::SW_COLLAPSE::SET.value, 0);
    let confirm = wait(port, desc, node, true)?;
    if desc.hw_ctrl {
        let hw = GDSCR::HW_CONTROL::SET.value;
        port.update32(desc.gdscr, hw, hw);
    }
    Ok(confirm)
}

/// Collapse the domain and return the state it is left in.
pub(crate) fn disable(
    port: &dyn RegisterPort,
    desc: &GdscDesc,
    node: &'static str,
) -> Result<(PowerState, Confirm)> {
    if desc.hw_ctrl {
        port.update32(desc.gdscr, GDSCR::HW_CONTROL::SET.value, 0);
    }
    let state = match desc.pwrsts {
        PowerStates::OffOnRetain => {
            let retain = GDSCR::RETAIN_FF_ENABLE::SET.value;
            port.update32(desc.gdscr, retain, retain);
            PowerState::Retained
        }
        PowerStates::OffOn => PowerState::Off,
    };
    let collapse = GDSCR::SW_COLLAPSE::SET.value;
    port.update32(desc.gdscr, collapse, collapse);

    let confirm = if desc.votable {
        Confirm::Confirmed
    } else {
        wait(port, desc, node, false)?
    };
    if let Some(clamp) = desc.clamp_io_ctrl {
        let bit = CLAMP_IO::CLAMP::SET.value;
        port.update32(clamp, bit, bit);
    }
    Ok((state, confirm))
}

fn wait(port: &dyn RegisterPort, desc: &GdscDesc, node: &'static str, on: bool) -> Result<Confirm> {
    let pwr_on = GDSCR::PWR_ON::SET.value;
    let (offset, mask, expected) = match (desc.status_reg, desc.poll_cfg) {
        (Some(status), _) => (status, pwr_on, if on { pwr_on } else { 0 }),
        (None, true) => {
            let bit = if on {
                CFG_GDSCR::POWER_UP_COMPLETE::SET.value
            } else {
                CFG_GDSCR::POWER_DOWN_COMPLETE::SET.value
            };
            (desc.gdscr + CFG_GDSCR_OFFSET, bit, bit)
        }
        (None, false) => (desc.gdscr, pwr_on, if on { pwr_on } else { 0 }),
    };

    match port.poll32(offset, mask, expected, CONFIG.gdsc_timeout) {
        Ok(()) => Ok(Confirm::Confirmed),
        Err(timeout) if desc.control == GdscControl::HardwareRetained => Ok(Confirm::Deferred {
            offset,
            last: timeout.last,
        }),
        Err(timeout) => Err(ClockError::EnableTimeout {
            node,
            offset,
            last: timeout.last,
        }),
    }
}
