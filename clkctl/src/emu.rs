// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Emulated register port.
//!
//! [`EmulatedPort`] backs a controller with a sparse register file and a
//! small model of each hardware block in the controller description, so the
//! status bits the engine polls respond to its writes:
//!
//! - a branch's `CLK_OFF` tracks its enable bits,
//! - `CMD_RCGR.UPDATE` self-clears and `ROOT_OFF` tracks `ROOT_EN`,
//! - a Fabia PLL reports `LOCK_DET` while it is out of reset in RUN mode and
//!   acknowledges `UPDATE` at once,
//! - a GDSC's power status follows `SW_COLLAPSE`.
//!
//! Bits can be stuck with [`EmulatedPort::stick`] to provoke timeouts. Every
//! write is appended to a [`Trace`] that can be shared with
//! [`EmulatedRail`]s, giving one global order of register writes and
//! regulator commits.

use core::time::Duration;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::corner::{Corner, VoltageRail};
use crate::desc::{ControllerDesc, HaltCheck, NodeKind};
use crate::port::{PollTimeout, RegisterPort};
use crate::registers::{pll, rcg, CFG_GDSCR_OFFSET};
use crate::registers::{CBCR, CFG_GDSCR, CMD_RCGR, GDSCR, PLL_MODE, PLL_OPMODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEntry {
    Write { offset: u32, value: u32 },
    Corner { rail: &'static str, corner: Corner },
}

/// Shared, ordered journal of register writes and rail changes.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<TraceEntry>>>);

impl Trace {
    pub fn new() -> Trace {
        Trace::default()
    }

    pub fn push(&self, entry: TraceEntry) {
        self.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<TraceEntry> {
        self.lock().clone()
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                TraceEntry::Write { offset, value } => Some((*offset, *value)),
                TraceEntry::Corner { .. } => None,
            })
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEntry>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
enum Block {
    Branch { enable_reg: u32, enable_mask: u32, halt_reg: u32 },
    Rcg { cmd: u32 },
    Pll { base: u32 },
    Gdsc { gdscr: u32, status_reg: Option<u32> },
}

#[derive(Debug, Default)]
struct Registers {
    values: BTreeMap<u32, u32>,
    blocks: Vec<Block>,
    /// offset -> (mask, value) forced on every read.
    stuck: BTreeMap<u32, (u32, u32)>,
}

impl Registers {
    fn get(&self, offset: u32) -> u32 {
        let value = self.values.get(&offset).copied().unwrap_or(0);
        match self.stuck.get(&offset) {
            Some((mask, forced)) => (value & !mask) | (forced & mask),
            None => value,
        }
    }

    fn set_bits(&mut self, offset: u32, bits: u32, on: bool) {
        let value = self.values.entry(offset).or_insert(0);
        if on {
            *value |= bits;
        } else {
            *value &= !bits;
        }
    }

    /// Let every modeled block react to the current register values.
    fn settle(&mut self) {
        for block in self.blocks.clone() {
            match block {
                Block::Branch {
                    enable_reg,
                    enable_mask,
                    halt_reg,
                } => {
                    let on = self.get(enable_reg) & enable_mask != 0;
                    self.set_bits(halt_reg, CBCR::CLK_OFF::SET.value, !on);
                }
                Block::Rcg { cmd } => {
                    let root_en = self.get(cmd) & CMD_RCGR::ROOT_EN::SET.value != 0;
                    self.set_bits(cmd, CMD_RCGR::UPDATE::SET.value, false);
                    self.set_bits(cmd, CMD_RCGR::ROOT_OFF::SET.value, !root_en);
                }
                Block::Pll { base } => {
                    let mode = self.get(base + pll::MODE);
                    let running = self.get(base + pll::OPMODE) == PLL_OPMODE::MODE::Run.value;
                    let locked = running && mode & PLL_MODE::RESET_N::SET.value != 0;
                    self.set_bits(base + pll::MODE, PLL_MODE::UPDATE::SET.value, false);
                    self.set_bits(base + pll::MODE, PLL_MODE::LOCK_DET::SET.value, locked);
                }
                Block::Gdsc { gdscr, status_reg } => {
                    let on = self.get(gdscr) & GDSCR::SW_COLLAPSE::SET.value == 0;
                    let cfg = gdscr + CFG_GDSCR_OFFSET;
                    self.set_bits(gdscr, GDSCR::PWR_ON::SET.value, on);
                    self.set_bits(cfg, CFG_GDSCR::POWER_UP_COMPLETE::SET.value, on);
                    self.set_bits(cfg, CFG_GDSCR::POWER_DOWN_COMPLETE::SET.value, !on);
                    if let Some(status) = status_reg {
                        self.set_bits(status, GDSCR::PWR_ON::SET.value, on);
                    }
                }
            }
        }
    }
}

/// In-memory register window for tests and bring-up.
#[derive(Debug, Default)]
pub struct EmulatedPort {
    registers: Mutex<Registers>,
    trace: Trace,
}

impl EmulatedPort {
    /// A bare register file with no hardware model.
    pub fn new() -> EmulatedPort {
        EmulatedPort::default()
    }

    /// A register file modeling every block of `desc`, in reset state: all
    /// branches gated, all domains collapsed and all PLLs in standby.
    pub fn for_controller(desc: &ControllerDesc) -> EmulatedPort {
        EmulatedPort::with_trace(desc, Trace::new())
    }

    /// Like [`for_controller`](EmulatedPort::for_controller), journaling into
    /// an existing trace.
    pub fn with_trace(desc: &ControllerDesc, trace: Trace) -> EmulatedPort {
        let mut registers = Registers::default();
        for node in desc.nodes {
            match &node.kind {
                NodeKind::Branch(branch) => {
                    if matches!(branch.halt_check, HaltCheck::Halt | HaltCheck::HaltVoted) {
                        registers.blocks.push(Block::Branch {
                            enable_reg: branch.enable_reg,
                            enable_mask: branch.enable_mask,
                            halt_reg: branch.halt_reg,
                        });
                    }
                }
                NodeKind::Rcg(desc) => registers.blocks.push(Block::Rcg {
                    cmd: desc.cmd_rcgr + rcg::CMD,
                }),
                NodeKind::Pll(desc) => registers.blocks.push(Block::Pll { base: desc.offset }),
                NodeKind::PowerDomain(desc) => {
                    registers.set_bits(desc.gdscr, GDSCR::SW_COLLAPSE::SET.value, true);
                    registers.blocks.push(Block::Gdsc {
                        gdscr: desc.gdscr,
                        status_reg: desc.status_reg,
                    });
                }
                _ => {}
            }
        }
        registers.settle();
        EmulatedPort {
            registers: Mutex::new(registers),
            trace,
        }
    }

    pub fn trace(&self) -> Trace {
        self.trace.clone()
    }

    /// Preset a register without journaling the write.
    pub fn preset(&self, offset: u32, value: u32) {
        let mut registers = self.lock();
        registers.values.insert(offset, value);
        registers.settle();
    }

    /// Force the bits in `mask` to read as `value` until [`unstick`].
    ///
    /// [`unstick`]: EmulatedPort::unstick
    pub fn stick(&self, offset: u32, mask: u32, value: u32) {
        self.lock().stuck.insert(offset, (mask, value));
    }

    pub fn unstick(&self, offset: u32) {
        self.lock().stuck.remove(&offset);
    }

    fn lock(&self) -> MutexGuard<'_, Registers> {
        self.registers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegisterPort for EmulatedPort {
    fn read32(&self, offset: u32) -> u32 {
        self.lock().get(offset)
    }

    fn write32(&self, offset: u32, value: u32) {
        self.trace.push(TraceEntry::Write { offset, value });
        let mut registers = self.lock();
        registers.values.insert(offset, value);
        registers.settle();
    }

    fn poll32(
        &self,
        offset: u32,
        mask: u32,
        expected: u32,
        _timeout: Duration,
    ) -> Result<(), PollTimeout> {
        // The model settles on every write, so there is nothing to wait for.
        let last = self.read32(offset);
        if last & mask == expected {
            Ok(())
        } else {
            Err(PollTimeout { last })
        }
    }

    fn delay_us(&self, _us: u32) {}
}

/// Voltage rail that journals every corner change.
#[derive(Debug)]
pub struct EmulatedRail {
    name: &'static str,
    trace: Trace,
    refuse: Mutex<bool>,
}

impl EmulatedRail {
    pub fn new(name: &'static str, trace: Trace) -> EmulatedRail {
        EmulatedRail {
            name,
            trace,
            refuse: Mutex::new(false),
        }
    }

    /// Make subsequent corner changes fail.
    pub fn refuse(&self, refuse: bool) {
        *self.refuse.lock().unwrap_or_else(PoisonError::into_inner) = refuse;
    }
}

impl VoltageRail for EmulatedRail {
    fn set_corner(&self, corner: Corner) -> core::result::Result<(), ()> {
        if *self.refuse.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(());
        }
        self.trace.push(TraceEntry::Corner {
            rail: self.name,
            corner,
        });
        Ok(())
    }
}
