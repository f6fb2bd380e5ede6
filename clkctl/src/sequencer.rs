// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Enable/disable sequencing.
//!
//! Enables are reference counted per node. The first enable of a node takes
//! a reference on its selected parent before the node's own hardware
//! transition; the last disable runs the node's transition first and then
//! releases the parent. A node remembers whether it holds its parent
//! reference, so a transition retried after a timeout never takes a second
//! one.

use crate::controller::Ctx;
use crate::debug::ClockEvent;
use crate::error::{ClockError, Result};
use crate::gdsc::Confirm;
use crate::graph::{Kind, NodeId};
use crate::state::{BranchState, PowerState, Setting};
use crate::{branch, gdsc, pll, rcg};

impl<'a> Ctx<'a> {
    pub(crate) fn enable(&mut self, id: NodeId) -> Result<()> {
        if self.rt.get(id).refcount > 0 {
            self.rt.get_mut(id).refcount += 1;
            return Ok(());
        }

        if !self.rt.get(id).parent_held {
            if let Some(parent) = self.rt.parent_of(self.graph, id) {
                self.enable(parent)?;
                self.rt.get_mut(id).parent_held = true;
            }
        }

        // On failure the refcount stays at zero, but the parent reference is
        // kept for the retry.
        if let Err(err) = self.hw_enable(id) {
            self.note_timeout(id, &err);
            return Err(err);
        }
        let state = self.rt.get_mut(id);
        state.refcount = 1;
        state.disable_pending = false;
        let event = ClockEvent::Enabled {
            controller: self.controller,
            node: self.name(id),
        };
        self.emit(event);
        Ok(())
    }

    pub(crate) fn disable(&mut self, id: NodeId) -> Result<()> {
        let (refcount, pending) = {
            let state = self.rt.get(id);
            (state.refcount, state.disable_pending)
        };
        match refcount {
            // A gate that never confirmed may be retried.
            0 if pending => {}
            0 => return Err(ClockError::NotEnabled { node: self.name(id) }),
            1 => self.rt.get_mut(id).refcount = 0,
            _ => {
                self.rt.get_mut(id).refcount -= 1;
                return Ok(());
            }
        }

        if let Err(err) = self.hw_disable(id) {
            self.rt.get_mut(id).disable_pending = true;
            self.note_timeout(id, &err);
            return Err(err);
        }
        self.rt.get_mut(id).disable_pending = false;
        let event = ClockEvent::Disabled {
            controller: self.controller,
            node: self.name(id),
        };
        self.emit(event);

        if self.rt.get(id).parent_held {
            self.rt.get_mut(id).parent_held = false;
            if let Some(parent) = self.rt.parent_of(self.graph, id) {
                self.disable(parent)?;
            }
        }
        Ok(())
    }

    fn hw_enable(&mut self, id: NodeId) -> Result<()> {
        let graph = self.graph;
        let port = self.port;
        let node = graph.node(id);
        match &node.kind {
            Kind::Pll { desc, .. } => pll::enable(port, desc, node.name),
            Kind::Rcg { desc, .. } => {
                if self.rt.get(id).needs_restore() {
                    self.unpark(id)?;
                }
                if desc.force_enable {
                    rcg::force_enable(port, desc, node.name)?;
                }
                Ok(())
            }
            Kind::Branch { desc, parent } => {
                if let Some(parent) = *parent {
                    if self.rt.get(parent).needs_restore() {
                        self.unpark(parent)?;
                    }
                }
                let result = branch::enable(port, desc, node.name);
                self.rt.get_mut(id).branch = match result {
                    Ok(()) => BranchState::Ungated,
                    Err(_) => BranchState::PendingHaltClear,
                };
                result
            }
            Kind::PowerDomain { desc, .. } => {
                let confirm = gdsc::enable(port, desc, node.name)?;
                self.rt.get_mut(id).power = PowerState::On;
                self.note_deferred(id, confirm);
                Ok(())
            }
            Kind::Fixed { .. }
            | Kind::PostDiv { .. }
            | Kind::FixedFactor { .. }
            | Kind::Divider { .. } => Ok(()),
        }
    }

    fn hw_disable(&mut self, id: NodeId) -> Result<()> {
        let graph = self.graph;
        let port = self.port;
        let node = graph.node(id);
        match &node.kind {
            Kind::Pll { desc, .. } => {
                pll::disable(port, desc);
                Ok(())
            }
            Kind::Rcg { desc, .. } => {
                if desc.safe_config && !self.rt.get(id).parked {
                    self.park(id)?;
                }
                if desc.force_enable {
                    rcg::force_disable(port, desc);
                }
                Ok(())
            }
            Kind::Branch { desc, parent } => {
                if let Some(parent) = *parent {
                    if desc.park_parent_on_disable && self.last_consumer_of(parent) {
                        self.park(parent)?;
                    }
                }
                let result = branch::disable(port, desc, node.name);
                self.rt.get_mut(id).branch = match result {
                    Ok(()) => BranchState::Gated,
                    Err(_) => BranchState::PendingHaltSet,
                };
                result
            }
            Kind::PowerDomain { desc, .. } => {
                let (state, confirm) = gdsc::disable(port, desc, node.name)?;
                self.rt.get_mut(id).power = state;
                self.note_deferred(id, confirm);
                Ok(())
            }
            Kind::Fixed { .. }
            | Kind::PostDiv { .. }
            | Kind::FixedFactor { .. }
            | Kind::Divider { .. } => Ok(()),
        }
    }

    /// Whether `parent` is an unparked RCG held only by the consumer being
    /// disabled.
    fn last_consumer_of(&self, parent: NodeId) -> bool {
        let state = self.rt.get(parent);
        matches!(self.graph.node(parent).kind, Kind::Rcg { .. })
            && state.refcount == 1
            && !state.parked
    }

    fn park(&mut self, id: NodeId) -> Result<()> {
        let graph = self.graph;
        let Kind::Rcg { desc, .. } = &graph.node(id).kind else {
            return Ok(());
        };
        // Even a timed-out switch may have reached the safe source, so the
        // stored setting is restored on the next enable either way.
        self.rt.get_mut(id).parked = true;
        rcg::park(self.port, desc)?;
        let event = ClockEvent::Parked {
            controller: self.controller,
            node: self.name(id),
        };
        self.emit(event);
        Ok(())
    }

    fn unpark(&mut self, id: NodeId) -> Result<()> {
        let graph = self.graph;
        let (Kind::Rcg { desc, .. }, Setting::Rcg(setting)) =
            (&graph.node(id).kind, self.rt.get(id).setting)
        else {
            return Ok(());
        };
        rcg::configure(self.port, desc, &setting)?;
        let state = self.rt.get_mut(id);
        state.parked = false;
        state.stranded = false;
        let event = ClockEvent::Unparked {
            controller: self.controller,
            node: self.name(id),
        };
        self.emit(event);
        Ok(())
    }

    fn note_deferred(&mut self, id: NodeId, confirm: Confirm) {
        if let Confirm::Deferred { offset, last } = confirm {
            let event = ClockEvent::HardwareRetained {
                controller: self.controller,
                node: self.name(id),
                offset,
                last,
            };
            self.emit(event);
        }
    }

    /// Gate unreferenced branches, then collapse unreferenced domains.
    ///
    /// Every candidate is tried; the first failure is returned.
    pub(crate) fn sync_state(&mut self) -> Result<()> {
        let graph = self.graph;
        let mut first_err = None;

        let branches = graph.order.iter().rev().filter(|id| {
            let state = self.rt.get(**id);
            matches!(graph.node(**id).kind, Kind::Branch { .. })
                && state.refcount == 0
                && state.branch != BranchState::Gated
        });
        let domains = graph.order.iter().rev().filter(|id| {
            let state = self.rt.get(**id);
            graph.node(**id).is_domain() && state.refcount == 0 && state.power == PowerState::On
        });
        let unused: Vec<NodeId> = branches.chain(domains).copied().collect();

        for id in unused {
            match self.hw_disable(id) {
                Ok(()) => {
                    let event = ClockEvent::Disabled {
                        controller: self.controller,
                        node: self.name(id),
                    };
                    self.emit(event);
                }
                Err(err) => {
                    self.note_timeout(id, &err);
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::corner::RegulatorHandle;
    use crate::debug::ClockEvent;
    use crate::emu::{EmulatedPort, EmulatedRail};
    use crate::error::ClockError;
    use crate::port::RegisterPort;
    use crate::registers::{pll, rcg};
    use crate::state::{BranchState, PowerState};
    use crate::testing::*;

    const CLK_OFF: u32 = 1 << 31;
    const PWR_ON: u32 = 1 << 31;

    #[test]
    fn test_enable_walks_parents_first() {
        let rig = rig();
        let core = rig.cc.lookup("core_clk_src").unwrap();
        let branch = rig.cc.lookup("core_clk").unwrap();
        let pll0 = rig.cc.lookup("pll0").unwrap();
        rig.cc.set_rate(core, 200_000_000).unwrap();

        rig.trace.clear();
        rig.cc.enable(branch).unwrap();
        let writes = rig.trace.writes();
        let pll_done = writes
            .iter()
            .rposition(|(offset, _)| *offset < pll::SIZE)
            .unwrap();
        let gate = writes
            .iter()
            .position(|(offset, _)| *offset == CORE_CBCR)
            .unwrap();
        assert!(pll_done < gate);
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::Ungated));
        assert_eq!(rig.cc.enable_count(pll0), Ok(1));
        assert_eq!(rig.cc.is_enabled(core), Ok(true));

        rig.trace.clear();
        rig.cc.enable(branch).unwrap();
        assert_eq!(rig.cc.enable_count(branch), Ok(2));
        assert!(rig.trace.writes().is_empty());

        rig.cc.disable(branch).unwrap();
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::Ungated));
        rig.cc.disable(branch).unwrap();
        let writes = rig.trace.writes();
        let gate = writes
            .iter()
            .position(|(offset, _)| *offset == CORE_CBCR)
            .unwrap();
        let standby = writes
            .iter()
            .position(|write| *write == (pll::OPMODE, 0))
            .unwrap();
        assert!(gate < standby);
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::Gated));
        assert_eq!(rig.cc.is_enabled(pll0), Ok(false));

        assert_eq!(
            rig.cc.disable(branch),
            Err(ClockError::NotEnabled { node: "core_clk" })
        );
    }

    #[test]
    fn test_branch_timeouts_leave_pending_states() {
        let rig = rig();
        let core = rig.cc.lookup("core_clk_src").unwrap();
        let branch = rig.cc.lookup("core_clk").unwrap();

        rig.port.stick(CORE_CBCR, CLK_OFF, CLK_OFF);
        let timeout = ClockError::EnableTimeout {
            node: "core_clk",
            offset: CORE_CBCR,
            last: 0x8000_0001,
        };
        assert_eq!(rig.cc.enable(branch), Err(timeout));
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::PendingHaltClear));
        assert_eq!(rig.cc.is_enabled(branch), Ok(false));
        assert!(rig.events.take().contains(&ClockEvent::Timeout {
            controller: "test_cc",
            node: "core_clk",
            offset: CORE_CBCR,
            last: 0x8000_0001,
        }));

        // The retry reuses the reference already taken on the parent.
        rig.port.unstick(CORE_CBCR);
        rig.cc.enable(branch).unwrap();
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::Ungated));
        assert_eq!(rig.cc.enable_count(core), Ok(1));

        rig.port.stick(CORE_CBCR, CLK_OFF, 0);
        let timeout = ClockError::EnableTimeout {
            node: "core_clk",
            offset: CORE_CBCR,
            last: 0,
        };
        assert_eq!(rig.cc.disable(branch), Err(timeout.clone()));
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::PendingHaltSet));
        assert_eq!(rig.cc.disable(branch), Err(timeout));
        assert_eq!(rig.cc.enable_count(core), Ok(1));

        rig.port.unstick(CORE_CBCR);
        rig.cc.disable(branch).unwrap();
        assert_eq!(rig.cc.branch_state(branch), Ok(BranchState::Gated));
        assert_eq!(rig.cc.enable_count(core), Ok(0));
        assert_eq!(
            rig.cc.disable(branch),
            Err(ClockError::NotEnabled { node: "core_clk" })
        );
    }

    #[test]
    fn test_shared_rcg_parks_with_last_consumer() {
        let rig = rig();
        let src = rig.cc.lookup("shared_clk_src").unwrap();
        let a = rig.cc.lookup("shared_a_clk").unwrap();
        let b = rig.cc.lookup("shared_b_clk").unwrap();
        let cfg = SHARED_CMD + rcg::CFG;

        assert_eq!(rig.cc.set_rate(src, 300_000_000), Ok(300_000_000));
        assert_eq!(rig.port.read32(cfg), 0x503);
        rig.cc.enable(a).unwrap();
        rig.cc.enable(b).unwrap();
        rig.events.take();

        rig.cc.disable(a).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        rig.cc.disable(b).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(true));
        assert_eq!(rig.port.read32(cfg), 0);
        assert_eq!(rig.cc.rate(src), Ok(300_000_000));
        assert!(rig.events.take().contains(&ClockEvent::Parked {
            controller: "test_cc",
            node: "shared_clk_src",
        }));

        rig.cc.enable(a).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        assert_eq!(rig.port.read32(cfg), 0x503);
        assert!(rig.events.take().contains(&ClockEvent::Unparked {
            controller: "test_cc",
            node: "shared_clk_src",
        }));

        // A parked RCG only records the new configuration.
        rig.cc.disable(a).unwrap();
        rig.trace.clear();
        assert_eq!(rig.cc.set_rate(src, 19_200_000), Ok(19_200_000));
        assert!(rig.trace.writes().is_empty());
        assert_eq!(rig.port.read32(cfg), 0);

        rig.cc.enable(b).unwrap();
        assert_eq!(rig.port.read32(cfg), 0x001);
    }

    #[test]
    fn test_timed_out_switch_is_retried() {
        let rig = rig();
        let src = rig.cc.lookup("shared_clk_src").unwrap();
        let a = rig.cc.lookup("shared_a_clk").unwrap();
        let cfg = SHARED_CMD + rcg::CFG;
        rig.cc.enable(a).unwrap();
        rig.events.take();

        rig.port.stick(SHARED_CMD, 1, 1);
        assert_eq!(
            rig.cc.set_rate(src, 300_000_000),
            Err(ClockError::RegisterTimeout {
                offset: SHARED_CMD,
                last: 0x8000_0001
            })
        );
        assert_eq!(rig.cc.is_parked(src), Ok(true));
        assert!(rig.events.take().contains(&ClockEvent::Timeout {
            controller: "test_cc",
            node: "shared_clk_src",
            offset: SHARED_CMD,
            last: 0x8000_0001,
        }));

        // The consumer is still running, so the same request is written again.
        rig.port.unstick(SHARED_CMD);
        assert_eq!(rig.cc.set_rate(src, 300_000_000), Ok(300_000_000));
        assert_eq!(rig.port.read32(cfg), 0x503);
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        assert_eq!(rig.cc.recalc_rate(src), Ok(300_000_000));
    }

    #[test]
    fn test_recalc_adopts_switch_left_on_safe_source() {
        let rig = rig();
        let src = rig.cc.lookup("shared_clk_src").unwrap();
        let a = rig.cc.lookup("shared_a_clk").unwrap();
        let cfg = SHARED_CMD + rcg::CFG;
        rig.cc.enable(a).unwrap();

        rig.port.stick(SHARED_CMD, 1, 1);
        assert!(rig.cc.set_rate(src, 300_000_000).is_err());
        rig.port.unstick(SHARED_CMD);

        assert_eq!(rig.cc.recalc_rate(src), Ok(19_200_000));
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        assert_eq!(rig.cc.set_rate(src, 19_200_000), Ok(19_200_000));
        assert_eq!(rig.cc.set_rate(src, 300_000_000), Ok(300_000_000));
        assert_eq!(rig.port.read32(cfg), 0x503);
        assert_eq!(rig.cc.recalc_rate(src), Ok(300_000_000));
    }

    #[test]
    fn test_safe_config_root_parks_while_disabled() {
        let rig = rig();
        let src = rig.cc.lookup("aux_clk_src").unwrap();
        let branch = rig.cc.lookup("aux_clk").unwrap();
        let cfg = AUX_CMD + rcg::CFG;

        assert_eq!(rig.cc.set_rate(src, 300_000_000), Ok(300_000_000));
        assert_eq!(rig.port.read32(cfg), 0x503);
        rig.cc.enable(branch).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        rig.events.take();

        rig.cc.disable(branch).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(true));
        assert_eq!(rig.port.read32(cfg), 0);
        assert!(rig.events.take().contains(&ClockEvent::Parked {
            controller: "test_cc",
            node: "aux_clk_src",
        }));

        rig.trace.clear();
        assert_eq!(rig.cc.set_rate(src, 150_000_000), Ok(150_000_000));
        assert!(rig.trace.writes().is_empty());
        assert_eq!(rig.cc.recalc_rate(src), Ok(150_000_000));

        rig.cc.enable(branch).unwrap();
        assert_eq!(rig.cc.is_parked(src), Ok(false));
        assert_eq!(rig.port.read32(cfg), 0x507);
        assert_eq!(rig.cc.rate(branch), Ok(150_000_000));
    }

    #[test]
    fn test_domains_power_parent_first() {
        let rig = rig();
        let top = rig.cc.lookup("top_gdsc").unwrap();
        let child = rig.cc.lookup("child_gdsc").unwrap();

        rig.cc.enable(child).unwrap();
        assert_eq!(rig.trace.writes(), vec![(TOP_GDSCR, 0), (CHILD_GDSCR, 0)]);
        assert_eq!(rig.cc.domain_state(top), Ok(PowerState::On));
        assert_eq!(rig.cc.domain_state(child), Ok(PowerState::On));

        rig.trace.clear();
        rig.cc.disable(child).unwrap();
        assert_eq!(
            rig.trace.writes(),
            vec![
                (CHILD_GDSCR, 0x8000_0001),
                (TOP_GDSCR, 0x8000_0800),
                (TOP_GDSCR, 0x8000_0801),
            ]
        );
        assert_eq!(rig.cc.domain_state(child), Ok(PowerState::Off));
        assert_eq!(rig.cc.domain_state(top), Ok(PowerState::Retained));
    }

    #[test]
    fn test_hardware_retained_domain_without_ack() {
        let rig = rig();
        let hw = rig.cc.lookup("hw_gdsc").unwrap();
        let top = rig.cc.lookup("top_gdsc").unwrap();

        rig.port.stick(HW_GDSCR, PWR_ON, 0);
        rig.cc.enable(hw).unwrap();
        assert_eq!(rig.cc.domain_state(hw), Ok(PowerState::On));
        assert!(rig.events.take().contains(&ClockEvent::HardwareRetained {
            controller: "test_cc",
            node: "hw_gdsc",
            offset: HW_GDSCR,
            last: 0,
        }));

        rig.port.stick(TOP_GDSCR, PWR_ON, 0);
        assert_eq!(
            rig.cc.enable(top),
            Err(ClockError::EnableTimeout {
                node: "top_gdsc",
                offset: TOP_GDSCR,
                last: 0,
            })
        );
        assert_eq!(rig.cc.domain_state(top), Ok(PowerState::Off));
        assert_eq!(rig.cc.is_enabled(top), Ok(false));
    }

    #[test]
    fn test_sync_state_gates_what_nobody_enabled() {
        let port = Arc::new(EmulatedPort::for_controller(&TEST_CC));
        port.preset(CORE_CBCR, 1);
        port.preset(0x2100, 1);
        port.preset(TOP_GDSCR, 0);
        let rail = Arc::new(EmulatedRail::new("vdd_cx", port.trace()));
        let cx = RegulatorHandle::new("vdd_cx", CX_LEVELS, rail);
        let cc = builder(&port, &cx).build().unwrap();

        let core = cc.lookup("core_clk").unwrap();
        let aux = cc.lookup("aux_clk").unwrap();
        let top = cc.lookup("top_gdsc").unwrap();
        assert_eq!(cc.branch_state(core), Ok(BranchState::Ungated));
        assert_eq!(cc.domain_state(top), Ok(PowerState::On));

        cc.enable(aux).unwrap();
        cc.sync_state().unwrap();
        assert_eq!(cc.branch_state(core), Ok(BranchState::Gated));
        assert_eq!(cc.branch_state(aux), Ok(BranchState::Ungated));
        assert_eq!(cc.domain_state(top), Ok(PowerState::Retained));
        assert_eq!(port.read32(CORE_CBCR) & CLK_OFF, CLK_OFF);
    }
}
