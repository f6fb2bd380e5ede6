// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock-controller instances.
//!
//! A [`ClockController`] binds one static description to one register
//! window and the regulator handles its nodes vote on. All operations on an
//! instance serialize on its instance lock; regulator vote tables are locked
//! inside it. Events produced by an operation are handed to the sink after
//! the instance lock is released.
//!
//! ```rust,ignore
//! let camcc = ControllerBuilder::new(&sdm845::CAM_CC)
//!     .port(port)
//!     .regulators(vec![cx.clone(), mx.clone()])
//!     .variant(sdm845::SDM670)
//!     .sink(Arc::new(LogSink))
//!     .build()?;
//! let bps = camcc.lookup("cam_cc_bps_clk_src")?;
//! camcc.set_rate(bps, 404_000_000)?;
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::corner::{corner_for_rate, Corner, RegulatorHandle, Voter};
use crate::debug::{ClockEvent, EventSink};
use crate::desc::{ControllerDesc, NodeKind};
use crate::error::{ClockError, Result};
use crate::graph::{Graph, Kind, NodeId};
use crate::port::RegisterPort;
use crate::state::{BranchState, NodeState, PowerState, Runtime, Setting};
use crate::{branch, div, gdsc, pll, rcg, reset};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Index of a reset line within its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetId(pub usize);

/// Everything one operation needs, borrowed from a locked instance.
pub(crate) struct Ctx<'a> {
    pub(crate) controller: &'static str,
    pub(crate) id: usize,
    pub(crate) graph: &'a Graph,
    pub(crate) rt: &'a mut Runtime,
    pub(crate) port: &'a dyn RegisterPort,
    pub(crate) regulators: &'a [RegulatorHandle],
    pub(crate) events: Vec<ClockEvent>,
}

impl<'a> Ctx<'a> {
    pub(crate) fn name(&self, id: NodeId) -> &'static str {
        self.graph.name(id)
    }

    pub(crate) fn voter(&self, node: NodeId) -> Voter {
        Voter {
            controller: self.id,
            node,
        }
    }

    pub(crate) fn emit(&mut self, event: ClockEvent) {
        self.events.push(event);
    }

    /// Record a timeout event for `err`, if it is one.
    pub(crate) fn note_timeout(&mut self, id: NodeId, err: &ClockError) {
        let (offset, last) = match err {
            ClockError::RegisterTimeout { offset, last }
            | ClockError::EnableTimeout { offset, last, .. } => (*offset, *last),
            _ => return,
        };
        let event = ClockEvent::Timeout {
            controller: self.controller,
            node: self.name(id),
            offset,
            last,
        };
        self.emit(event);
    }

    /// Settings of `id` as currently programmed in hardware.
    pub(crate) fn read_setting(&self, id: NodeId) -> Result<Setting> {
        let node = self.graph.node(id);
        Ok(match &node.kind {
            Kind::Pll { desc, .. } => {
                let config = pll::read_config(self.port, desc);
                Setting::Pll {
                    l: config.l,
                    alpha: config.alpha,
                }
            }
            Kind::PostDiv { desc, .. } => {
                let (code, div) = div::read_postdiv(self.port, desc);
                Setting::PostDiv { code, div }
            }
            Kind::Divider { desc, .. } => Setting::Divider {
                div: div::read_divider(self.port, desc),
            },
            Kind::Rcg { desc, .. } => rcg::read_setting(self.port, desc)
                .map(Setting::Rcg)
                .ok_or(ClockError::ParentUnresolved { node: node.name })?,
            Kind::Fixed { .. }
            | Kind::FixedFactor { .. }
            | Kind::Branch { .. }
            | Kind::PowerDomain { .. } => Setting::Fixed,
        })
    }

    /// Seed the runtime state from hardware.
    fn read_hardware(&mut self) -> Result<()> {
        let mut nodes = Vec::with_capacity(self.graph.len());
        for id in self.graph.ids() {
            let mut state = NodeState::new(self.read_setting(id)?);
            match &self.graph.node(id).kind {
                Kind::Branch { desc, .. } => state.branch = branch::read_state(self.port, desc),
                Kind::PowerDomain { desc, .. } => state.power = gdsc::read_state(self.port, desc),
                _ => {}
            }
            nodes.push(state);
        }
        self.rt.nodes = nodes;
        self.rt.recalc_all(self.graph);
        Ok(())
    }

    /// Record, without committing, the votes implied by the boot rates.
    fn seed_votes(&mut self) {
        for id in self.graph.ids() {
            let (Some(vdd), Some(rate)) = (&self.graph.node(id).vdd, self.rt.get(id).rate) else {
                continue;
            };
            if let Some(corner) = corner_for_rate(&vdd.ceilings, rate) {
                self.regulators[vdd.regulator].vote(self.voter(id), corner);
                self.rt.get_mut(id).vote = corner;
            }
        }
    }

    fn drop_votes(&mut self) {
        for id in self.graph.ids() {
            if let Some(vdd) = &self.graph.node(id).vdd {
                self.regulators[vdd.regulator].unvote(self.voter(id));
            }
        }
    }
}

struct Inner {
    graph: Graph,
    rt: Runtime,
    /// Set by the first rate, enable or vote operation.
    used: bool,
}

/// One live clock-controller instance.
pub struct ClockController {
    id: usize,
    desc: &'static ControllerDesc,
    port: Arc<dyn RegisterPort>,
    regulators: Vec<RegulatorHandle>,
    source_rates: Vec<(String, u64)>,
    sink: Option<Arc<dyn EventSink>>,
    inner: Mutex<Inner>,
}

/// Create a controller with no variant, sink or source-rate overrides.
pub fn build_controller(
    desc: &'static ControllerDesc,
    port: Arc<dyn RegisterPort>,
    regulators: Vec<RegulatorHandle>,
) -> Result<ClockController> {
    ControllerBuilder::new(desc)
        .port(port)
        .regulators(regulators)
        .build()
}

pub struct ControllerBuilder {
    desc: &'static ControllerDesc,
    port: Option<Arc<dyn RegisterPort>>,
    regulators: Vec<RegulatorHandle>,
    variant: Option<String>,
    source_rates: Vec<(String, u64)>,
    sink: Option<Arc<dyn EventSink>>,
}

impl ControllerBuilder {
    pub fn new(desc: &'static ControllerDesc) -> ControllerBuilder {
        ControllerBuilder {
            desc,
            port: None,
            regulators: Vec::new(),
            variant: None,
            source_rates: Vec::new(),
            sink: None,
        }
    }

    pub fn port(mut self, port: Arc<dyn RegisterPort>) -> Self {
        self.port = Some(port);
        self
    }

    pub fn regulators(mut self, regulators: Vec<RegulatorHandle>) -> Self {
        self.regulators = regulators;
        self
    }

    pub fn variant(mut self, tag: &str) -> Self {
        self.variant = Some(tag.to_string());
        self
    }

    /// Rate of a board-provided fixed source, such as a PHY output.
    pub fn source_rate(mut self, name: &str, rate: u64) -> Self {
        self.source_rates.push((name.to_string(), rate));
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<ClockController> {
        let port = self.port.ok_or_else(|| {
            ClockError::InvalidDescription(format!("{}: no register port", self.desc.name))
        })?;
        let fixup = match &self.variant {
            None => None,
            Some(tag) => Some(find_variant(self.desc, tag)?),
        };
        let graph = Graph::build(self.desc, fixup, &self.regulators, &self.source_rates)?;

        for node in self.desc.nodes {
            if let NodeKind::Pll(desc) = &node.kind {
                if let Some(config) = desc.initial {
                    pll::program(port.as_ref(), desc, config, false)?;
                }
            }
        }
        for update in self.desc.init {
            port.update32(update.offset, update.mask, update.value);
        }

        let controller = ClockController {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            desc: self.desc,
            port,
            regulators: self.regulators,
            source_rates: self.source_rates,
            sink: self.sink,
            inner: Mutex::new(Inner {
                graph,
                rt: Runtime { nodes: Vec::new() },
                used: false,
            }),
        };
        controller.with(false, |ctx| {
            ctx.read_hardware()?;
            ctx.seed_votes();
            Ok(())
        })?;
        Ok(controller)
    }
}

fn find_variant(
    desc: &'static ControllerDesc,
    tag: &str,
) -> Result<&'static crate::desc::VariantFixup> {
    desc.variant(tag).ok_or_else(|| ClockError::VariantRejected {
        tag: tag.to_string(),
        reason: "unknown variant",
    })
}

impl ClockController {
    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Instance id used to key this controller's votes.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lookup(&self, name: &str) -> Result<NodeId> {
        self.lock().graph.lookup(name)
    }

    pub fn node_name(&self, id: NodeId) -> Result<&'static str> {
        let inner = self.lock();
        if id.0 < inner.graph.len() {
            Ok(inner.graph.name(id))
        } else {
            Err(ClockError::UnknownNode(format!("#{}", id.0)))
        }
    }

    /// Tag of the active variant fixup.
    pub fn variant(&self) -> Option<&'static str> {
        self.lock().graph.variant()
    }

    /// Reconfigure `id` to the closest supported rate at or above `rate`,
    /// returning the rate achieved.
    pub fn set_rate(&self, id: NodeId, rate: u64) -> Result<u64> {
        self.with_node(id, true, |ctx| ctx.set_rate(id, rate))
    }

    /// The rate `set_rate` would achieve, without touching anything.
    pub fn round_rate(&self, id: NodeId, rate: u64) -> Result<u64> {
        self.with_node(id, false, |ctx| ctx.round_rate(id, rate))
    }

    /// Re-derive the rate of `id` from hardware.
    pub fn recalc_rate(&self, id: NodeId) -> Result<u64> {
        self.with_node(id, false, |ctx| ctx.recalc(id))
    }

    /// Cached rate of `id`.
    pub fn rate(&self, id: NodeId) -> Result<u64> {
        self.with_node(id, false, |ctx| {
            if ctx.graph.node(id).is_domain() {
                return Err(ClockError::NotSupported { node: ctx.name(id) });
            }
            ctx.rt
                .get(id)
                .rate
                .ok_or(ClockError::ParentUnresolved { node: ctx.name(id) })
        })
    }

    pub fn enable(&self, id: NodeId) -> Result<()> {
        self.with_node(id, true, |ctx| ctx.enable(id))
    }

    pub fn disable(&self, id: NodeId) -> Result<()> {
        self.with_node(id, true, |ctx| ctx.disable(id))
    }

    /// Whether `id` holds at least one enable reference.
    pub fn is_enabled(&self, id: NodeId) -> Result<bool> {
        self.with_node(id, false, |ctx| Ok(ctx.rt.get(id).refcount > 0))
    }

    pub fn enable_count(&self, id: NodeId) -> Result<u32> {
        self.with_node(id, false, |ctx| Ok(ctx.rt.get(id).refcount))
    }

    pub fn branch_state(&self, id: NodeId) -> Result<BranchState> {
        self.with_node(id, false, |ctx| match ctx.graph.node(id).kind {
            Kind::Branch { .. } => Ok(ctx.rt.get(id).branch),
            _ => Err(ClockError::NotSupported { node: ctx.name(id) }),
        })
    }

    pub fn domain_state(&self, id: NodeId) -> Result<PowerState> {
        self.with_node(id, false, |ctx| match ctx.graph.node(id).kind {
            Kind::PowerDomain { .. } => Ok(ctx.rt.get(id).power),
            _ => Err(ClockError::NotSupported { node: ctx.name(id) }),
        })
    }

    /// Whether the RCG `id` currently runs off its safe source, either
    /// parked or left there by a timed-out switch.
    pub fn is_parked(&self, id: NodeId) -> Result<bool> {
        self.with_node(id, false, |ctx| Ok(ctx.rt.get(id).needs_restore()))
    }

    fn regulator(&self, name: &str) -> Result<&RegulatorHandle> {
        self.regulators
            .iter()
            .find(|handle| handle.name() == name)
            .ok_or_else(|| {
                ClockError::InvalidDescription(format!("{}: no regulator {}", self.desc.name, name))
            })
    }

    /// Record an explicit vote of `id` on `regulator`; it takes effect on the
    /// next [`commit`](ClockController::commit).
    pub fn vote(&self, regulator: &str, id: NodeId, corner: Corner) -> Result<()> {
        let handle = self.regulator(regulator)?.clone();
        self.with_node(id, true, |ctx| {
            handle.vote(ctx.voter(id), corner);
            if let Some(vdd) = &ctx.graph.node(id).vdd {
                if ctx.regulators[vdd.regulator].same_as(&handle) {
                    ctx.rt.get_mut(id).vote = corner;
                }
            }
            Ok(())
        })
    }

    pub fn unvote(&self, regulator: &str, id: NodeId) -> Result<()> {
        self.vote(regulator, id, Corner::None)
    }

    pub fn commit(&self, regulator: &str) -> Result<Corner> {
        let handle = self.regulator(regulator)?.clone();
        self.with(true, |ctx| {
            let (corner, moved) = handle.commit_tracked()?;
            if moved {
                ctx.emit(ClockEvent::CornerCommitted {
                    regulator: handle.name(),
                    corner,
                });
            }
            Ok(corner)
        })
    }

    /// Rebuild the graph with the fixup named `tag`.
    ///
    /// Only allowed before the first rate, enable or vote operation, and
    /// only once: re-applying the active tag is a no-op.
    pub fn apply_variant(&self, tag: &str) -> Result<()> {
        let rejected = |reason| ClockError::VariantRejected {
            tag: tag.to_string(),
            reason,
        };
        let fixup = find_variant(self.desc, tag)?;
        let mut inner = self.lock();
        match inner.graph.variant() {
            Some(active) if active == tag => return Ok(()),
            Some(_) => return Err(rejected("another variant is already active")),
            None => {}
        }
        if inner.used {
            return Err(rejected("controller already in use"));
        }

        let graph = Graph::build(self.desc, Some(fixup), &self.regulators, &self.source_rates)?;
        let Inner { graph: old, rt, .. } = &mut *inner;
        Ctx {
            controller: self.desc.name,
            id: self.id,
            graph: old,
            rt,
            port: self.port.as_ref(),
            regulators: &self.regulators,
            events: Vec::new(),
        }
        .drop_votes();
        inner.graph = graph;

        let Inner { graph, rt, .. } = &mut *inner;
        let mut ctx = Ctx {
            controller: self.desc.name,
            id: self.id,
            graph,
            rt,
            port: self.port.as_ref(),
            regulators: &self.regulators,
            events: Vec::new(),
        };
        ctx.read_hardware()?;
        ctx.seed_votes();
        Ok(())
    }

    /// Gate everything left running at handover that no consumer has
    /// enabled: ungated branches and powered domains with no references.
    pub fn sync_state(&self) -> Result<()> {
        self.with(true, |ctx| ctx.sync_state())
    }

    pub fn reset_by_name(&self, name: &str) -> Result<ResetId> {
        self.desc
            .resets
            .iter()
            .position(|reset| reset.name == name)
            .map(ResetId)
            .ok_or_else(|| ClockError::UnknownReset(name.to_string()))
    }

    fn reset_desc(&self, id: ResetId) -> Result<&'static crate::desc::ResetDesc> {
        self.desc
            .resets
            .get(id.0)
            .ok_or_else(|| ClockError::UnknownReset(format!("#{}", id.0)))
    }

    pub fn assert_reset(&self, id: ResetId) -> Result<()> {
        let desc = self.reset_desc(id)?;
        let _inner = self.lock();
        reset::assert(self.port.as_ref(), desc);
        Ok(())
    }

    pub fn deassert_reset(&self, id: ResetId) -> Result<()> {
        let desc = self.reset_desc(id)?;
        let _inner = self.lock();
        reset::deassert(self.port.as_ref(), desc);
        Ok(())
    }

    /// Assert, hold briefly, then release the reset line.
    pub fn reset(&self, id: ResetId) -> Result<()> {
        let desc = self.reset_desc(id)?;
        let _inner = self.lock();
        reset::pulse(self.port.as_ref(), desc);
        Ok(())
    }

    /// Whether the reset line is asserted.
    pub fn reset_status(&self, id: ResetId) -> Result<bool> {
        let desc = self.reset_desc(id)?;
        let _inner = self.lock();
        Ok(reset::status(self.port.as_ref(), desc))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_node<T>(
        &self,
        id: NodeId,
        mutating: bool,
        op: impl FnOnce(&mut Ctx<'_>) -> Result<T>,
    ) -> Result<T> {
        self.with(mutating, |ctx| {
            if id.0 >= ctx.graph.len() {
                return Err(ClockError::UnknownNode(format!("#{}", id.0)));
            }
            op(ctx)
        })
    }

    /// Run `op` under the instance lock, then report its events.
    fn with<T>(&self, mutating: bool, op: impl FnOnce(&mut Ctx<'_>) -> Result<T>) -> Result<T> {
        let (result, events) = {
            let mut inner = self.lock();
            if mutating {
                inner.used = true;
            }
            let Inner { graph, rt, .. } = &mut *inner;
            let mut ctx = Ctx {
                controller: self.desc.name,
                id: self.id,
                graph,
                rt,
                port: self.port.as_ref(),
                regulators: &self.regulators,
                events: Vec::new(),
            };
            let result = op(&mut ctx);
            (result, ctx.events)
        };
        if let Some(sink) = &self.sink {
            for event in &events {
                sink.report(event);
            }
        }
        result
    }
}

impl core::fmt::Debug for ClockController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClockController")
            .field("name", &self.desc.name)
            .field("id", &self.id)
            .field("variant", &self.variant())
            .finish()
    }
}
