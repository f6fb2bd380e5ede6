// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Per-instance runtime state.
//!
//! The graph is immutable once built; everything that changes at runtime
//! lives here, behind the controller's instance lock. The cached rate of a
//! node is always derived from its cached [`Setting`] and its selected
//! parent's cached rate.

use crate::corner::Corner;
use crate::graph::{Graph, Kind, NodeId};

/// Configuration of an RCG as programmed into `CFG_RCGR` and the M/N/D
/// registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RcgSetting {
    /// Index into the node's `parent_map`.
    pub(crate) slot: usize,
    pub(crate) pre_div: u8,
    /// Zero when the M/N counter is bypassed.
    pub(crate) m: u32,
    pub(crate) n: u32,
}

/// Rate-relevant configuration of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Setting {
    /// Nothing to program: fixed sources, fixed factors, branches and
    /// domains.
    Fixed,
    Pll { l: u32, alpha: u32 },
    PostDiv { code: u32, div: u32 },
    Divider { div: u32 },
    Rcg(RcgSetting),
}

/// Gate state of a branch. The `Pending*` states mean the last transition
/// was written but the hardware never confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Gated,
    PendingHaltClear,
    Ungated,
    PendingHaltSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
    /// Collapsed with flip-flop retention enabled.
    Retained,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeState {
    /// `None` while the parent chain has no known rate.
    pub(crate) rate: Option<u64>,
    pub(crate) setting: Setting,
    pub(crate) refcount: u32,
    /// Whether this node holds an enable reference on its selected parent.
    pub(crate) parent_held: bool,
    /// RCG deliberately switched to its safe source while none of its
    /// consumers run; `setting` is restored on unpark.
    pub(crate) parked: bool,
    /// A safe switch timed out. The RCG is left on or near its safe source
    /// and `setting` was never confirmed by the hardware.
    pub(crate) stranded: bool,
    /// The last disable wrote its transition but never saw it confirmed.
    pub(crate) disable_pending: bool,
    /// Corner this node votes for on its regulator.
    pub(crate) vote: Corner,
    pub(crate) branch: BranchState,
    pub(crate) power: PowerState,
}

impl NodeState {
    pub(crate) fn new(setting: Setting) -> NodeState {
        NodeState {
            rate: None,
            setting,
            refcount: 0,
            parent_held: false,
            parked: false,
            stranded: false,
            disable_pending: false,
            vote: Corner::None,
            branch: BranchState::Gated,
            power: PowerState::Off,
        }
    }
}

impl NodeState {
    /// Whether the stored RCG setting still has to be written back.
    pub(crate) fn needs_restore(&self) -> bool {
        self.parked || self.stranded
    }

    /// A parked RCG with no consumer only records new settings.
    pub(crate) fn defers_config(&self) -> bool {
        self.parked && self.refcount == 0
    }
}

#[derive(Debug)]
pub(crate) struct Runtime {
    pub(crate) nodes: Vec<NodeState>,
}

impl Runtime {
    pub(crate) fn get(&self, id: NodeId) -> &NodeState {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut NodeState {
        &mut self.nodes[id.0]
    }

    /// The parent `id` is fed from under `setting`.
    pub(crate) fn selected_parent(graph: &Graph, id: NodeId, setting: &Setting) -> Option<NodeId> {
        match (&graph.node(id).kind, setting) {
            (Kind::Fixed { .. }, _) => None,
            (Kind::Rcg { parents, .. }, Setting::Rcg(rcg)) => parents.get(rcg.slot).copied(),
            (Kind::Rcg { .. }, _) => None,
            (Kind::Pll { parent, .. }, _)
            | (Kind::PostDiv { parent, .. }, _)
            | (Kind::FixedFactor { parent, .. }, _)
            | (Kind::Divider { parent, .. }, _) => Some(*parent),
            (Kind::Branch { parent, .. }, _) | (Kind::PowerDomain { parent, .. }, _) => *parent,
        }
    }

    /// The parent `id` is currently fed from.
    pub(crate) fn parent_of(&self, graph: &Graph, id: NodeId) -> Option<NodeId> {
        Self::selected_parent(graph, id, &self.get(id).setting)
    }

    /// Rate of a node under `setting` given its parent's rate.
    pub(crate) fn derive_rate(
        graph: &Graph,
        id: NodeId,
        setting: &Setting,
        parent: Option<u64>,
    ) -> Option<u64> {
        match (&graph.node(id).kind, setting) {
            (Kind::Fixed { rate }, _) => Some(*rate).filter(|rate| *rate != 0),
            (Kind::PowerDomain { .. }, _) => None,
            (Kind::Pll { desc, .. }, Setting::Pll { l, alpha }) => {
                parent.map(|prate| crate::pll::rate_of(prate, *l, *alpha, desc.alpha_width))
            }
            (Kind::PostDiv { .. }, Setting::PostDiv { div, .. })
            | (Kind::Divider { .. }, Setting::Divider { div }) => {
                parent.map(|prate| prate / u64::from(*div))
            }
            (Kind::FixedFactor { desc, .. }, _) => {
                parent.map(|prate| prate * u64::from(desc.mult) / u64::from(desc.div))
            }
            (Kind::Rcg { .. }, Setting::Rcg(rcg)) => {
                parent.map(|prate| crate::rcg::rate_of(prate, rcg))
            }
            (Kind::Branch { .. }, _) => parent,
            _ => None,
        }
    }

    /// Recompute every cached rate from the cached settings.
    pub(crate) fn recalc_all(&mut self, graph: &Graph) {
        for &id in &graph.order {
            let parent = self
                .parent_of(graph, id)
                .and_then(|parent| self.get(parent).rate);
            let setting = self.get(id).setting;
            self.get_mut(id).rate = Self::derive_rate(graph, id, &setting, parent);
        }
    }
}
