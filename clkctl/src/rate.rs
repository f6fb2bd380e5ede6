// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Rate resolution.
//!
//! A rate request is first turned into a [`Plan`] without touching hardware:
//! the new setting of every node that has to be reprogrammed, in
//! parent-first order, and the resulting rate of every node whose rate
//! moves, including descendants that merely inherit a new parent rate.
//!
//! Committing a plan raises corner votes and commits them, writes the
//! registers parent-first, and only then lowers the votes that dropped, so a
//! rail is never below what the clocks running on it need.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CONFIG;
use crate::controller::Ctx;
use crate::corner::{corner_for_rate, Corner};
use crate::debug::ClockEvent;
use crate::desc::{DerivedRate, PllConfig, RcgMode};
use crate::error::{ClockError, Result};
use crate::graph::{Graph, Kind, NodeId};
use crate::registers::field_mask;
use crate::state::{Runtime, Setting};
use crate::{div, pll, rcg};

#[derive(Debug, Clone, Default)]
pub(crate) struct Plan {
    /// Reprogrammed nodes, parents before children.
    changes: Vec<(NodeId, Setting)>,
    settings: BTreeMap<NodeId, Setting>,
    rates: BTreeMap<NodeId, u64>,
    /// Nodes already asked for a rate; the first request wins.
    requested: BTreeSet<NodeId>,
}

struct Planner<'a> {
    graph: &'a Graph,
    rt: &'a Runtime,
    plan: Plan,
}

impl<'a> Planner<'a> {
    fn name(&self, id: NodeId) -> &'static str {
        self.graph.name(id)
    }

    fn setting(&self, id: NodeId) -> Setting {
        self.plan
            .settings
            .get(&id)
            .copied()
            .unwrap_or(self.rt.get(id).setting)
    }

    /// Planned rate of `id`, falling back to its cached rate.
    fn rate(&self, id: NodeId) -> Result<u64> {
        self.plan
            .rates
            .get(&id)
            .copied()
            .or(self.rt.get(id).rate)
            .filter(|rate| *rate != 0)
            .ok_or(ClockError::ParentUnresolved {
                node: self.name(id),
            })
    }

    fn record(&mut self, id: NodeId, setting: Setting, rate: u64) -> u64 {
        let state = self.rt.get(id);
        // A setting stranded by a timeout is written again.
        if setting != state.setting || state.stranded {
            self.plan.changes.retain(|(node, _)| *node != id);
            self.plan.changes.push((id, setting));
        }
        self.plan.settings.insert(id, setting);
        self.plan.rates.insert(id, rate);
        rate
    }

    /// Whether `id` could be planned to `rate`, discarding the attempt.
    fn attempt(&self, id: NodeId, rate: u64) -> Result<u64> {
        let mut scratch = Planner {
            graph: self.graph,
            rt: self.rt,
            plan: self.plan.clone(),
        };
        scratch.request(id, rate)
    }

    fn out_of_range(&self, id: NodeId, rate: u64) -> ClockError {
        ClockError::RateOutOfRange {
            node: self.name(id),
            rate,
        }
    }

    /// Plan `id` for `rate` and return the rate it will actually run at.
    fn request(&mut self, id: NodeId, rate: u64) -> Result<u64> {
        if !self.plan.requested.insert(id) {
            return self.rate(id);
        }
        let graph = self.graph;
        let node = graph.node(id);
        match &node.kind {
            Kind::Fixed { .. } => self.rate(id),
            Kind::PowerDomain { .. } => Err(ClockError::NotSupported { node: node.name }),
            Kind::Pll { desc, parent } => {
                let prate = self.rate(*parent)?;
                let (config, achieved) =
                    pll::solve(desc, prate, rate).ok_or(self.out_of_range(id, rate))?;
                let PllConfig { l, alpha } = config;
                Ok(self.record(id, Setting::Pll { l, alpha }, achieved))
            }
            Kind::PostDiv { desc, parent } if desc.follows_parent => {
                let current = match self.setting(id) {
                    Setting::PostDiv { div, .. } => div,
                    _ => 1,
                };
                for (code, div) in div::candidates(desc, current) {
                    let Some(ask) = rate.checked_mul(u64::from(div)) else {
                        continue;
                    };
                    if self.attempt(*parent, ask).is_ok() {
                        let prate = self.request(*parent, ask)?;
                        let out = prate / u64::from(div);
                        return Ok(self.record(id, Setting::PostDiv { code, div }, out));
                    }
                }
                Err(self.out_of_range(id, rate))
            }
            Kind::PostDiv { desc, parent } => {
                let prate = self.rate(*parent)?;
                // Table rates are truncated, so the request can sit a few
                // hertz under the exact division.
                let slack = rate.saturating_add(CONFIG.pll_rate_margin_hz);
                let (code, div) =
                    div::closest_below(desc, prate, slack).ok_or(self.out_of_range(id, rate))?;
                let out = prate / u64::from(div);
                Ok(self.record(id, Setting::PostDiv { code, div }, out))
            }
            Kind::FixedFactor { desc, parent } => {
                let prate = if desc.follows_parent {
                    let ask = rate
                        .checked_mul(u64::from(desc.div))
                        .ok_or(self.out_of_range(id, rate))?
                        / u64::from(desc.mult);
                    self.request(*parent, ask)?
                } else {
                    self.rate(*parent)?
                };
                let out = prate * u64::from(desc.mult) / u64::from(desc.div);
                Ok(self.record(id, Setting::Fixed, out))
            }
            Kind::Divider { desc, parent } => {
                let prate = self.rate(*parent)?;
                let div = div::divider_for(desc, prate, rate);
                Ok(self.record(id, Setting::Divider { div }, prate / u64::from(div)))
            }
            Kind::Rcg {
                desc,
                parents,
                freq_tbl,
                entry_slots,
            } => match desc.mode {
                RcgMode::ExactMatch | RcgMode::SharedSafeSwitch => {
                    let index =
                        rcg::select_entry(freq_tbl, rate).ok_or(self.out_of_range(id, rate))?;
                    let entry = &freq_tbl[index];
                    let slot = entry_slots[index];
                    let parent = parents[slot];
                    let prate = if desc.follows_parent {
                        self.request(parent, rcg::parent_request(entry))?
                    } else {
                        self.rate(parent)?
                    };
                    let setting = rcg::setting(slot, entry.pre_div, entry.m, entry.n);
                    let mut out = rcg::rate_of(prate, &setting);
                    // A relocked PLL lands up to the margin above the entry.
                    if out > entry.rate && out - entry.rate <= CONFIG.pll_rate_margin_hz {
                        out = entry.rate;
                    }
                    Ok(self.record(id, Setting::Rcg(setting), out))
                }
                RcgMode::Derived(derived) => {
                    let current = match self.setting(id) {
                        Setting::Rcg(setting) => setting,
                        _ => rcg::setting(0, 0, 0, 0),
                    };
                    let parent = parents[current.slot];
                    let (setting, prate) = match derived {
                        DerivedRate::Byte => {
                            let prate = if desc.follows_parent {
                                self.request(parent, rate)?
                            } else {
                                self.rate(parent)?
                            };
                            let pre_div = rcg::byte_divider(prate, rate, desc.hid_width);
                            (rcg::setting(current.slot, pre_div, 0, 0), prate)
                        }
                        DerivedRate::Pixel => {
                            self.plan_pixel(id, parent, rate, current.slot, current.pre_div)?
                        }
                        DerivedRate::DisplayPort => {
                            let prate = self.rate(parent)?;
                            let max = u64::from(field_mask(0, desc.mnd_width));
                            let (den, num) = rcg::best_ratio(prate, rate, max, max);
                            if num == 0 || den == 0 || num > den {
                                return Err(self.out_of_range(id, rate));
                            }
                            let setting =
                                rcg::setting(current.slot, current.pre_div, num as u32, den as u32);
                            (setting, prate)
                        }
                    };
                    let out = rcg::rate_of(prate, &setting);
                    Ok(self.record(id, Setting::Rcg(setting), out))
                }
            },
            Kind::Branch { desc, parent } => {
                let parent = parent.ok_or(ClockError::ParentUnresolved { node: node.name })?;
                let out = if desc.follows_parent {
                    self.request(parent, rate)?
                } else {
                    self.rate(parent)?
                };
                Ok(self.record(id, Setting::Fixed, out))
            }
        }
    }

    /// First M/N fraction whose parent request the parent can meet.
    fn plan_pixel(
        &mut self,
        id: NodeId,
        parent: NodeId,
        rate: u64,
        slot: usize,
        pre_div: u8,
    ) -> Result<(crate::state::RcgSetting, u64)> {
        let follows = match &self.graph.node(id).kind {
            Kind::Rcg { desc, .. } => desc.follows_parent,
            _ => false,
        };
        for (num, den) in rcg::PIXEL_FRACTIONS {
            let Some(ask) = rate.checked_mul(u64::from(den)) else {
                continue;
            };
            let ask = ask / u64::from(num);
            let achievable = if follows {
                self.attempt(parent, ask)
            } else {
                self.rate(parent)
            };
            let Ok(src) = achievable else {
                continue;
            };
            let delta = CONFIG.pixel_delta_hz;
            if src.saturating_add(delta) < ask || src > ask.saturating_add(delta) {
                continue;
            }
            let prate = if follows { self.request(parent, ask)? } else { src };
            return Ok((rcg::setting(slot, pre_div, num, den), prate));
        }
        Err(self.out_of_range(id, rate))
    }

    /// Carry planned rates down to every node that inherits them.
    fn propagate(&mut self) {
        for &id in &self.graph.order {
            if self.plan.requested.contains(&id) {
                continue;
            }
            let setting = self.setting(id);
            let Some(parent) = Runtime::selected_parent(self.graph, id, &setting) else {
                continue;
            };
            let Some(&prate) = self.plan.rates.get(&parent) else {
                continue;
            };
            if let Some(rate) = Runtime::derive_rate(self.graph, id, &setting, Some(prate)) {
                self.plan.rates.insert(id, rate);
            }
        }
    }
}

/// A node whose corner vote moves.
#[derive(Debug, Clone, Copy)]
struct VoteChange {
    node: NodeId,
    regulator: usize,
    old: Corner,
    new: Corner,
}

impl<'a> Ctx<'a> {
    fn plan(&self, id: NodeId, rate: u64) -> Result<(Plan, u64)> {
        if rate == 0 {
            return Err(ClockError::RateOutOfRange {
                node: self.name(id),
                rate,
            });
        }
        let mut planner = Planner {
            graph: self.graph,
            rt: &*self.rt,
            plan: Plan::default(),
        };
        let actual = planner.request(id, rate)?;
        planner.propagate();
        Ok((planner.plan, actual))
    }

    pub(crate) fn round_rate(&self, id: NodeId, rate: u64) -> Result<u64> {
        self.plan(id, rate).map(|(_, actual)| actual)
    }

    pub(crate) fn set_rate(&mut self, id: NodeId, rate: u64) -> Result<u64> {
        let (plan, actual) = self.plan(id, rate)?;
        self.commit_plan(plan)?;
        Ok(actual)
    }

    fn commit_plan(&mut self, plan: Plan) -> Result<()> {
        let moved: Vec<(NodeId, Option<u64>, u64)> = plan
            .rates
            .iter()
            .map(|(id, rate)| (*id, self.rt.get(*id).rate, *rate))
            .filter(|(_, old, new)| *old != Some(*new))
            .collect();

        let mut votes = Vec::new();
        for (id, _, rate) in &moved {
            let Some(vdd) = &self.graph.node(*id).vdd else {
                continue;
            };
            let new = corner_for_rate(&vdd.ceilings, *rate).ok_or(ClockError::CornerUnavailable {
                node: self.name(*id),
                rate: *rate,
            })?;
            let old = self.rt.get(*id).vote;
            if new != old {
                votes.push(VoteChange {
                    node: *id,
                    regulator: vdd.regulator,
                    old,
                    new,
                });
            }
        }
        let (raises, lowers): (Vec<VoteChange>, Vec<VoteChange>) =
            votes.into_iter().partition(|vote| vote.new > vote.old);

        self.apply_votes(&raises, true)?;

        for (id, setting) in &plan.changes {
            if let Err(err) = self.program(*id, *setting) {
                self.note_timeout(*id, &err);
                self.rt.recalc_all(self.graph);
                return Err(err);
            }
        }

        for (id, old, new) in moved {
            self.rt.get_mut(id).rate = Some(new);
            let event = ClockEvent::RateChanged {
                controller: self.controller,
                node: self.name(id),
                old,
                new,
            };
            self.emit(event);
        }

        self.apply_votes(&lowers, false)
    }

    /// Record `changes` and commit every regulator they touch.
    ///
    /// A failed raise restores the previous votes so the vote tables keep
    /// matching the hardware that is left unchanged.
    fn apply_votes(&mut self, changes: &[VoteChange], raising: bool) -> Result<()> {
        let regulators = self.regulators;
        for change in changes {
            regulators[change.regulator].vote(self.voter(change.node), change.new);
        }
        let mut touched: Vec<usize> = changes.iter().map(|change| change.regulator).collect();
        touched.sort_unstable();
        touched.dedup();

        for regulator in touched {
            let handle = &regulators[regulator];
            match handle.commit_tracked() {
                Ok((corner, true)) => self.emit(ClockEvent::CornerCommitted {
                    regulator: handle.name(),
                    corner,
                }),
                Ok((_, false)) => {}
                Err(err) => {
                    if raising {
                        for change in changes {
                            regulators[change.regulator].vote(self.voter(change.node), change.old);
                        }
                    }
                    return Err(err);
                }
            }
        }
        for change in changes {
            self.rt.get_mut(change.node).vote = change.new;
        }
        Ok(())
    }

    /// Write `setting` to the hardware behind `id`.
    fn program(&mut self, id: NodeId, setting: Setting) -> Result<()> {
        let graph = self.graph;
        let port = self.port;
        let state = self.rt.get(id);
        let old_parent = Runtime::selected_parent(graph, id, &state.setting);
        let new_parent = Runtime::selected_parent(graph, id, &setting);
        let switch = state.parent_held && old_parent != new_parent;
        let deferred = state.defers_config();

        // A running node keeps a reference on whichever parent feeds it.
        if switch {
            if let Some(parent) = new_parent {
                self.enable(parent)?;
            }
        }

        let result = match (&graph.node(id).kind, setting) {
            (Kind::Pll { desc, .. }, Setting::Pll { l, alpha }) => pll::program(
                port,
                desc,
                PllConfig { l, alpha },
                pll::is_enabled(port, desc),
            ),
            (Kind::PostDiv { desc, .. }, Setting::PostDiv { code, .. }) => {
                div::program_postdiv(port, desc, code);
                Ok(())
            }
            (Kind::Divider { desc, .. }, Setting::Divider { div }) => {
                div::program_divider(port, desc, div);
                Ok(())
            }
            // Applied on unpark.
            (Kind::Rcg { .. }, Setting::Rcg(_)) if deferred => Ok(()),
            (Kind::Rcg { desc, .. }, Setting::Rcg(cfg)) => {
                let shared = desc.mode == RcgMode::SharedSafeSwitch;
                let result = if shared {
                    rcg::safe_switch(port, desc, &cfg)
                } else {
                    rcg::configure(port, desc, &cfg)
                };
                let state = self.rt.get_mut(id);
                match result {
                    Ok(()) => {
                        state.parked = false;
                        state.stranded = false;
                    }
                    Err(_) if shared => state.stranded = true,
                    Err(_) => {}
                }
                result
            }
            _ => Ok(()),
        };
        self.rt.get_mut(id).setting = setting;
        result?;

        if switch {
            if let Some(parent) = old_parent {
                self.disable(parent)?;
            }
        }
        Ok(())
    }

    /// Re-read `id` and its parent chain from hardware.
    pub(crate) fn recalc(&mut self, id: NodeId) -> Result<u64> {
        let graph = self.graph;
        let node = graph.node(id);
        if node.is_domain() {
            return Err(ClockError::NotSupported { node: node.name });
        }
        // A parked RCG reads back its safe source; keep the stored setting.
        // Anything else, a stranded RCG included, takes what hardware runs.
        let setting = if self.rt.get(id).parked {
            self.rt.get(id).setting
        } else {
            self.read_setting(id)?
        };
        let state = self.rt.get_mut(id);
        state.setting = setting;
        state.stranded = false;

        let prate = match Runtime::selected_parent(graph, id, &setting) {
            Some(parent) => Some(self.recalc(parent)?),
            None => None,
        };
        let rate = Runtime::derive_rate(graph, id, &setting, prate);
        self.rt.get_mut(id).rate = rate;
        rate.ok_or(ClockError::ParentUnresolved { node: node.name })
    }
}
