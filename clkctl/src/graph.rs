// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock node graph.
//!
//! [`Graph::build`] turns a static [`ControllerDesc`] into an arena of nodes
//! addressed by [`NodeId`]. Parent names become indices, every table is
//! validated, and the nodes are sorted so that each node comes after all of
//! its possible parents. A description with a cycle, an unknown parent or an
//! unsorted table is rejected here, before any hardware is touched.

use std::collections::HashMap;

use crate::corner::{Corner, RegulatorHandle};
use crate::desc::{
    BranchDesc, ControllerDesc, DividerDesc, FixedFactorDesc, Freq, GdscDesc, NodeKind, PllDesc,
    PostDivDesc, RcgDesc, VariantFixup,
};
use crate::error::{ClockError, Result};
use crate::registers::field_mask;
use crate::variant;

/// Stable index of a node within one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Resolved corner ceilings of a node.
#[derive(Debug, Clone)]
pub(crate) struct Vdd {
    /// Index into the controller's regulator list.
    pub(crate) regulator: usize,
    pub(crate) ceilings: Vec<(Corner, u64)>,
}

#[derive(Debug)]
pub(crate) enum Kind {
    Fixed {
        rate: u64,
    },
    Pll {
        desc: &'static PllDesc,
        parent: NodeId,
    },
    PostDiv {
        desc: &'static PostDivDesc,
        parent: NodeId,
    },
    FixedFactor {
        desc: &'static FixedFactorDesc,
        parent: NodeId,
    },
    Divider {
        desc: &'static DividerDesc,
        parent: NodeId,
    },
    Rcg {
        desc: &'static RcgDesc,
        /// One entry per `parent_map` slot.
        parents: Vec<NodeId>,
        freq_tbl: &'static [Freq],
        /// Parent slot used by each frequency table entry.
        entry_slots: Vec<usize>,
    },
    Branch {
        desc: &'static BranchDesc,
        parent: Option<NodeId>,
    },
    PowerDomain {
        desc: &'static GdscDesc,
        parent: Option<NodeId>,
    },
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) name: &'static str,
    pub(crate) kind: Kind,
    pub(crate) vdd: Option<Vdd>,
}

impl Node {
    /// Every node this one can be fed from.
    pub(crate) fn possible_parents(&self) -> Vec<NodeId> {
        match &self.kind {
            Kind::Fixed { .. } => Vec::new(),
            Kind::Pll { parent, .. }
            | Kind::PostDiv { parent, .. }
            | Kind::FixedFactor { parent, .. }
            | Kind::Divider { parent, .. } => vec![*parent],
            Kind::Rcg { parents, .. } => parents.clone(),
            Kind::Branch { parent, .. } | Kind::PowerDomain { parent, .. } => {
                parent.iter().copied().collect()
            }
        }
    }

    pub(crate) fn is_domain(&self) -> bool {
        matches!(self.kind, Kind::PowerDomain { .. })
    }
}

/// Resolved, validated node arena of one controller.
#[derive(Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    /// Every node after all of its possible parents.
    pub(crate) order: Vec<NodeId>,
    by_name: HashMap<&'static str, NodeId>,
    variant: Option<&'static str>,
}

impl Graph {
    /// Resolve `desc`, with `fixup` applied to its tables.
    ///
    /// `regulators` are matched by name against the nodes' vdd data.
    /// `source_rates` overrides the rate of fixed sources, typically the PHY
    /// outputs a board wires into the display controller.
    pub fn build(
        desc: &'static ControllerDesc,
        fixup: Option<&'static VariantFixup>,
        regulators: &[RegulatorHandle],
        source_rates: &[(String, u64)],
    ) -> Result<Graph> {
        let mut by_name = HashMap::new();
        for (index, node) in desc.nodes.iter().enumerate() {
            if by_name.insert(node.name, NodeId(index)).is_some() {
                return Err(ClockError::InvalidDescription(format!(
                    "{}: node {} declared twice",
                    desc.name, node.name
                )));
            }
        }

        let resolve = |node: &'static str, parent: &'static str| -> Result<NodeId> {
            by_name
                .get(parent)
                .copied()
                .ok_or(ClockError::ParentUnresolved { node })
        };

        let mut nodes = Vec::with_capacity(desc.nodes.len());
        for node in desc.nodes {
            let kind = match &node.kind {
                NodeKind::Fixed { rate } => Kind::Fixed { rate: *rate },
                NodeKind::Pll(pll) => Kind::Pll {
                    desc: pll,
                    parent: resolve(node.name, pll.parent)?,
                },
                NodeKind::PostDiv(div) => Kind::PostDiv {
                    desc: div,
                    parent: resolve(node.name, div.parent)?,
                },
                NodeKind::FixedFactor(factor) => Kind::FixedFactor {
                    desc: factor,
                    parent: resolve(node.name, factor.parent)?,
                },
                NodeKind::Divider(div) => Kind::Divider {
                    desc: div,
                    parent: resolve(node.name, div.parent)?,
                },
                NodeKind::Rcg(rcg) => {
                    let parents = rcg
                        .parent_map
                        .iter()
                        .map(|entry| resolve(node.name, entry.parent))
                        .collect::<Result<Vec<_>>>()?;
                    Kind::Rcg {
                        desc: rcg,
                        parents,
                        freq_tbl: rcg.freq_tbl,
                        entry_slots: Vec::new(),
                    }
                }
                NodeKind::Branch(branch) => Kind::Branch {
                    desc: branch,
                    parent: branch
                        .parent
                        .map(|parent| resolve(node.name, parent))
                        .transpose()?,
                },
                NodeKind::PowerDomain(gdsc) => Kind::PowerDomain {
                    desc: gdsc,
                    parent: gdsc
                        .parent
                        .map(|parent| resolve(node.name, parent))
                        .transpose()?,
                },
            };
            let vdd = match &node.vdd {
                None => None,
                Some(vdd) => {
                    let regulator = regulators
                        .iter()
                        .position(|handle| handle.name() == vdd.regulator)
                        .ok_or_else(|| {
                            ClockError::InvalidDescription(format!(
                                "{}: no regulator handle for {}",
                                node.name, vdd.regulator
                            ))
                        })?;
                    Some(Vdd {
                        regulator,
                        ceilings: vdd.rate_max.to_vec(),
                    })
                }
            };
            nodes.push(Node {
                name: node.name,
                kind,
                vdd,
            });
        }

        let mut graph = Graph {
            nodes,
            order: Vec::new(),
            by_name,
            variant: None,
        };

        if let Some(fixup) = fixup {
            variant::apply(&mut graph, fixup)?;
            graph.variant = Some(fixup.tag);
        }
        for (name, rate) in source_rates {
            let id = graph.lookup(name)?;
            match &mut graph.nodes[id.0].kind {
                Kind::Fixed { rate: fixed } => *fixed = *rate,
                _ => {
                    return Err(ClockError::InvalidDescription(format!(
                        "{} is not a fixed source",
                        name
                    )))
                }
            }
        }

        graph.resolve_entries()?;
        graph.validate()?;
        graph.order = graph.sort()?;
        Ok(graph)
    }

    pub fn lookup(&self, name: &str) -> Result<NodeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ClockError::UnknownNode(name.to_string()))
    }

    pub fn name(&self, id: NodeId) -> &'static str {
        self.nodes[id.0].name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag of the variant fixup this graph was built with.
    pub fn variant(&self) -> Option<&'static str> {
        self.variant
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut_by_name(&mut self, name: &str) -> Result<&mut Node> {
        let id = self.lookup(name)?;
        Ok(&mut self.nodes[id.0])
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Nodes that can be fed from `id`.
    #[cfg(test)]
    pub(crate) fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.ids()
            .filter(|child| self.node(*child).possible_parents().contains(&id))
            .collect()
    }

    /// Map every frequency-table entry to a parent slot.
    fn resolve_entries(&mut self) -> Result<()> {
        for node in &mut self.nodes {
            if let Kind::Rcg {
                desc,
                freq_tbl,
                entry_slots,
                ..
            } = &mut node.kind
            {
                *entry_slots = freq_tbl
                    .iter()
                    .map(|entry| {
                        desc.parent_map
                            .iter()
                            .position(|map| map.parent == entry.src)
                            .ok_or(ClockError::ParentUnresolved { node: node.name })
                    })
                    .collect::<Result<Vec<_>>>()?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let invalid = |node: &str, what: &str| {
            Err(ClockError::InvalidDescription(format!("{}: {}", node, what)))
        };

        for node in &self.nodes {
            let name = node.name;
            if let Some(vdd) = &node.vdd {
                let sorted = vdd
                    .ceilings
                    .windows(2)
                    .all(|pair| pair[0].0 < pair[1].0 && pair[0].1 <= pair[1].1);
                if !sorted {
                    return invalid(name, "corner ceilings must ascend");
                }
            }

            for parent in node.possible_parents() {
                if self.node(parent).is_domain() != node.is_domain() {
                    return invalid(name, "clocks and power domains cannot feed each other");
                }
            }

            match &node.kind {
                Kind::Pll { desc, parent } => {
                    if desc.vco.is_empty()
                        || desc.vco.iter().any(|band| band.min_rate >= band.max_rate)
                    {
                        return invalid(name, "VCO bands must be non-empty ranges");
                    }
                    if let (Some(config), Kind::Fixed { rate }) =
                        (desc.initial, &self.node(*parent).kind)
                    {
                        let initial =
                            crate::pll::rate_of(*rate, config.l, config.alpha, desc.alpha_width);
                        if *rate != 0 && crate::pll::band_for(desc.vco, initial).is_none() {
                            return invalid(name, "initial configuration outside every VCO band");
                        }
                    }
                }
                Kind::PostDiv { desc, .. } => {
                    let mask = field_mask(0, desc.width);
                    if desc.table.is_empty()
                        || desc
                            .table
                            .iter()
                            .any(|(code, div)| *div == 0 || *code & !mask != 0)
                    {
                        return invalid(name, "post-divider table entries must fit the field");
                    }
                }
                Kind::FixedFactor { desc, .. } => {
                    if desc.mult == 0 || desc.div == 0 {
                        return invalid(name, "fixed factor must be non-zero");
                    }
                }
                Kind::Rcg { desc, freq_tbl, .. } => {
                    if desc.parent_map.is_empty() {
                        return invalid(name, "RCG needs at least one parent");
                    }
                    if !freq_tbl.windows(2).all(|pair| pair[0].rate < pair[1].rate) {
                        return invalid(name, "frequency table must ascend");
                    }
                    let hid_mask = field_mask(0, desc.hid_width);
                    let mnd_mask = field_mask(0, desc.mnd_width);
                    for entry in freq_tbl.iter() {
                        if u32::from(entry.pre_div) & !hid_mask != 0 {
                            return invalid(name, "divider does not fit SRC_DIV");
                        }
                        if entry.n != 0
                            && (desc.mnd_width == 0
                                || entry.m == 0
                                || entry.m > entry.n
                                || entry.n & !mnd_mask != 0)
                        {
                            return invalid(name, "M/N entry does not fit the counter");
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Depth-first topological sort over all possible parent edges.
    fn sort(&self) -> Result<Vec<NodeId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            graph: &Graph,
            id: NodeId,
            marks: &mut [Mark],
            order: &mut Vec<NodeId>,
        ) -> Result<()> {
            match marks[id.0] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    return Err(ClockError::InvalidDescription(format!(
                        "parent cycle through {}",
                        graph.name(id)
                    )))
                }
                Mark::New => {}
            }
            marks[id.0] = Mark::Active;
            for parent in graph.node(id).possible_parents() {
                visit(graph, parent, marks, order)?;
            }
            marks[id.0] = Mark::Done;
            order.push(id);
            Ok(())
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for id in self.ids() {
            visit(self, id, &mut marks, &mut order)?;
        }
        Ok(order)
    }
}
