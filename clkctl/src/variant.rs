// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Hardware-variant fixups.
//!
//! A derivative chip reuses the base controller description and patches a
//! few frequency tables and corner ceilings. The patch is applied to the
//! resolved [`Graph`] while it is built, so the static description is never
//! modified and one process can host base and variant instances side by
//! side.

use crate::corner::Corner;
use crate::desc::VariantFixup;
use crate::error::{ClockError, Result};
use crate::graph::{Graph, Kind};

/// Apply `fixup` to a graph that is still being built.
pub(crate) fn apply(graph: &mut Graph, fixup: &'static VariantFixup) -> Result<()> {
    let rejected = |reason| ClockError::VariantRejected {
        tag: fixup.tag.to_string(),
        reason,
    };

    for (name, table) in fixup.freq_tables.iter() {
        let node = graph
            .node_mut_by_name(name)
            .map_err(|_| rejected("frequency table for an unknown node"))?;
        match &mut node.kind {
            Kind::Rcg { freq_tbl, .. } => *freq_tbl = *table,
            _ => return Err(rejected("frequency table for a node that is not an RCG")),
        }
    }

    for (name, corner, rate_max) in fixup.ceilings.iter() {
        let node = graph
            .node_mut_by_name(name)
            .map_err(|_| rejected("ceiling for an unknown node"))?;
        let vdd = node
            .vdd
            .as_mut()
            .ok_or_else(|| rejected("ceiling for a node without corner data"))?;
        set_ceiling(&mut vdd.ceilings, *corner, *rate_max);
    }
    Ok(())
}

/// Insert or replace the ceiling of `corner`, keeping corner order.
fn set_ceiling(ceilings: &mut Vec<(Corner, u64)>, corner: Corner, rate_max: u64) {
    match ceilings.binary_search_by_key(&corner, |(c, _)| *c) {
        Ok(index) => ceilings[index].1 = rate_max,
        Err(index) => ceilings.insert(index, (corner, rate_max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_replaced_in_place() {
        let mut ceilings = vec![(Corner::Min, 19_200_000), (Corner::Lower, 300_000_000)];
        set_ceiling(&mut ceilings, Corner::Lower, 384_000_000);
        assert_eq!(
            ceilings,
            vec![(Corner::Min, 19_200_000), (Corner::Lower, 384_000_000)]
        );
    }

    #[test]
    fn test_ceiling_inserted_in_corner_order() {
        let mut ceilings = vec![(Corner::Min, 19_200_000), (Corner::Nominal, 600_000_000)];
        set_ceiling(&mut ceilings, Corner::LowL1, 480_000_000);
        set_ceiling(&mut ceilings, Corner::High, 700_000_000);
        assert_eq!(
            ceilings,
            vec![
                (Corner::Min, 19_200_000),
                (Corner::LowL1, 480_000_000),
                (Corner::Nominal, 600_000_000),
                (Corner::High, 700_000_000),
            ]
        );
    }
}
