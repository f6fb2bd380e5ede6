// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Dividers: PLL post-dividers and plain register dividers.

use crate::desc::{DividerDesc, PostDivDesc};
use crate::port::RegisterPort;
use crate::registers::{field_mask, pll};

/// Table entry whose output is the highest rate not above `rate`.
pub(crate) fn closest_below(desc: &PostDivDesc, prate: u64, rate: u64) -> Option<(u32, u32)> {
    desc.table
        .iter()
        .copied()
        .filter(|(_, div)| prate / u64::from(*div) <= rate)
        .max_by_key(|(_, div)| prate / u64::from(*div))
}

/// Divisors to try, in order, when the post-divider asks its PLL for a new
/// rate: the current one first, then the table in ascending order.
pub(crate) fn candidates(desc: &PostDivDesc, current: u32) -> Vec<(u32, u32)> {
    let mut table: Vec<(u32, u32)> = desc.table.to_vec();
    table.sort_by_key(|(_, div)| *div);
    let position = table.iter().position(|(_, div)| *div == current);
    if let Some(position) = position {
        let entry = table.remove(position);
        table.insert(0, entry);
    }
    table
}

/// Current `(code, divisor)`. An unlisted code reads as undivided.
pub(crate) fn read_postdiv(port: &dyn RegisterPort, desc: &PostDivDesc) -> (u32, u32) {
    let code = (port.read32(desc.offset + pll::USER_CTL) & field_mask(desc.shift, desc.width))
        >> desc.shift;
    desc.table
        .iter()
        .copied()
        .find(|(entry, _)| *entry == code)
        .unwrap_or((code, 1))
}

pub(crate) fn program_postdiv(port: &dyn RegisterPort, desc: &PostDivDesc, code: u32) {
    port.update32(
        desc.offset + pll::USER_CTL,
        field_mask(desc.shift, desc.width),
        code << desc.shift,
    );
}

/// Divisor whose output is closest to `rate`.
pub(crate) fn divider_for(desc: &DividerDesc, prate: u64, rate: u64) -> u32 {
    let max = u64::from(field_mask(0, desc.width)) + 1;
    if rate == 0 {
        return max as u32;
    }
    (prate.saturating_add(rate / 2) / rate).clamp(1, max) as u32
}

pub(crate) fn read_divider(port: &dyn RegisterPort, desc: &DividerDesc) -> u32 {
    ((port.read32(desc.reg) & field_mask(desc.shift, desc.width)) >> desc.shift) + 1
}

pub(crate) fn program_divider(port: &dyn RegisterPort, desc: &DividerDesc, div: u32) {
    port.update32(
        desc.reg,
        field_mask(desc.shift, desc.width),
        (div - 1) << desc.shift,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN: PostDivDesc = PostDivDesc {
        offset: 0x1000,
        parent: "pll1",
        shift: 8,
        width: 4,
        table: &[(0x0, 1), (0x1, 2), (0x3, 4), (0x7, 8)],
        follows_parent: false,
    };

    const BYTE_DIV: DividerDesc = DividerDesc {
        reg: 0x20e8,
        parent: "byte0",
        shift: 0,
        width: 2,
    };

    #[test]
    fn test_closest_below() {
        assert_eq!(closest_below(&EVEN, 960_000_000, 480_000_000), Some((0x1, 2)));
        assert_eq!(closest_below(&EVEN, 960_000_000, 300_000_000), Some((0x3, 4)));
        assert_eq!(closest_below(&EVEN, 960_000_000, 1_000_000_000), Some((0x0, 1)));
        assert_eq!(closest_below(&EVEN, 960_000_000, 100_000_000), None);
    }

    #[test]
    fn test_candidates_start_with_current() {
        assert_eq!(
            candidates(&EVEN, 4),
            vec![(0x3, 4), (0x0, 1), (0x1, 2), (0x7, 8)]
        );
    }

    #[test]
    fn test_divider_for() {
        assert_eq!(divider_for(&BYTE_DIV, 187_500_000, 93_750_000), 2);
        assert_eq!(divider_for(&BYTE_DIV, 187_500_000, 200_000_000), 1);
        assert_eq!(divider_for(&BYTE_DIV, 187_500_000, 1_000), 4);
    }
}
