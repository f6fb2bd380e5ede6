// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Root clock generator.
//!
//! An RCG muxes one of its parents through a half-integer divider (`SRC_DIV`
//! holds `2 * div - 1`) and, when it has one, an M/N counter. Writes to
//! `CFG_RCGR` and the M/N/D registers are staged until `CMD_RCGR.UPDATE` is
//! set; the hardware clears the bit once the new configuration is live.
//!
//! Rate selection is a table lookup for most RCGs. Display RCGs derive their
//! configuration from the rate of a PHY-provided parent instead, see
//! [`byte_divider`], [`PIXEL_FRACTIONS`] and [`best_ratio`].

use crate::config::CONFIG;
use crate::desc::{Freq, RcgDesc};
use crate::error::{ClockError, Result};
use crate::port::RegisterPort;
use crate::registers::{field_mask, rcg, CfgRcgrVal, CFG_RCGR, CMD_RCGR};
use crate::state::RcgSetting;

/// `(m, n)` fractions tried, in order, for a DSI pixel clock.
pub(crate) const PIXEL_FRACTIONS: [(u32, u32); 5] = [(3, 8), (2, 9), (4, 9), (1, 1), (2, 3)];

/// Build a setting, folding an `m == n` ratio into M/N bypass.
pub(crate) fn setting(slot: usize, pre_div: u8, m: u32, n: u32) -> RcgSetting {
    let (m, n) = if m == n { (0, 0) } else { (m, n) };
    RcgSetting { slot, pre_div, m, n }
}

/// Output rate for `setting` off a parent running at `prate`.
pub(crate) fn rate_of(prate: u64, setting: &RcgSetting) -> u64 {
    let mut rate = prate;
    if setting.pre_div != 0 {
        rate = rate * 2 / (u64::from(setting.pre_div) + 1);
    }
    if setting.n != 0 {
        rate = (u128::from(rate) * u128::from(setting.m) / u128::from(setting.n)) as u64;
    }
    rate
}

/// Index of the lowest entry at or above `rate`, or the highest entry when
/// `rate` exceeds the whole table.
pub(crate) fn select_entry(freq_tbl: &[Freq], rate: u64) -> Option<usize> {
    if freq_tbl.is_empty() {
        return None;
    }
    Some(
        freq_tbl
            .iter()
            .position(|entry| entry.rate >= rate)
            .unwrap_or(freq_tbl.len() - 1),
    )
}

/// Rate to ask of the parent so that `entry` comes out exactly.
pub(crate) fn parent_request(entry: &Freq) -> u64 {
    let mut rate = entry.rate;
    if entry.pre_div != 0 {
        rate /= 2;
        rate *= u64::from(entry.pre_div) + 1;
    }
    if entry.n != 0 {
        rate = (u128::from(rate) * u128::from(entry.n) / u128::from(entry.m)) as u64;
    }
    rate
}

/// `SRC_DIV` value that brings `prate` down to at most `rate`.
pub(crate) fn byte_divider(prate: u64, rate: u64, hid_width: u8) -> u8 {
    let div = (2 * prate).div_ceil(rate).saturating_sub(1);
    div.min(u64::from(field_mask(0, hid_width))) as u8
}

/// Best rational approximation of `num / den` with both terms bounded.
///
/// Walks the continued-fraction convergents and, once the next one would
/// exceed a bound, picks the closest semi-convergent instead.
pub(crate) fn best_ratio(num: u64, den: u64, max_num: u64, max_den: u64) -> (u64, u64) {
    let (mut n, mut d) = (num, den);
    let (mut n0, mut d0) = (0u64, 1u64);
    let (mut n1, mut d1) = (1u64, 0u64);

    while d != 0 {
        let a = n / d;
        let dp = d;
        d = n % d;
        n = dp;

        let n2 = n0 + a * n1;
        let d2 = d0 + a * d1;
        if n2 > max_num || d2 > max_den {
            let mut t = u64::MAX;
            if d1 != 0 {
                t = (max_den - d0) / d1;
            }
            if n1 != 0 {
                t = t.min((max_num - n0) / n1);
            }
            let closer = u128::from(d0) * u128::from(dp) > u128::from(d1) * u128::from(d);
            if d1 == 0 || 2 * t > a || (2 * t == a && closer) {
                n1 = n0 + t * n1;
                d1 = d0 + t * d1;
            }
            break;
        }
        n0 = n1;
        n1 = n2;
        d0 = d1;
        d1 = d2;
    }
    (n1, d1)
}

/// Decode the live configuration. `None` when `SRC_SEL` names no parent.
pub(crate) fn read_setting(port: &dyn RegisterPort, desc: &RcgDesc) -> Option<RcgSetting> {
    let cfg = CfgRcgrVal::new(port.read32(desc.cmd_rcgr + rcg::CFG));
    let code = cfg.read(CFG_RCGR::SRC_SEL);
    let slot = desc
        .parent_map
        .iter()
        .position(|map| u32::from(map.cfg) == code)?;
    let pre_div = (cfg.read(CFG_RCGR::SRC_DIV) & field_mask(0, desc.hid_width)) as u8;

    let (m, n) = if desc.mnd_width != 0 && cfg.matches_all(CFG_RCGR::MODE::DualEdge) {
        let mask = field_mask(0, desc.mnd_width);
        let m = port.read32(desc.cmd_rcgr + rcg::M) & mask;
        let n = (!port.read32(desc.cmd_rcgr + rcg::N) & mask) + m;
        (m, n)
    } else {
        (0, 0)
    };
    Some(setting(slot, pre_div, m, n))
}

/// Program `setting` in place and latch it.
pub(crate) fn configure(
    port: &dyn RegisterPort,
    desc: &RcgDesc,
    setting: &RcgSetting,
) -> Result<()> {
    let base = desc.cmd_rcgr;
    let dual_edge = desc.mnd_width != 0 && setting.n != 0;
    if dual_edge {
        let mask = field_mask(0, desc.mnd_width);
        port.update32(base + rcg::M, mask, setting.m);
        port.update32(base + rcg::N, mask, !(setting.n - setting.m));
        port.update32(base + rcg::D, mask, !setting.n);
    }

    let code = u32::from(desc.parent_map[setting.slot].cfg);
    let mut cfg = CFG_RCGR::SRC_DIV.val(u32::from(setting.pre_div)) + CFG_RCGR::SRC_SEL.val(code);
    if dual_edge {
        cfg += CFG_RCGR::MODE::DualEdge;
    }
    port.update32(base + rcg::CFG, cfg_mask(desc), cfg.value);
    update(port, desc)
}

/// Switch to the safe source (parent slot 0, undivided) and latch it.
pub(crate) fn park(port: &dyn RegisterPort, desc: &RcgDesc) -> Result<()> {
    let code = u32::from(desc.parent_map[0].cfg);
    port.update32(
        desc.cmd_rcgr + rcg::CFG,
        cfg_mask(desc),
        CFG_RCGR::SRC_SEL.val(code).value,
    );
    update(port, desc)
}

/// Reprogram through the safe source so downstream consumers never see an
/// intermediate configuration.
pub(crate) fn safe_switch(
    port: &dyn RegisterPort,
    desc: &RcgDesc,
    setting: &RcgSetting,
) -> Result<()> {
    park(port, desc)?;
    configure(port, desc, setting)
}

/// Keep the root running regardless of its downstream branches.
pub(crate) fn force_enable(
    port: &dyn RegisterPort,
    desc: &RcgDesc,
    node: &'static str,
) -> Result<()> {
    let cmd = desc.cmd_rcgr + rcg::CMD;
    let root_en = CMD_RCGR::ROOT_EN::SET.value;
    port.update32(cmd, root_en, root_en);
    port.poll32(cmd, CMD_RCGR::ROOT_OFF::SET.value, 0, CONFIG.rcg_update_timeout)
        .map_err(|timeout| ClockError::EnableTimeout {
            node,
            offset: cmd,
            last: timeout.last,
        })
}

pub(crate) fn force_disable(port: &dyn RegisterPort, desc: &RcgDesc) {
    port.update32(desc.cmd_rcgr + rcg::CMD, CMD_RCGR::ROOT_EN::SET.value, 0);
}

fn cfg_mask(desc: &RcgDesc) -> u32 {
    field_mask(0, desc.hid_width)
        | CFG_RCGR::SRC_SEL.mask << CFG_RCGR::SRC_SEL.shift
        | CFG_RCGR::MODE.mask << CFG_RCGR::MODE.shift
        | CFG_RCGR::HW_CLK_CTRL::SET.value
}

fn update(port: &dyn RegisterPort, desc: &RcgDesc) -> Result<()> {
    let cmd = desc.cmd_rcgr + rcg::CMD;
    let bit = CMD_RCGR::UPDATE::SET.value;
    port.update32(cmd, bit, bit);
    port.poll32(cmd, bit, 0, CONFIG.rcg_update_timeout)
        .map_err(|timeout| ClockError::RegisterTimeout {
            offset: cmd,
            last: timeout.last,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freq;

    const TABLE: &[Freq] = &[
        freq!(19_200_000, "bi_tcxo", 1),
        freq!(100_000_000, "pll0", 6),
        freq!(200_000_000, "pll0", 3),
        freq!(600_000_000, "pll0", 1),
    ];

    #[test]
    fn test_select_rounds_up() {
        assert_eq!(select_entry(TABLE, 150_000_000), Some(2));
        assert_eq!(select_entry(TABLE, 200_000_000), Some(2));
        assert_eq!(select_entry(TABLE, 1), Some(0));
    }

    #[test]
    fn test_select_clamps_to_highest() {
        assert_eq!(select_entry(TABLE, 900_000_000), Some(3));
        assert_eq!(select_entry(&[], 900_000_000), None);
    }

    #[test]
    fn test_parent_request_undoes_dividers() {
        assert_eq!(parent_request(&TABLE[2]), 600_000_000);
        assert_eq!(parent_request(&freq!(400_000_000, "pll0", 1.5)), 600_000_000);
        assert_eq!(parent_request(&freq!(8_000_000, "pll2", 10, 1, 6)), 480_000_000);
    }

    #[test]
    fn test_rate_of_applies_divider_then_mnd() {
        let mclk = setting(0, 19, 1, 6);
        assert_eq!(rate_of(960_000_000, &mclk), 16_000_000);
        let half = setting(0, 2, 0, 0);
        assert_eq!(rate_of(600_000_000, &half), 400_000_000);
    }

    #[test]
    fn test_equal_mn_means_bypass() {
        assert_eq!(setting(1, 0, 4, 4), RcgSetting { slot: 1, pre_div: 0, m: 0, n: 0 });
    }

    #[test]
    fn test_byte_divider() {
        assert_eq!(byte_divider(187_500_000, 187_500_000, 5), 1);
        assert_eq!(byte_divider(375_000_000, 187_500_000, 5), 3);
        assert_eq!(byte_divider(375_000_000, 1, 5), 31);
    }

    #[test]
    fn test_best_ratio() {
        assert_eq!(best_ratio(810_000_000, 675_000_000, 0xffff, 0xffff), (6, 5));
        assert_eq!(best_ratio(3, 1, 0xffff, 0xffff), (3, 1));
        let (num, den) = best_ratio(1_000_000_007, 3, 0xffff, 0xffff);
        assert!(num <= 0xffff && den <= 0xffff && den != 0);
    }
}
