// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Static controller descriptions.
//!
//! A chip crate describes each clock controller as a `static`
//! [`ControllerDesc`]: every node with its type, register offsets, parents
//! (by name), frequency table and corner ceilings, plus resets, build-time
//! register tweaks and hardware-variant fixups. Descriptions are never
//! mutated; [`crate::graph::Graph::build`] resolves one into an indexed
//! arena.

use crate::corner::Corner;

/// Description of one clock controller instance.
#[derive(Debug)]
pub struct ControllerDesc {
    pub name: &'static str,
    pub nodes: &'static [NodeDesc],
    pub resets: &'static [ResetDesc],
    /// Register tweaks applied once at build, before the hardware state is
    /// read back.
    pub init: &'static [RegUpdate],
    pub variants: &'static [VariantFixup],
}

#[derive(Debug)]
pub struct NodeDesc {
    pub name: &'static str,
    pub kind: NodeKind,
    pub vdd: Option<VddDesc>,
}

/// Corner ceilings of a node on one regulator class.
#[derive(Debug)]
pub struct VddDesc {
    pub regulator: &'static str,
    /// `(corner, rate_max)` pairs in ascending corner order.
    pub rate_max: &'static [(Corner, u64)],
}

#[derive(Debug)]
pub enum NodeKind {
    /// Constant-rate source. A rate of zero means the rate is provided by the
    /// board when the controller is built.
    Fixed { rate: u64 },
    Pll(PllDesc),
    PostDiv(PostDivDesc),
    FixedFactor(FixedFactorDesc),
    Divider(DividerDesc),
    Rcg(RcgDesc),
    Branch(BranchDesc),
    PowerDomain(GdscDesc),
}

/// One contiguous VCO operating range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcoBand {
    pub min_rate: u64,
    pub max_rate: u64,
    pub band_id: u8,
}

/// Integer and fractional multiplier written by the PLL configuration
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfig {
    pub l: u32,
    pub alpha: u32,
}

/// Fabia alpha PLL.
#[derive(Debug)]
pub struct PllDesc {
    pub offset: u32,
    pub parent: &'static str,
    pub vco: &'static [VcoBand],
    pub alpha_width: u8,
    pub initial: Option<PllConfig>,
}

/// `(register code, divisor)`.
pub type DivEntry = (u32, u32);

/// PLL post-divider in the Fabia `USER_CTL` register.
#[derive(Debug)]
pub struct PostDivDesc {
    /// Base of the owning PLL block.
    pub offset: u32,
    pub parent: &'static str,
    pub shift: u8,
    pub width: u8,
    pub table: &'static [DivEntry],
    pub follows_parent: bool,
}

#[derive(Debug)]
pub struct FixedFactorDesc {
    pub parent: &'static str,
    pub mult: u32,
    pub div: u32,
    pub follows_parent: bool,
}

/// Plain register divider; the divisor is the field value plus one.
#[derive(Debug)]
pub struct DividerDesc {
    pub reg: u32,
    pub parent: &'static str,
    pub shift: u8,
    pub width: u8,
}

/// One RCG mux input.
#[derive(Debug, Clone, Copy)]
pub struct ParentMap {
    pub parent: &'static str,
    pub cfg: u8,
}

/// Frequency table entry.
///
/// `pre_div` is the half-integer divider as encoded in `CFG_RCGR.SRC_DIV`
/// (`2 * div - 1`). `m`/`n` are the M/N counter ratio, or zero when unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freq {
    pub rate: u64,
    pub src: &'static str,
    pub pre_div: u8,
    pub m: u32,
    pub n: u32,
}

/// Build a [`Freq`] from a divider given as a (possibly half-integer)
/// literal, e.g. `freq!(400_000_000, "cam_cc_pll0_out_even", 1.5)`.
#[macro_export]
macro_rules! freq {
    ($rate:expr, $src:expr, $div:expr) => {
        $crate::freq!($rate, $src, $div, 0, 0)
    };
    ($rate:expr, $src:expr, $div:expr, $m:expr, $n:expr) => {
        $crate::desc::Freq {
            rate: $rate,
            src: $src,
            pre_div: ((2.0 * ($div as f64)) - 1.0) as u8,
            m: $m,
            n: $n,
        }
    };
}

/// Display clocks whose rate is derived from a PHY-provided parent rather
/// than a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedRate {
    /// Half-integer divider off the DSI byte clock.
    Byte,
    /// Fixed set of M/N fractions off the DSI pixel clock.
    Pixel,
    /// Arbitrary 16-bit M/N off the DP VCO.
    DisplayPort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcgMode {
    /// Table lookup, programmed in place.
    ExactMatch,
    /// Table lookup, programmed only after parking on the safe source. The
    /// RCG is also parked while all its consumers are gated.
    SharedSafeSwitch,
    Derived(DerivedRate),
}

/// Root clock generator (mux + half-integer divider + optional M/N).
#[derive(Debug)]
pub struct RcgDesc {
    pub cmd_rcgr: u32,
    pub mnd_width: u8,
    pub hid_width: u8,
    pub parent_map: &'static [ParentMap],
    pub freq_tbl: &'static [Freq],
    pub mode: RcgMode,
    pub follows_parent: bool,
    pub force_enable: bool,
    /// Park on the safe source while disabled. A rate set meanwhile is
    /// only recorded and goes in on the next enable.
    pub safe_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltCheck {
    /// Poll `CLK_OFF` on both enable and disable.
    Halt,
    /// Poll on enable only; another master may keep the clock running.
    HaltVoted,
    /// No status bit; wait a fixed delay.
    Delay,
    /// No confirmation at all.
    Skip,
}

#[derive(Debug)]
pub struct BranchDesc {
    pub parent: Option<&'static str>,
    pub halt_reg: u32,
    pub halt_check: HaltCheck,
    pub enable_reg: u32,
    pub enable_mask: u32,
    /// Park the parent RCG on its safe source before gating.
    pub park_parent_on_disable: bool,
    pub follows_parent: bool,
}

impl BranchDesc {
    /// A branch whose enable and halt bits share one CBCR, the common case.
    pub const fn cbcr(parent: Option<&'static str>, cbcr: u32) -> BranchDesc {
        BranchDesc {
            parent,
            halt_reg: cbcr,
            halt_check: HaltCheck::Halt,
            enable_reg: cbcr,
            enable_mask: 1,
            park_parent_on_disable: false,
            follows_parent: parent.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStates {
    OffOn,
    OffOnRetain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdscControl {
    SoftwareControlled,
    /// A hardware state machine owns the domain; requests are advisory.
    HardwareRetained,
}

#[derive(Debug)]
pub struct GdscDesc {
    pub gdscr: u32,
    pub parent: Option<&'static str>,
    pub pwrsts: PowerStates,
    pub control: GdscControl,
    /// Hand the domain to hardware control once it is powered.
    pub hw_ctrl: bool,
    /// Poll `CFG_GDSCR` completion bits instead of `GDSCR.PWR_ON`.
    pub poll_cfg: bool,
    /// Another master may keep the domain on; do not wait for collapse.
    pub votable: bool,
    pub clamp_io_ctrl: Option<u32>,
    /// Separate status register carrying `PWR_ON`.
    pub status_reg: Option<u32>,
}

/// Block control register reset line.
#[derive(Debug)]
pub struct ResetDesc {
    pub name: &'static str,
    pub offset: u32,
    pub bit: u8,
}

impl ResetDesc {
    pub const fn bcr(name: &'static str, offset: u32) -> ResetDesc {
        ResetDesc {
            name,
            offset,
            bit: 0,
        }
    }
}

/// `update32(offset, mask, value)` applied at build.
#[derive(Debug)]
pub struct RegUpdate {
    pub offset: u32,
    pub mask: u32,
    pub value: u32,
}

/// Table overrides for one hardware variant of the base design.
#[derive(Debug)]
pub struct VariantFixup {
    pub tag: &'static str,
    /// Replacement frequency tables.
    pub freq_tables: &'static [(&'static str, &'static [Freq])],
    /// Ceiling entries to insert or replace: `(node, corner, rate_max)`.
    pub ceilings: &'static [(&'static str, Corner, u64)],
}

impl ControllerDesc {
    pub fn variant(&self, tag: &str) -> Option<&'static VariantFixup> {
        self.variants.iter().find(|fixup| fixup.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_freq_macro_encodes_half_dividers() {
        let whole = freq!(600_000_000, "pll", 1);
        assert_eq!(whole.pre_div, 1);
        let half = freq!(400_000_000, "pll", 1.5);
        assert_eq!(half.pre_div, 2);
        let mnd = freq!(8_000_000, "pll", 10, 1, 6);
        assert_eq!((mnd.pre_div, mnd.m, mnd.n), (19, 1, 6));
        let odd = freq!(73_846_154, "pll", 6.5);
        assert_eq!(odd.pre_div, 12);
    }
}
