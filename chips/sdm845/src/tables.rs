// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Building blocks shared by the controller tables.

use clkctl::desc::*;
use clkctl::Corner;

/// Operating ranges of the Fabia PLLs in all three controllers.
pub(crate) const FABIA_VCO: &[VcoBand] = &[
    VcoBand {
        min_rate: 249_600_000,
        max_rate: 2_000_000_000,
        band_id: 0,
    },
    VcoBand {
        min_rate: 125_000_000,
        max_rate: 1_000_000_000,
        band_id: 1,
    },
];

pub(crate) const POST_DIV_EVEN: &[DivEntry] = &[(0x0, 1), (0x1, 2), (0x3, 4), (0x7, 8)];
pub(crate) const POST_DIV_ODD: &[DivEntry] = &[(0x0, 1), (0x3, 3), (0x5, 5), (0x7, 7)];

pub(crate) const PLL_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 615_000_000),
    (Corner::Low, 1_066_000_000),
    (Corner::LowL1, 1_600_000_000),
    (Corner::Nominal, 2_000_000_000),
];

pub(crate) const XO_ONLY: &[(Corner, u64)] = &[(Corner::Min, 19_200_000)];

/// A source the controller does not produce itself. A zero rate is
/// supplied by the board.
pub(crate) const fn fixed(name: &'static str, rate: u64) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::Fixed { rate },
        vdd: None,
    }
}

/// Fabia PLL fed from the board crystal, configured at build.
pub(crate) const fn fabia_pll(
    name: &'static str,
    offset: u32,
    regulator: &'static str,
    l: u32,
    alpha: u32,
) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::Pll(PllDesc {
            offset,
            parent: "bi_tcxo",
            vco: FABIA_VCO,
            alpha_width: 16,
            initial: Some(PllConfig { l, alpha }),
        }),
        vdd: Some(VddDesc {
            regulator,
            rate_max: PLL_CEILINGS,
        }),
    }
}

pub(crate) const fn post_div(
    name: &'static str,
    parent: &'static str,
    offset: u32,
    shift: u8,
    table: &'static [DivEntry],
) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::PostDiv(PostDivDesc {
            offset,
            parent,
            shift,
            width: 4,
            table,
            follows_parent: false,
        }),
        vdd: None,
    }
}

pub(crate) const fn input(parent: &'static str, cfg: u8) -> ParentMap {
    ParentMap { parent, cfg }
}

/// RCG with a 5-bit half-integer divider that passes rate requests up to
/// its parent.
pub(crate) const fn rcg(
    cmd_rcgr: u32,
    mnd_width: u8,
    parent_map: &'static [ParentMap],
    freq_tbl: &'static [Freq],
    mode: RcgMode,
) -> RcgDesc {
    RcgDesc {
        cmd_rcgr,
        mnd_width,
        hid_width: 5,
        parent_map,
        freq_tbl,
        mode,
        follows_parent: true,
        force_enable: false,
        safe_config: false,
    }
}

pub(crate) const fn rcg_node(
    name: &'static str,
    desc: RcgDesc,
    regulator: &'static str,
    rate_max: &'static [(Corner, u64)],
) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::Rcg(desc),
        vdd: Some(VddDesc {
            regulator,
            rate_max,
        }),
    }
}

pub(crate) const fn gate(name: &'static str, desc: BranchDesc) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::Branch(desc),
        vdd: None,
    }
}

/// Branch that passes rate requests to `parent`.
pub(crate) const fn branch(name: &'static str, parent: &'static str, cbcr: u32) -> NodeDesc {
    gate(name, BranchDesc::cbcr(Some(parent), cbcr))
}

/// Branch that runs at whatever rate `parent` is set to.
pub(crate) const fn tap(name: &'static str, parent: &'static str, cbcr: u32) -> NodeDesc {
    gate(
        name,
        BranchDesc {
            follows_parent: false,
            ..BranchDesc::cbcr(Some(parent), cbcr)
        },
    )
}

/// Branch fed from outside the controller, typically a bus clock.
pub(crate) const fn bus_branch(name: &'static str, cbcr: u32) -> NodeDesc {
    gate(name, BranchDesc::cbcr(None, cbcr))
}

/// Branch under a shared RCG, which is parked on the crystal once its last
/// branch is gated.
pub(crate) const fn parking_branch(
    name: &'static str,
    parent: &'static str,
    cbcr: u32,
) -> NodeDesc {
    gate(
        name,
        BranchDesc {
            park_parent_on_disable: true,
            ..BranchDesc::cbcr(Some(parent), cbcr)
        },
    )
}

/// Software-collapsible domain with no extra behavior.
pub(crate) const fn gdscr(gdscr: u32) -> GdscDesc {
    GdscDesc {
        gdscr,
        parent: None,
        pwrsts: PowerStates::OffOn,
        control: GdscControl::SoftwareControlled,
        hw_ctrl: false,
        poll_cfg: false,
        votable: false,
        clamp_io_ctrl: None,
        status_reg: None,
    }
}

pub(crate) const fn domain(name: &'static str, desc: GdscDesc) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::PowerDomain(desc),
        vdd: None,
    }
}
