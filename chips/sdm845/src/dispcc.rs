// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Display clock controller (dispcc).
//!
//! The byte, pixel and DisplayPort roots run off clocks produced by the
//! DSI and DP PHYs. Their rates are supplied by the board through
//! [`clkctl::ControllerBuilder::source_rate`], and the roots derive their
//! dividers from whichever PHY output they currently select. MDP and the
//! rotator use ordinary tables over the display PLL and GCC's GPLL0 taps.

use clkctl::desc::*;
use clkctl::{freq, Corner};

use crate::tables::*;
use crate::vdd::VDD_CX;

const MAP_0: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("dsi0_phy_pll_out_byteclk", 1),
    input("dsi1_phy_pll_out_byteclk", 2),
];

const MAP_1: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("dp_link_clk_divsel_ten", 1),
    input("dp_vco_divided_clk_src_mux", 2),
];

const MAP_2: &[ParentMap] = &[input("bi_tcxo", 0)];

const MAP_3: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("disp_cc_pll0", 1),
    input("gcc_disp_gpll0_clk_src", 4),
    input("gcc_disp_gpll0_div_clk_src", 5),
];

const MAP_4: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("dsi0_phy_pll_out_dsiclk", 1),
    input("dsi1_phy_pll_out_dsiclk", 2),
];

const XO_TBL: &[Freq] = &[freq!(19_200_000, "bi_tcxo", 1)];

const MDP_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(85_714_286, "gcc_disp_gpll0_clk_src", 7),
    freq!(100_000_000, "gcc_disp_gpll0_clk_src", 6),
    freq!(150_000_000, "gcc_disp_gpll0_clk_src", 4),
    freq!(165_000_000, "disp_cc_pll0", 2.5),
    freq!(200_000_000, "gcc_disp_gpll0_clk_src", 3),
    freq!(275_000_000, "disp_cc_pll0", 1.5),
    freq!(300_000_000, "gcc_disp_gpll0_clk_src", 2),
    freq!(412_500_000, "disp_cc_pll0", 1),
];

const ROT_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(165_000_000, "disp_cc_pll0", 2.5),
    freq!(300_000_000, "gcc_disp_gpll0_clk_src", 2),
    freq!(412_500_000, "disp_cc_pll0", 1),
];

const MDP_TBL_SDM670: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(85_714_286, "gcc_disp_gpll0_clk_src", 7),
    freq!(100_000_000, "gcc_disp_gpll0_clk_src", 6),
    freq!(150_000_000, "gcc_disp_gpll0_clk_src", 4),
    freq!(171_428_571, "gcc_disp_gpll0_clk_src", 3.5),
    freq!(200_000_000, "gcc_disp_gpll0_clk_src", 3),
    freq!(286_666_667, "disp_cc_pll0", 3),
    freq!(300_000_000, "gcc_disp_gpll0_clk_src", 2),
    freq!(344_000_000, "disp_cc_pll0", 2.5),
    freq!(430_000_000, "disp_cc_pll0", 2),
];

const ROT_TBL_SDM670: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(171_428_571, "gcc_disp_gpll0_clk_src", 3.5),
    freq!(300_000_000, "gcc_disp_gpll0_clk_src", 2),
    freq!(344_000_000, "disp_cc_pll0", 2.5),
    freq!(430_000_000, "disp_cc_pll0", 2),
];

const BYTE_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 150_000_000),
    (Corner::Low, 240_000_000),
    (Corner::LowL1, 262_500_000),
    (Corner::Nominal, 358_000_000),
];

const DP_PIXEL_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 202_500_000),
    (Corner::Low, 296_735_000),
    (Corner::LowL1, 675_000_000),
];

/// Shared by mdp and rot.
const MDP_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 165_000_000),
    (Corner::Low, 300_000_000),
    (Corner::Nominal, 412_500_000),
];

const PCLK_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 184_000_000),
    (Corner::Low, 295_000_000),
    (Corner::LowL1, 350_000_000),
    (Corner::Nominal, 571_428_571),
];

const fn derived(
    cmd_rcgr: u32,
    mnd_width: u8,
    parent_map: &'static [ParentMap],
    rate: DerivedRate,
) -> RcgDesc {
    rcg(cmd_rcgr, mnd_width, parent_map, &[], RcgMode::Derived(rate))
}

const fn xo_rcg(cmd_rcgr: u32, parent_map: &'static [ParentMap]) -> RcgDesc {
    rcg(cmd_rcgr, 0, parent_map, XO_TBL, RcgMode::ExactMatch)
}

/// Two-bit divider behind a DSI byte root, feeding the interface clock.
const fn byte_div(name: &'static str, parent: &'static str, reg: u32) -> NodeDesc {
    NodeDesc {
        name,
        kind: NodeKind::Divider(DividerDesc {
            reg,
            parent,
            shift: 0,
            width: 2,
        }),
        vdd: None,
    }
}

const NODES: &[NodeDesc] = &[
    fixed("bi_tcxo", 19_200_000),
    fixed("gcc_disp_gpll0_clk_src", 600_000_000),
    fixed("gcc_disp_gpll0_div_clk_src", 300_000_000),
    fixed("dsi0_phy_pll_out_byteclk", 0),
    fixed("dsi1_phy_pll_out_byteclk", 0),
    fixed("dsi0_phy_pll_out_dsiclk", 0),
    fixed("dsi1_phy_pll_out_dsiclk", 0),
    fixed("dp_link_clk_divsel_ten", 0),
    fixed("dp_vco_divided_clk_src_mux", 0),
    fabia_pll("disp_cc_pll0", 0x0, VDD_CX, 0x2c, 0xcaaa),
    // Roots.
    rcg_node(
        "disp_cc_mdss_byte0_clk_src",
        derived(0x20d0, 0, MAP_0, DerivedRate::Byte),
        VDD_CX,
        BYTE_CEILINGS,
    ),
    rcg_node(
        "disp_cc_mdss_byte1_clk_src",
        derived(0x20ec, 0, MAP_0, DerivedRate::Byte),
        VDD_CX,
        BYTE_CEILINGS,
    ),
    byte_div("disp_cc_mdss_byte0_div_clk_src", "disp_cc_mdss_byte0_clk_src", 0x20e8),
    byte_div("disp_cc_mdss_byte1_div_clk_src", "disp_cc_mdss_byte1_clk_src", 0x2104),
    rcg_node("disp_cc_mdss_dp_aux_clk_src", xo_rcg(0x219c, MAP_2), VDD_CX, XO_ONLY),
    rcg_node(
        "disp_cc_mdss_dp_crypto_clk_src",
        derived(0x2154, 0, MAP_1, DerivedRate::Byte),
        VDD_CX,
        &[
            (Corner::Min, 12_800_000),
            (Corner::Lower, 108_000_000),
            (Corner::Low, 180_000_000),
            (Corner::LowL1, 360_000_000),
            (Corner::Nominal, 540_000_000),
        ],
    ),
    rcg_node(
        "disp_cc_mdss_dp_link_clk_src",
        derived(0x2138, 0, MAP_1, DerivedRate::Byte),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 162_000_000),
            (Corner::Low, 270_000_000),
            (Corner::LowL1, 540_000_000),
            (Corner::Nominal, 810_000_000),
        ],
    ),
    rcg_node(
        "disp_cc_mdss_dp_pixel_clk_src",
        derived(0x216c, 16, MAP_1, DerivedRate::DisplayPort),
        VDD_CX,
        DP_PIXEL_CEILINGS,
    ),
    rcg_node(
        "disp_cc_mdss_dp_pixel1_clk_src",
        derived(0x2184, 16, MAP_1, DerivedRate::DisplayPort),
        VDD_CX,
        DP_PIXEL_CEILINGS,
    ),
    rcg_node("disp_cc_mdss_esc0_clk_src", xo_rcg(0x2108, MAP_0), VDD_CX, XO_ONLY),
    rcg_node(
        "disp_cc_mdss_esc1_clk_src",
        RcgDesc {
            follows_parent: false,
            ..xo_rcg(0x2120, MAP_0)
        },
        VDD_CX,
        XO_ONLY,
    ),
    rcg_node(
        "disp_cc_mdss_mdp_clk_src",
        rcg(0x2088, 0, MAP_3, MDP_TBL, RcgMode::SharedSafeSwitch),
        VDD_CX,
        MDP_CEILINGS,
    ),
    rcg_node(
        "disp_cc_mdss_pclk0_clk_src",
        derived(0x2058, 8, MAP_4, DerivedRate::Pixel),
        VDD_CX,
        PCLK_CEILINGS,
    ),
    rcg_node(
        "disp_cc_mdss_pclk1_clk_src",
        derived(0x2070, 8, MAP_4, DerivedRate::Pixel),
        VDD_CX,
        PCLK_CEILINGS,
    ),
    rcg_node(
        "disp_cc_mdss_rot_clk_src",
        rcg(0x20a0, 0, MAP_3, ROT_TBL, RcgMode::SharedSafeSwitch),
        VDD_CX,
        MDP_CEILINGS,
    ),
    rcg_node("disp_cc_mdss_vsync_clk_src", xo_rcg(0x20b8, MAP_2), VDD_CX, XO_ONLY),
    // Branches.
    bus_branch("disp_cc_mdss_ahb_clk", 0x4004),
    bus_branch("disp_cc_mdss_axi_clk", 0x4008),
    branch("disp_cc_mdss_byte0_clk", "disp_cc_mdss_byte0_clk_src", 0x2028),
    branch("disp_cc_mdss_byte0_intf_clk", "disp_cc_mdss_byte0_div_clk_src", 0x202c),
    branch("disp_cc_mdss_byte1_clk", "disp_cc_mdss_byte1_clk_src", 0x2030),
    branch("disp_cc_mdss_byte1_intf_clk", "disp_cc_mdss_byte1_div_clk_src", 0x2034),
    branch("disp_cc_mdss_dp_aux_clk", "disp_cc_mdss_dp_aux_clk_src", 0x2054),
    branch("disp_cc_mdss_dp_crypto_clk", "disp_cc_mdss_dp_crypto_clk_src", 0x2048),
    branch("disp_cc_mdss_dp_link_clk", "disp_cc_mdss_dp_link_clk_src", 0x2040),
    tap("disp_cc_mdss_dp_link_intf_clk", "disp_cc_mdss_dp_link_clk_src", 0x2044),
    branch("disp_cc_mdss_dp_pixel1_clk", "disp_cc_mdss_dp_pixel1_clk_src", 0x2050),
    branch("disp_cc_mdss_dp_pixel_clk", "disp_cc_mdss_dp_pixel_clk_src", 0x204c),
    branch("disp_cc_mdss_esc0_clk", "disp_cc_mdss_esc0_clk_src", 0x2038),
    branch("disp_cc_mdss_esc1_clk", "disp_cc_mdss_esc1_clk_src", 0x203c),
    parking_branch("disp_cc_mdss_mdp_clk", "disp_cc_mdss_mdp_clk_src", 0x200c),
    gate(
        "disp_cc_mdss_mdp_lut_clk",
        BranchDesc {
            follows_parent: false,
            park_parent_on_disable: true,
            ..BranchDesc::cbcr(Some("disp_cc_mdss_mdp_clk_src"), 0x201c)
        },
    ),
    branch("disp_cc_mdss_pclk0_clk", "disp_cc_mdss_pclk0_clk_src", 0x2004),
    branch("disp_cc_mdss_pclk1_clk", "disp_cc_mdss_pclk1_clk_src", 0x2008),
    parking_branch("disp_cc_mdss_rot_clk", "disp_cc_mdss_rot_clk_src", 0x2014),
    bus_branch("disp_cc_mdss_rscc_ahb_clk", 0x5004),
    branch("disp_cc_mdss_rscc_vsync_clk", "disp_cc_mdss_vsync_clk_src", 0x5008),
    branch("disp_cc_mdss_vsync_clk", "disp_cc_mdss_vsync_clk_src", 0x2024),
    domain(
        "mdss_gdsc",
        GdscDesc {
            hw_ctrl: true,
            poll_cfg: true,
            ..gdscr(0x3000)
        },
    ),
];

const SDM670: VariantFixup = VariantFixup {
    tag: crate::SDM670,
    freq_tables: &[
        ("disp_cc_mdss_mdp_clk_src", MDP_TBL_SDM670),
        ("disp_cc_mdss_rot_clk_src", ROT_TBL_SDM670),
    ],
    ceilings: &[
        ("disp_cc_mdss_byte0_clk_src", Corner::Lower, 180_000_000),
        ("disp_cc_mdss_byte0_clk_src", Corner::Low, 275_000_000),
        ("disp_cc_mdss_byte0_clk_src", Corner::LowL1, 358_000_000),
        ("disp_cc_mdss_byte1_clk_src", Corner::Lower, 180_000_000),
        ("disp_cc_mdss_byte1_clk_src", Corner::Low, 275_000_000),
        ("disp_cc_mdss_byte1_clk_src", Corner::LowL1, 358_000_000),
        ("disp_cc_mdss_dp_pixel_clk_src", Corner::Low, 337_500_000),
        ("disp_cc_mdss_dp_pixel1_clk_src", Corner::Low, 337_500_000),
        ("disp_cc_mdss_mdp_clk_src", Corner::Lower, 171_428_571),
        ("disp_cc_mdss_mdp_clk_src", Corner::LowL1, 344_000_000),
        ("disp_cc_mdss_mdp_clk_src", Corner::Nominal, 430_000_000),
        ("disp_cc_mdss_pclk0_clk_src", Corner::Lower, 280_000_000),
        ("disp_cc_mdss_pclk0_clk_src", Corner::Low, 430_000_000),
        ("disp_cc_mdss_pclk0_clk_src", Corner::LowL1, 430_000_000),
        ("disp_cc_mdss_pclk1_clk_src", Corner::Lower, 280_000_000),
        ("disp_cc_mdss_pclk1_clk_src", Corner::Low, 430_000_000),
        ("disp_cc_mdss_pclk1_clk_src", Corner::LowL1, 430_000_000),
        ("disp_cc_mdss_rot_clk_src", Corner::Lower, 171_428_571),
        ("disp_cc_mdss_rot_clk_src", Corner::LowL1, 344_000_000),
        ("disp_cc_mdss_rot_clk_src", Corner::Nominal, 430_000_000),
    ],
};

/// Display clock controller. Votes on `vdd_cx` only.
pub static DISP_CC: ControllerDesc = ControllerDesc {
    name: "disp_cc",
    nodes: NODES,
    resets: &[ResetDesc::bcr("disp_cc_mdss_rscc_bcr", 0x5000)],
    // Keep the MDSS core clocks running across MDSS power collapse.
    init: &[RegUpdate {
        offset: 0x8000,
        mask: 0x7f0,
        value: 0x7f0,
    }],
    variants: &[SDM670],
};
