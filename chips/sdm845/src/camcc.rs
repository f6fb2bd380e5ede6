// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Camera clock controller (camcc).
//!
//! Four Fabia PLLs feed the camera pipeline RCGs through their even
//! post-dividers; PLL2 also has an odd output used by the LRME and CSID
//! roots. The RCGs that clock camera memories are shared RCGs: they switch
//! through the crystal when reprogrammed and are parked on it once their
//! last branch is gated, so the memories power down cleanly. The other
//! table RCGs sit on the crystal whenever they are disabled.
//!
//! ```text
//! bi_tcxo -> cam_cc_pll0 -> cam_cc_pll0_out_even --+
//!         -> cam_cc_pll1 -> cam_cc_pll1_out_even --+
//!         -> cam_cc_pll2 -> cam_cc_pll2_out_even --+--> *_clk_src -> branches
//!                        -> cam_cc_pll2_out_odd ---+
//!         -> cam_cc_pll3 -> cam_cc_pll3_out_even --+
//! ```

use clkctl::desc::*;
use clkctl::{freq, Corner};

use crate::tables::*;
use crate::vdd::{VDD_CX, VDD_MX};

const MAP_0: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("cam_cc_pll2_out_even", 1),
    input("cam_cc_pll1_out_even", 2),
    input("cam_cc_pll3_out_even", 5),
    input("cam_cc_pll0_out_even", 6),
];

const MAP_1: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("cam_cc_pll2_out_even", 1),
    input("cam_cc_pll1_out_even", 2),
    input("cam_cc_pll2_out_odd", 4),
    input("cam_cc_pll3_out_even", 5),
    input("cam_cc_pll0_out_even", 6),
];

const BPS_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(200_000_000, "cam_cc_pll0_out_even", 3),
    freq!(404_000_000, "cam_cc_pll1_out_even", 2),
    freq!(480_000_000, "cam_cc_pll2_out_even", 1),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const CCI_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(37_500_000, "cam_cc_pll0_out_even", 16),
    freq!(50_000_000, "cam_cc_pll0_out_even", 12),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
];

const CPHY_RX_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(384_000_000, "cam_cc_pll3_out_even", 1),
];

const CSIPHYTIMER_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(240_000_000, "cam_cc_pll2_out_even", 2),
    freq!(269_333_333, "cam_cc_pll1_out_even", 3),
];

const FAST_AHB_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(50_000_000, "cam_cc_pll0_out_even", 12),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(200_000_000, "cam_cc_pll0_out_even", 3),
    freq!(300_000_000, "cam_cc_pll0_out_even", 2),
    freq!(400_000_000, "cam_cc_pll0_out_even", 1.5),
];

const FD_CORE_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(384_000_000, "cam_cc_pll3_out_even", 1),
    freq!(400_000_000, "cam_cc_pll0_out_even", 1.5),
    freq!(538_666_667, "cam_cc_pll1_out_even", 1.5),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const ICP_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(320_000_000, "cam_cc_pll2_out_even", 1.5),
    freq!(400_000_000, "cam_cc_pll0_out_even", 1.5),
    freq!(538_666_667, "cam_cc_pll1_out_even", 1.5),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const IFE_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(320_000_000, "cam_cc_pll2_out_even", 1.5),
    freq!(404_000_000, "cam_cc_pll1_out_even", 2),
    freq!(480_000_000, "cam_cc_pll2_out_even", 1),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const CSID_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(75_000_000, "cam_cc_pll0_out_even", 8),
    freq!(384_000_000, "cam_cc_pll3_out_even", 1),
    freq!(538_666_667, "cam_cc_pll1_out_even", 1.5),
];

const IPE_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(240_000_000, "cam_cc_pll0_out_even", 2.5),
    freq!(404_000_000, "cam_cc_pll1_out_even", 2),
    freq!(480_000_000, "cam_cc_pll2_out_even", 1),
    freq!(538_666_667, "cam_cc_pll1_out_even", 1.5),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const LRME_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(200_000_000, "cam_cc_pll0_out_even", 3),
    freq!(384_000_000, "cam_cc_pll2_out_odd", 2.5),
    freq!(480_000_000, "cam_cc_pll2_out_even", 1),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const MCLK_TBL: &[Freq] = &[
    freq!(8_000_000, "cam_cc_pll2_out_even", 10, 1, 6),
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(24_000_000, "cam_cc_pll2_out_even", 10, 1, 2),
    freq!(33_333_333, "cam_cc_pll0_out_even", 2, 1, 9),
    freq!(34_285_714, "cam_cc_pll2_out_even", 14),
];

const SLOW_AHB_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(60_000_000, "cam_cc_pll0_out_even", 10),
    freq!(66_666_667, "cam_cc_pll0_out_even", 9),
    freq!(73_846_154, "cam_cc_pll2_out_even", 6.5),
    freq!(80_000_000, "cam_cc_pll2_out_even", 6),
];

const ICP_TBL_SDM670: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(384_000_000, "cam_cc_pll3_out_even", 1),
    freq!(400_000_000, "cam_cc_pll0_out_even", 1.5),
    freq!(538_666_667, "cam_cc_pll1_out_even", 1.5),
    freq!(600_000_000, "cam_cc_pll0_out_even", 1),
];

const LRME_TBL_SDM670: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "cam_cc_pll0_out_even", 6),
    freq!(200_000_000, "cam_cc_pll0_out_even", 3),
    freq!(269_333_333, "cam_cc_pll1_out_even", 3),
    freq!(320_000_000, "cam_cc_pll2_out_even", 1.5),
    freq!(400_000_000, "cam_cc_pll0_out_even", 1.5),
];

const BPS_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 200_000_000),
    (Corner::Low, 404_000_000),
    (Corner::LowL1, 480_000_000),
    (Corner::Nominal, 600_000_000),
];

const CSIPHYTIMER_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 240_000_000),
    (Corner::Low, 269_333_333),
];

/// Shared by fd_core and icp.
const CORE_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 320_000_000),
    (Corner::Low, 400_000_000),
    (Corner::LowL1, 538_666_667),
    (Corner::Nominal, 600_000_000),
];

const IFE_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 320_000_000),
    (Corner::Low, 404_000_000),
    (Corner::LowL1, 480_000_000),
    (Corner::Nominal, 600_000_000),
];

const CSID_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 384_000_000),
    (Corner::Nominal, 538_666_667),
];

const IPE_CEILINGS: &[(Corner, u64)] = &[
    (Corner::Min, 19_200_000),
    (Corner::Lower, 240_000_000),
    (Corner::Low, 404_000_000),
    (Corner::LowL1, 480_000_000),
    (Corner::Nominal, 538_666_667),
    (Corner::High, 600_000_000),
];

const MCLK_CEILINGS: &[(Corner, u64)] = &[(Corner::Min, 19_200_000), (Corner::Lower, 34_285_714)];

const fn shared(
    cmd_rcgr: u32,
    parent_map: &'static [ParentMap],
    freq_tbl: &'static [Freq],
) -> RcgDesc {
    rcg(cmd_rcgr, 0, parent_map, freq_tbl, RcgMode::SharedSafeSwitch)
}

/// Plain table RCG that sits on the crystal while disabled.
const fn safe(
    cmd_rcgr: u32,
    mnd_width: u8,
    parent_map: &'static [ParentMap],
    freq_tbl: &'static [Freq],
) -> RcgDesc {
    RcgDesc {
        safe_config: true,
        ..rcg(cmd_rcgr, mnd_width, parent_map, freq_tbl, RcgMode::ExactMatch)
    }
}

const fn exact(
    cmd_rcgr: u32,
    parent_map: &'static [ParentMap],
    freq_tbl: &'static [Freq],
) -> RcgDesc {
    safe(cmd_rcgr, 0, parent_map, freq_tbl)
}

const fn mclk(cmd_rcgr: u32) -> RcgDesc {
    safe(cmd_rcgr, 8, MAP_0, MCLK_TBL)
}

/// A branch that does not pass rate requests up, under a shared RCG.
const fn parking_tap(name: &'static str, parent: &'static str, cbcr: u32) -> NodeDesc {
    gate(
        name,
        BranchDesc {
            follows_parent: false,
            park_parent_on_disable: true,
            ..BranchDesc::cbcr(Some(parent), cbcr)
        },
    )
}

const NODES: &[NodeDesc] = &[
    fixed("bi_tcxo", 19_200_000),
    fabia_pll("cam_cc_pll0", 0x0, VDD_CX, 0x1f, 0x4000),
    post_div("cam_cc_pll0_out_even", "cam_cc_pll0", 0x0, 8, POST_DIV_EVEN),
    fabia_pll("cam_cc_pll1", 0x1000, VDD_CX, 0x2a, 0x1555),
    post_div("cam_cc_pll1_out_even", "cam_cc_pll1", 0x1000, 8, POST_DIV_EVEN),
    fabia_pll("cam_cc_pll2", 0x2000, VDD_MX, 0x32, 0x0),
    post_div("cam_cc_pll2_out_even", "cam_cc_pll2", 0x2000, 8, POST_DIV_EVEN),
    post_div("cam_cc_pll2_out_odd", "cam_cc_pll2", 0x2000, 12, POST_DIV_ODD),
    fabia_pll("cam_cc_pll3", 0x3000, VDD_CX, 0x14, 0x0),
    post_div("cam_cc_pll3_out_even", "cam_cc_pll3", 0x3000, 8, POST_DIV_EVEN),
    // Roots.
    rcg_node("cam_cc_bps_clk_src", shared(0x600c, MAP_0, BPS_TBL), VDD_CX, BPS_CEILINGS),
    rcg_node(
        "cam_cc_cci_clk_src",
        safe(0xb0d8, 8, MAP_0, CCI_TBL),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 37_500_000),
            (Corner::Low, 50_000_000),
            (Corner::Nominal, 100_000_000),
        ],
    ),
    rcg_node(
        "cam_cc_cphy_rx_clk_src",
        exact(0x9060, MAP_1, CPHY_RX_TBL),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 300_000_000),
            (Corner::Low, 320_000_000),
            (Corner::High, 384_000_000),
        ],
    ),
    rcg_node(
        "cam_cc_csi0phytimer_clk_src",
        exact(0x5004, MAP_0, CSIPHYTIMER_TBL),
        VDD_CX,
        CSIPHYTIMER_CEILINGS,
    ),
    rcg_node(
        "cam_cc_csi1phytimer_clk_src",
        exact(0x5028, MAP_0, CSIPHYTIMER_TBL),
        VDD_CX,
        CSIPHYTIMER_CEILINGS,
    ),
    rcg_node(
        "cam_cc_csi2phytimer_clk_src",
        exact(0x504c, MAP_0, CSIPHYTIMER_TBL),
        VDD_CX,
        CSIPHYTIMER_CEILINGS,
    ),
    rcg_node(
        "cam_cc_csi3phytimer_clk_src",
        exact(0x5070, MAP_0, CSIPHYTIMER_TBL),
        VDD_CX,
        CSIPHYTIMER_CEILINGS,
    ),
    rcg_node(
        "cam_cc_fast_ahb_clk_src",
        exact(0x6038, MAP_0, FAST_AHB_TBL),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 100_000_000),
            (Corner::Low, 200_000_000),
            (Corner::LowL1, 300_000_000),
            (Corner::Nominal, 400_000_000),
        ],
    ),
    rcg_node("cam_cc_fd_core_clk_src", shared(0xb0b0, MAP_0, FD_CORE_TBL), VDD_CX, CORE_CEILINGS),
    rcg_node("cam_cc_icp_clk_src", shared(0xb088, MAP_0, ICP_TBL), VDD_CX, CORE_CEILINGS),
    rcg_node("cam_cc_ife_0_clk_src", shared(0x900c, MAP_0, IFE_TBL), VDD_CX, IFE_CEILINGS),
    rcg_node("cam_cc_ife_0_csid_clk_src", shared(0x9038, MAP_1, CSID_TBL), VDD_CX, CSID_CEILINGS),
    rcg_node("cam_cc_ife_1_clk_src", shared(0xa00c, MAP_0, IFE_TBL), VDD_CX, IFE_CEILINGS),
    rcg_node("cam_cc_ife_1_csid_clk_src", shared(0xa030, MAP_1, CSID_TBL), VDD_CX, CSID_CEILINGS),
    rcg_node("cam_cc_ife_lite_clk_src", shared(0xb004, MAP_0, IFE_TBL), VDD_CX, IFE_CEILINGS),
    rcg_node(
        "cam_cc_ife_lite_csid_clk_src",
        shared(0xb024, MAP_1, CSID_TBL),
        VDD_CX,
        CSID_CEILINGS,
    ),
    rcg_node("cam_cc_ipe_0_clk_src", shared(0x700c, MAP_0, IPE_TBL), VDD_CX, IPE_CEILINGS),
    rcg_node("cam_cc_ipe_1_clk_src", shared(0x800c, MAP_0, IPE_TBL), VDD_CX, IPE_CEILINGS),
    rcg_node("cam_cc_jpeg_clk_src", shared(0xb04c, MAP_0, BPS_TBL), VDD_CX, BPS_CEILINGS),
    rcg_node(
        "cam_cc_lrme_clk_src",
        shared(0xb0f8, MAP_1, LRME_TBL),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 200_000_000),
            (Corner::Low, 384_000_000),
            (Corner::LowL1, 480_000_000),
            (Corner::Nominal, 600_000_000),
        ],
    ),
    rcg_node("cam_cc_mclk0_clk_src", mclk(0x4004), VDD_CX, MCLK_CEILINGS),
    rcg_node("cam_cc_mclk1_clk_src", mclk(0x4024), VDD_CX, MCLK_CEILINGS),
    rcg_node("cam_cc_mclk2_clk_src", mclk(0x4044), VDD_CX, MCLK_CEILINGS),
    rcg_node("cam_cc_mclk3_clk_src", mclk(0x4064), VDD_CX, MCLK_CEILINGS),
    rcg_node(
        "cam_cc_slow_ahb_clk_src",
        exact(0x6054, MAP_0, SLOW_AHB_TBL),
        VDD_CX,
        &[
            (Corner::Min, 19_200_000),
            (Corner::Lower, 60_000_000),
            (Corner::Low, 66_666_667),
            (Corner::LowL1, 73_846_154),
            (Corner::Nominal, 80_000_000),
        ],
    ),
    // Branches.
    branch("cam_cc_bps_ahb_clk", "cam_cc_slow_ahb_clk_src", 0x606c),
    branch("cam_cc_bps_areg_clk", "cam_cc_fast_ahb_clk_src", 0x6050),
    bus_branch("cam_cc_bps_axi_clk", 0x6034),
    parking_branch("cam_cc_bps_clk", "cam_cc_bps_clk_src", 0x6024),
    bus_branch("cam_cc_camnoc_atb_clk", 0xb12c),
    bus_branch("cam_cc_camnoc_axi_clk", 0xb124),
    branch("cam_cc_cci_clk", "cam_cc_cci_clk_src", 0xb0f0),
    branch("cam_cc_cpas_ahb_clk", "cam_cc_slow_ahb_clk_src", 0xb11c),
    branch("cam_cc_csi0phytimer_clk", "cam_cc_csi0phytimer_clk_src", 0x501c),
    branch("cam_cc_csi1phytimer_clk", "cam_cc_csi1phytimer_clk_src", 0x5040),
    branch("cam_cc_csi2phytimer_clk", "cam_cc_csi2phytimer_clk_src", 0x5064),
    branch("cam_cc_csi3phytimer_clk", "cam_cc_csi3phytimer_clk_src", 0x5088),
    branch("cam_cc_csiphy0_clk", "cam_cc_cphy_rx_clk_src", 0x5020),
    branch("cam_cc_csiphy1_clk", "cam_cc_cphy_rx_clk_src", 0x5044),
    branch("cam_cc_csiphy2_clk", "cam_cc_cphy_rx_clk_src", 0x5068),
    branch("cam_cc_csiphy3_clk", "cam_cc_cphy_rx_clk_src", 0x508c),
    parking_branch("cam_cc_fd_core_clk", "cam_cc_fd_core_clk_src", 0xb0c8),
    parking_tap("cam_cc_fd_core_uar_clk", "cam_cc_fd_core_clk_src", 0xb0d0),
    bus_branch("cam_cc_icp_apb_clk", 0xb084),
    bus_branch("cam_cc_icp_atb_clk", 0xb078),
    parking_branch("cam_cc_icp_clk", "cam_cc_icp_clk_src", 0xb0a0),
    bus_branch("cam_cc_icp_cti_clk", 0xb07c),
    bus_branch("cam_cc_icp_ts_clk", 0xb080),
    bus_branch("cam_cc_ife_0_axi_clk", 0x907c),
    parking_branch("cam_cc_ife_0_clk", "cam_cc_ife_0_clk_src", 0x9024),
    branch("cam_cc_ife_0_cphy_rx_clk", "cam_cc_cphy_rx_clk_src", 0x9078),
    parking_branch("cam_cc_ife_0_csid_clk", "cam_cc_ife_0_csid_clk_src", 0x9050),
    parking_tap("cam_cc_ife_0_dsp_clk", "cam_cc_ife_0_clk_src", 0x9034),
    bus_branch("cam_cc_ife_1_axi_clk", 0xa054),
    parking_branch("cam_cc_ife_1_clk", "cam_cc_ife_1_clk_src", 0xa024),
    branch("cam_cc_ife_1_cphy_rx_clk", "cam_cc_cphy_rx_clk_src", 0xa050),
    parking_branch("cam_cc_ife_1_csid_clk", "cam_cc_ife_1_csid_clk_src", 0xa048),
    parking_tap("cam_cc_ife_1_dsp_clk", "cam_cc_ife_1_clk_src", 0xa02c),
    parking_branch("cam_cc_ife_lite_clk", "cam_cc_ife_lite_clk_src", 0xb01c),
    branch("cam_cc_ife_lite_cphy_rx_clk", "cam_cc_cphy_rx_clk_src", 0xb044),
    parking_branch("cam_cc_ife_lite_csid_clk", "cam_cc_ife_lite_csid_clk_src", 0xb03c),
    branch("cam_cc_ipe_0_ahb_clk", "cam_cc_slow_ahb_clk_src", 0x703c),
    branch("cam_cc_ipe_0_areg_clk", "cam_cc_fast_ahb_clk_src", 0x7038),
    bus_branch("cam_cc_ipe_0_axi_clk", 0x7034),
    parking_branch("cam_cc_ipe_0_clk", "cam_cc_ipe_0_clk_src", 0x7024),
    branch("cam_cc_ipe_1_ahb_clk", "cam_cc_slow_ahb_clk_src", 0x803c),
    branch("cam_cc_ipe_1_areg_clk", "cam_cc_fast_ahb_clk_src", 0x8038),
    bus_branch("cam_cc_ipe_1_axi_clk", 0x8034),
    parking_branch("cam_cc_ipe_1_clk", "cam_cc_ipe_1_clk_src", 0x8024),
    parking_branch("cam_cc_jpeg_clk", "cam_cc_jpeg_clk_src", 0xb064),
    parking_branch("cam_cc_lrme_clk", "cam_cc_lrme_clk_src", 0xb110),
    branch("cam_cc_mclk0_clk", "cam_cc_mclk0_clk_src", 0x401c),
    branch("cam_cc_mclk1_clk", "cam_cc_mclk1_clk_src", 0x403c),
    branch("cam_cc_mclk2_clk", "cam_cc_mclk2_clk_src", 0x405c),
    branch("cam_cc_mclk3_clk", "cam_cc_mclk3_clk_src", 0x407c),
    bus_branch("cam_cc_soc_ahb_clk", 0xb13c),
    bus_branch("cam_cc_sys_tmr_clk", 0xb0a8),
    // Power domains. The IFE domains sit under titan_top.
    domain(
        "cam_cc_bps_gdsc",
        GdscDesc {
            hw_ctrl: true,
            poll_cfg: true,
            ..gdscr(0x6004)
        },
    ),
    domain(
        "cam_cc_ipe_0_gdsc",
        GdscDesc {
            hw_ctrl: true,
            poll_cfg: true,
            ..gdscr(0x7004)
        },
    ),
    domain(
        "cam_cc_ipe_1_gdsc",
        GdscDesc {
            hw_ctrl: true,
            poll_cfg: true,
            ..gdscr(0x8004)
        },
    ),
    domain(
        "cam_cc_ife_0_gdsc",
        GdscDesc {
            parent: Some("cam_cc_titan_top_gdsc"),
            poll_cfg: true,
            ..gdscr(0x9004)
        },
    ),
    domain(
        "cam_cc_ife_1_gdsc",
        GdscDesc {
            parent: Some("cam_cc_titan_top_gdsc"),
            poll_cfg: true,
            ..gdscr(0xa004)
        },
    ),
    domain(
        "cam_cc_titan_top_gdsc",
        GdscDesc {
            poll_cfg: true,
            ..gdscr(0xb134)
        },
    ),
];

const RESETS: &[ResetDesc] = &[
    ResetDesc::bcr("cam_cc_cci_bcr", 0xb0d4),
    ResetDesc::bcr("cam_cc_cpas_bcr", 0xb118),
    ResetDesc::bcr("cam_cc_csi0phy_bcr", 0x5000),
    ResetDesc::bcr("cam_cc_csi1phy_bcr", 0x5024),
    ResetDesc::bcr("cam_cc_csi2phy_bcr", 0x5048),
    ResetDesc::bcr("cam_cc_mclk0_bcr", 0x4000),
    ResetDesc::bcr("cam_cc_mclk1_bcr", 0x4020),
    ResetDesc::bcr("cam_cc_mclk2_bcr", 0x4040),
    ResetDesc::bcr("cam_cc_mclk3_bcr", 0x4060),
    ResetDesc::bcr("cam_cc_titan_top_bcr", 0xb130),
];

const SDM670: VariantFixup = VariantFixup {
    tag: crate::SDM670,
    freq_tables: &[
        ("cam_cc_icp_clk_src", ICP_TBL_SDM670),
        ("cam_cc_lrme_clk_src", LRME_TBL_SDM670),
    ],
    ceilings: &[
        ("cam_cc_cphy_rx_clk_src", Corner::Lower, 384_000_000),
        ("cam_cc_cphy_rx_clk_src", Corner::Low, 384_000_000),
        ("cam_cc_fd_core_clk_src", Corner::Lower, 384_000_000),
        ("cam_cc_icp_clk_src", Corner::Lower, 384_000_000),
        ("cam_cc_icp_clk_src", Corner::LowL1, 600_000_000),
        ("cam_cc_ipe_0_clk_src", Corner::Nominal, 600_000_000),
        ("cam_cc_ipe_1_clk_src", Corner::Nominal, 600_000_000),
        ("cam_cc_lrme_clk_src", Corner::Low, 269_333_333),
        ("cam_cc_lrme_clk_src", Corner::LowL1, 320_000_000),
        ("cam_cc_lrme_clk_src", Corner::Nominal, 400_000_000),
        ("cam_cc_slow_ahb_clk_src", Corner::Lower, 80_000_000),
        ("cam_cc_slow_ahb_clk_src", Corner::Low, 80_000_000),
        ("cam_cc_slow_ahb_clk_src", Corner::LowL1, 80_000_000),
    ],
};

/// Camera clock controller. Votes on `vdd_cx` and `vdd_mx`.
pub static CAM_CC: ControllerDesc = ControllerDesc {
    name: "cam_cc",
    nodes: NODES,
    resets: RESETS,
    init: &[],
    variants: &[SDM670],
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clkctl::emu::EmulatedPort;
    use clkctl::{ClockController, ControllerBuilder, PowerState, RegisterPort, Voter};

    use super::*;
    use crate::testing::Rails;

    fn build(variant: Option<&str>) -> (Arc<EmulatedPort>, Rails, ClockController) {
        let port = Arc::new(EmulatedPort::for_controller(&CAM_CC));
        let rails = Rails::new(port.trace());
        let mut builder = ControllerBuilder::new(&CAM_CC)
            .port(port.clone())
            .regulators(vec![rails.cx.clone(), rails.mx.clone()]);
        if let Some(tag) = variant {
            builder = builder.variant(tag);
        }
        let cc = builder.build().unwrap();
        port.trace().clear();
        (port, rails, cc)
    }

    #[test]
    fn test_boot_configures_all_plls() {
        let (port, _rails, cc) = build(None);
        let expected = [
            (0x0, 0x1f, 0x4000, 600_000_000),
            (0x1000, 0x2a, 0x1555, 807_999_902),
            (0x2000, 0x32, 0x0, 960_000_000),
            (0x3000, 0x14, 0x0, 384_000_000),
        ];
        for (index, (base, l, alpha, rate)) in expected.into_iter().enumerate() {
            assert_eq!(port.read32(base + 0x4), l);
            assert_eq!(port.read32(base + 0x38), alpha);
            let pll = cc.lookup(&format!("cam_cc_pll{}", index)).unwrap();
            assert_eq!(cc.rate(pll), Ok(rate));
        }
    }

    #[test]
    fn test_mclk_programs_mnd_counter() {
        let (port, rails, cc) = build(None);
        let mclk = cc.lookup("cam_cc_mclk0_clk").unwrap();
        let even = cc.lookup("cam_cc_pll2_out_even").unwrap();

        assert_eq!(cc.set_rate(mclk, 24_000_000), Ok(24_000_000));
        assert_eq!(cc.rate(even), Ok(480_000_000));
        assert_eq!(port.read32(0x200c) & 0xf00, 0x100);
        assert_eq!(port.read32(0x400c), 0x01);
        assert_eq!(port.read32(0x4010) & 0xff, 0xfe);
        assert_eq!(port.read32(0x4014) & 0xff, 0xfd);
        assert_eq!(port.read32(0x4008), 0x2113);

        // The boot rate of pll1 already needs LOW on CX.
        assert_eq!(rails.cx.committed(), Corner::Low);
        let src = cc.lookup("cam_cc_mclk0_clk_src").unwrap();
        assert_eq!(
            rails.cx.vote_of(Voter {
                controller: cc.id(),
                node: src,
            }),
            Corner::Lower
        );
    }

    #[test]
    fn test_truncated_table_rate_keeps_full_pll_rate() {
        let (_port, _rails, cc) = build(None);
        let mclk = cc.lookup("cam_cc_mclk1_clk").unwrap();
        let even = cc.lookup("cam_cc_pll0_out_even").unwrap();
        assert_eq!(cc.set_rate(mclk, 33_000_000), Ok(33_333_333));
        assert_eq!(cc.rate(even), Ok(600_000_000));
    }

    #[test]
    fn test_cci_sits_on_crystal_while_disabled() {
        let (port, _rails, cc) = build(None);
        let cci = cc.lookup("cam_cc_cci_clk").unwrap();
        let src = cc.lookup("cam_cc_cci_clk_src").unwrap();
        let cfg = 0xb0dc;

        assert_eq!(cc.set_rate(src, 37_500_000), Ok(37_500_000));
        assert_eq!(port.read32(cfg) & 0x71f, 0x61f);
        cc.enable(cci).unwrap();
        cc.disable(cci).unwrap();
        assert_eq!(cc.is_parked(src), Ok(true));
        assert_eq!(port.read32(cfg) & 0x71f, 0);

        port.trace().clear();
        assert_eq!(cc.set_rate(src, 100_000_000), Ok(100_000_000));
        assert!(port.trace().writes().is_empty());
        assert_eq!(cc.recalc_rate(src), Ok(100_000_000));

        cc.enable(cci).unwrap();
        assert_eq!(cc.is_parked(src), Ok(false));
        assert_eq!(port.read32(cfg) & 0x71f, 0x60b);
        assert_eq!(cc.rate(cci), Ok(100_000_000));
    }

    #[test]
    fn test_lrme_runs_from_odd_output() {
        let (port, _rails, cc) = build(None);
        let lrme = cc.lookup("cam_cc_lrme_clk").unwrap();
        assert_eq!(cc.set_rate(lrme, 384_000_000), Ok(384_000_000));
        assert_eq!(port.read32(0xb0fc), 0x404);
        // The odd divider was already /1.
        assert_eq!(port.read32(0x200c) & 0xf000, 0);
    }

    #[test]
    fn test_sdm670_tables_and_ceilings() {
        let (_port, _rails, base) = build(None);
        let (_port, rails, variant) = build(Some(crate::SDM670));
        assert_eq!(variant.variant(), Some("sdm670"));

        let icp = base.lookup("cam_cc_icp_clk_src").unwrap();
        assert_eq!(base.round_rate(icp, 350_000_000), Ok(400_000_000));
        assert_eq!(variant.round_rate(icp, 350_000_000), Ok(384_000_000));

        let lrme = base.lookup("cam_cc_lrme_clk_src").unwrap();
        assert_eq!(base.round_rate(lrme, 300_000_000), Ok(384_000_000));
        assert_eq!(variant.round_rate(lrme, 300_000_000), Ok(320_000_000));

        let cphy = variant.lookup("cam_cc_cphy_rx_clk_src").unwrap();
        assert_eq!(variant.set_rate(cphy, 384_000_000), Ok(384_000_000));
        assert_eq!(
            rails.cx.vote_of(Voter {
                controller: variant.id(),
                node: cphy,
            }),
            Corner::Lower
        );
    }

    #[test]
    fn test_ife_domain_powers_titan_top_first() {
        let (port, _rails, cc) = build(None);
        let ife = cc.lookup("cam_cc_ife_0_gdsc").unwrap();
        let top = cc.lookup("cam_cc_titan_top_gdsc").unwrap();

        cc.enable(ife).unwrap();
        assert_eq!(port.trace().writes(), vec![(0xb134, 0), (0x9004, 0)]);
        assert_eq!(cc.domain_state(top), Ok(PowerState::On));
        assert_eq!(cc.domain_state(ife), Ok(PowerState::On));
    }

    #[test]
    fn test_titan_top_reset_pulses() {
        let (port, _rails, cc) = build(None);
        let bcr = cc.reset_by_name("cam_cc_titan_top_bcr").unwrap();
        cc.reset(bcr).unwrap();
        assert_eq!(port.trace().writes(), vec![(0xb130, 0x1), (0xb130, 0x0)]);
        assert_eq!(cc.reset_status(bcr), Ok(false));
    }
}
