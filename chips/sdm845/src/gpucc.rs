// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Graphics clock controller (gpucc).
//!
//! The GFX3D root has no real table of its own: every entry runs off
//! `crc_div`, so a rate request relocks PLL0 through its even output and
//! votes on the dedicated graphics rail. The GX domain is owned by the GMU
//! firmware once it boots, so its power requests are advisory.

use clkctl::desc::*;
use clkctl::{freq, Corner};

use crate::tables::*;
use crate::vdd::{VDD_CX, VDD_GFX, VDD_MX};

const MAP_0: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("gpu_cc_pll0", 1),
    input("gpu_cc_pll1", 3),
    input("gcc_gpu_gpll0_clk_src", 5),
    input("gcc_gpu_gpll0_div_clk_src", 6),
];

const MAP_2: &[ParentMap] = &[
    input("bi_tcxo", 0),
    input("crc_div", 1),
    input("gpu_cc_pll0", 2),
    input("gpu_cc_pll1", 3),
    input("gpu_cc_pll1", 4),
    input("gcc_gpu_gpll0_clk_src", 5),
];

const GMU_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(200_000_000, "gcc_gpu_gpll0_div_clk_src", 1.5),
    freq!(400_000_000, "gcc_gpu_gpll0_clk_src", 1.5),
];

const GMU_TBL_SDM670: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(200_000_000, "gcc_gpu_gpll0_div_clk_src", 1.5),
];

const GFX3D_TBL: &[Freq] = &[
    freq!(147_000_000, "crc_div", 1),
    freq!(210_000_000, "crc_div", 1),
    freq!(280_000_000, "crc_div", 1),
    freq!(338_000_000, "crc_div", 1),
    freq!(425_000_000, "crc_div", 1),
    freq!(487_000_000, "crc_div", 1),
    freq!(548_000_000, "crc_div", 1),
    freq!(600_000_000, "crc_div", 1),
];

const GFX3D_TBL_SDM670: &[Freq] = &[
    freq!(180_000_000, "crc_div", 1),
    freq!(267_000_000, "crc_div", 1),
    freq!(355_000_000, "crc_div", 1),
    freq!(430_000_000, "crc_div", 1),
    freq!(504_000_000, "crc_div", 1),
    freq!(565_000_000, "crc_div", 1),
    freq!(610_000_000, "crc_div", 1),
    freq!(650_000_000, "crc_div", 1),
    freq!(700_000_000, "crc_div", 1),
    freq!(750_000_000, "crc_div", 1),
    freq!(780_000_000, "crc_div", 1),
];

const NODES: &[NodeDesc] = &[
    fixed("bi_tcxo", 19_200_000),
    fixed("gcc_gpu_gpll0_clk_src", 600_000_000),
    fixed("gcc_gpu_gpll0_div_clk_src", 300_000_000),
    fabia_pll("gpu_cc_pll0", 0x0, VDD_MX, 0x1d, 0x2aaa),
    fabia_pll("gpu_cc_pll1", 0x100, VDD_MX, 0x1a, 0xaaaa),
    NodeDesc {
        name: "gpu_cc_pll0_out_even",
        kind: NodeKind::PostDiv(PostDivDesc {
            offset: 0x0,
            parent: "gpu_cc_pll0",
            shift: 8,
            width: 4,
            table: POST_DIV_EVEN,
            follows_parent: true,
        }),
        vdd: None,
    },
    NodeDesc {
        name: "crc_div",
        kind: NodeKind::FixedFactor(FixedFactorDesc {
            parent: "gpu_cc_pll0_out_even",
            mult: 1,
            div: 1,
            follows_parent: true,
        }),
        vdd: None,
    },
    rcg_node(
        "gpu_cc_gmu_clk_src",
        rcg(0x1120, 0, MAP_0, GMU_TBL, RcgMode::SharedSafeSwitch),
        VDD_CX,
        &[(Corner::Min, 200_000_000), (Corner::Low, 400_000_000)],
    ),
    rcg_node(
        "gpu_cc_gx_gfx3d_clk_src",
        RcgDesc {
            force_enable: true,
            ..rcg(0x101c, 0, MAP_2, GFX3D_TBL, RcgMode::ExactMatch)
        },
        VDD_GFX,
        &[
            (Corner::Min, 147_000_000),
            (Corner::Lower, 210_000_000),
            (Corner::Low, 280_000_000),
            (Corner::LowL1, 338_000_000),
            (Corner::Nominal, 425_000_000),
            (Corner::NominalL1, 487_000_000),
            (Corner::High, 548_000_000),
            (Corner::HighL1, 600_000_000),
        ],
    ),
    bus_branch("gpu_cc_acd_ahb_clk", 0x1168),
    bus_branch("gpu_cc_acd_cxo_clk", 0x1164),
    bus_branch("gpu_cc_crc_ahb_clk", 0x107c),
    bus_branch("gpu_cc_cx_apb_clk", 0x1088),
    branch("gpu_cc_cx_gfx3d_clk", "gpu_cc_gx_gfx3d_clk_src", 0x10a4),
    branch("gpu_cc_cx_gfx3d_slv_clk", "gpu_cc_gx_gfx3d_clk_src", 0x10a8),
    parking_branch("gpu_cc_cx_gmu_clk", "gpu_cc_gmu_clk_src", 0x1098),
    bus_branch("gpu_cc_cx_snoc_dvm_clk", 0x108c),
    bus_branch("gpu_cc_cxo_aon_clk", 0x1004),
    bus_branch("gpu_cc_cxo_clk", 0x109c),
    branch("gpu_cc_gx_gfx3d_clk", "gpu_cc_gx_gfx3d_clk_src", 0x1054),
    parking_branch("gpu_cc_gx_gmu_clk", "gpu_cc_gmu_clk_src", 0x1064),
    gate(
        "gpu_cc_gx_vsense_clk",
        BranchDesc {
            halt_check: HaltCheck::HaltVoted,
            ..BranchDesc::cbcr(None, 0x1058)
        },
    ),
    domain(
        "gpu_cx_gdsc",
        GdscDesc {
            votable: true,
            status_reg: Some(0x1540),
            ..gdscr(0x106c)
        },
    ),
    domain(
        "gpu_gx_gdsc",
        GdscDesc {
            control: GdscControl::HardwareRetained,
            poll_cfg: true,
            clamp_io_ctrl: Some(0x1508),
            ..gdscr(0x100c)
        },
    ),
];

const RESETS: &[ResetDesc] = &[
    ResetDesc::bcr("gpu_cc_acd_bcr", 0x1160),
    ResetDesc::bcr("gpu_cc_cx_bcr", 0x1068),
    ResetDesc::bcr("gpu_cc_gfx3d_aon_bcr", 0x10a0),
    ResetDesc::bcr("gpu_cc_gmu_bcr", 0x111c),
    ResetDesc::bcr("gpu_cc_gx_bcr", 0x1008),
    ResetDesc::bcr("gpu_cc_spdm_bcr", 0x1110),
    ResetDesc::bcr("gpu_cc_xo_bcr", 0x1000),
];

const SDM670: VariantFixup = VariantFixup {
    tag: crate::SDM670,
    freq_tables: &[
        ("gpu_cc_gmu_clk_src", GMU_TBL_SDM670),
        ("gpu_cc_gx_gfx3d_clk_src", GFX3D_TBL_SDM670),
    ],
    ceilings: &[
        ("gpu_cc_gmu_clk_src", Corner::Low, 200_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::Min, 180_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::Lower, 267_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::Low, 355_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::LowL1, 430_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::Nominal, 565_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::NominalL1, 650_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::High, 750_000_000),
        ("gpu_cc_gx_gfx3d_clk_src", Corner::HighL1, 780_000_000),
    ],
};

/// Graphics clock controller. Votes on `vdd_cx`, `vdd_mx` and `vdd_gfx`.
pub static GPU_CC: ControllerDesc = ControllerDesc {
    name: "gpu_cc",
    nodes: NODES,
    resets: RESETS,
    init: &[
        // GMU wakeup and sleep delays.
        RegUpdate {
            offset: 0x1098,
            mask: 0xff0,
            value: 0xff0,
        },
        // CX domain collapse vote delay.
        RegUpdate {
            offset: 0x106c,
            mask: 0xf000,
            value: 0x8000,
        },
    ],
    variants: &[SDM670],
};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clkctl::emu::EmulatedPort;
    use clkctl::{
        BranchState, ClockController, ClockEvent, ControllerBuilder, EventSink, PowerState,
        RegisterPort, Voter,
    };

    use super::*;
    use crate::testing::Rails;

    #[derive(Debug, Default)]
    struct Events(Mutex<Vec<ClockEvent>>);

    impl EventSink for Events {
        fn report(&self, event: &ClockEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    struct Gpu {
        port: Arc<EmulatedPort>,
        rails: Rails,
        events: Arc<Events>,
        cc: ClockController,
    }

    fn build(variant: Option<&str>) -> Gpu {
        let port = Arc::new(EmulatedPort::for_controller(&GPU_CC));
        port.preset(0x1508, 0x1);
        let rails = Rails::new(port.trace());
        let events = Arc::new(Events::default());
        let mut builder = ControllerBuilder::new(&GPU_CC)
            .port(port.clone())
            .regulators(vec![rails.cx.clone(), rails.mx.clone(), rails.gfx.clone()])
            .sink(events.clone());
        if let Some(tag) = variant {
            builder = builder.variant(tag);
        }
        let cc = builder.build().unwrap();
        port.trace().clear();
        Gpu {
            port,
            rails,
            events,
            cc,
        }
    }

    #[test]
    fn test_init_and_boot_rates() {
        let gpu = build(None);
        assert_eq!(gpu.port.read32(0x1098) & 0xff0, 0xff0);
        assert_eq!(gpu.port.read32(0x106c) & 0xf000, 0x8000);
        let pll0 = gpu.cc.lookup("gpu_cc_pll0").unwrap();
        let pll1 = gpu.cc.lookup("gpu_cc_pll1").unwrap();
        assert_eq!(gpu.cc.rate(pll0), Ok(559_999_804));
        assert_eq!(gpu.cc.rate(pll1), Ok(511_999_804));
    }

    #[test]
    fn test_gfx3d_relocks_pll0() {
        let gpu = build(None);
        let gfx3d = gpu.cc.lookup("gpu_cc_gx_gfx3d_clk").unwrap();
        let pll0 = gpu.cc.lookup("gpu_cc_pll0").unwrap();

        assert_eq!(gpu.cc.set_rate(gfx3d, 400_000_000), Ok(425_000_000));
        assert_eq!(gpu.port.read32(0x4), 0x16);
        assert_eq!(gpu.port.read32(0x38), 0x22ab);
        assert_eq!(gpu.cc.rate(pll0), Ok(425_000_097));
        assert_eq!(gpu.port.read32(0x1020) & 0x7ff, 0x101);
        assert_eq!(gpu.rails.gfx.committed(), Corner::Nominal);
    }

    #[test]
    fn test_gfx3d_root_forced_on() {
        let gpu = build(None);
        let gfx3d = gpu.cc.lookup("gpu_cc_gx_gfx3d_clk").unwrap();
        let pll0 = gpu.cc.lookup("gpu_cc_pll0").unwrap();
        gpu.cc.set_rate(gfx3d, 600_000_000).unwrap();

        gpu.cc.enable(gfx3d).unwrap();
        assert_ne!(gpu.port.read32(0x101c) & 0x2, 0);
        assert_eq!(gpu.cc.is_enabled(pll0), Ok(true));
        gpu.cc.disable(gfx3d).unwrap();
        assert_eq!(gpu.port.read32(0x101c) & 0x2, 0);
    }

    #[test]
    fn test_gmu_votes_cx() {
        let gpu = build(None);
        let gmu = gpu.cc.lookup("gpu_cc_cx_gmu_clk").unwrap();
        let src = gpu.cc.lookup("gpu_cc_gmu_clk_src").unwrap();
        assert_eq!(gpu.cc.set_rate(gmu, 400_000_000), Ok(400_000_000));
        assert_eq!(gpu.port.read32(0x1124) & 0x7ff, 0x502);
        let voter = Voter {
            controller: gpu.cc.id(),
            node: src,
        };
        assert_eq!(gpu.rails.cx.vote_of(voter), Corner::Low);
    }

    #[test]
    fn test_vsense_disable_tolerates_other_master() {
        let gpu = build(None);
        let vsense = gpu.cc.lookup("gpu_cc_gx_vsense_clk").unwrap();
        gpu.cc.enable(vsense).unwrap();
        assert_eq!(gpu.cc.branch_state(vsense), Ok(BranchState::Ungated));

        gpu.port.stick(0x1058, 0x8000_0000, 0);
        assert_eq!(gpu.cc.disable(vsense), Ok(()));
        assert_eq!(gpu.cc.is_enabled(vsense), Ok(false));
    }

    #[test]
    fn test_gx_domain_is_advisory() {
        let gpu = build(None);
        let gx = gpu.cc.lookup("gpu_gx_gdsc").unwrap();
        gpu.port.stick(0x1010, 0x1_0000, 0);

        assert_eq!(gpu.cc.enable(gx), Ok(()));
        assert_eq!(gpu.port.trace().writes()[..2], [(0x1508, 0x0), (0x100c, 0x0)]);
        assert_eq!(gpu.cc.domain_state(gx), Ok(PowerState::On));
        let events = gpu.events.0.lock().unwrap();
        assert!(events.iter().any(|event| matches!(
            event,
            ClockEvent::HardwareRetained {
                node: "gpu_gx_gdsc",
                ..
            }
        )));
    }

    #[test]
    fn test_cx_domain_is_votable() {
        let gpu = build(None);
        let cx = gpu.cc.lookup("gpu_cx_gdsc").unwrap();
        gpu.cc.enable(cx).unwrap();
        assert_ne!(gpu.port.read32(0x1540) & 0x8000_0000, 0);

        // The GMU keeps its own vote on the domain.
        gpu.port.stick(0x1540, 0x8000_0000, 0x8000_0000);
        assert_eq!(gpu.cc.disable(cx), Ok(()));
        assert_eq!(gpu.cc.domain_state(cx), Ok(PowerState::Off));
    }

    #[test]
    fn test_sdm670_gpu_tables() {
        let base = build(None);
        let gpu = build(Some(crate::SDM670));

        let gfx3d = base.cc.lookup("gpu_cc_gx_gfx3d_clk_src").unwrap();
        assert_eq!(base.cc.round_rate(gfx3d, 600_000_000), Ok(600_000_000));
        let gfx3d = gpu.cc.lookup("gpu_cc_gx_gfx3d_clk_src").unwrap();
        assert_eq!(gpu.cc.round_rate(gfx3d, 600_000_000), Ok(610_000_000));

        let gmu = gpu.cc.lookup("gpu_cc_gmu_clk_src").unwrap();
        assert_eq!(gpu.cc.round_rate(gmu, 400_000_000), Ok(200_000_000));
        assert_eq!(gpu.cc.set_rate(gmu, 200_000_000), Ok(200_000_000));
        let voter = Voter {
            controller: gpu.cc.id(),
            node: gmu,
        };
        assert_eq!(gpu.rails.cx.vote_of(voter), Corner::Min);
    }

    #[test]
    fn test_gx_reset() {
        let gpu = build(None);
        let gx = gpu.cc.reset_by_name("gpu_cc_gx_bcr").unwrap();
        gpu.cc.assert_reset(gx).unwrap();
        assert_eq!(gpu.cc.reset_status(gx), Ok(true));
        gpu.cc.deassert_reset(gx).unwrap();
        assert_eq!(gpu.cc.reset_status(gx), Ok(false));
    }
}
