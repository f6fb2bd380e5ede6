// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! A small controller shared by the engine tests.
//!
//! ```text
//! bi_tcxo -> pll0 -> pll0_out_even -> core_clk_src -> core_clk
//! gpll0 ---------------------------> aux_clk_src ---> aux_clk
//! gpll0 ---------------------------> shared_clk_src -> shared_a_clk
//!                                                   -> shared_b_clk
//! top_gdsc -> child_gdsc     hw_gdsc
//! ```

use std::sync::{Arc, Mutex};

use crate::controller::{ClockController, ControllerBuilder};
use crate::corner::{Corner, RegulatorHandle};
use crate::debug::{ClockEvent, EventSink};
use crate::desc::*;
use crate::emu::{EmulatedPort, EmulatedRail, Trace};
use crate::freq;

pub(crate) const CORE_CMD: u32 = 0x1000;
pub(crate) const CORE_CBCR: u32 = 0x1100;
pub(crate) const AUX_CMD: u32 = 0x2000;
pub(crate) const SHARED_CMD: u32 = 0x3000;
pub(crate) const SHARED_A_CBCR: u32 = 0x3100;
pub(crate) const SHARED_B_CBCR: u32 = 0x3200;
pub(crate) const TOP_GDSCR: u32 = 0x4000;
pub(crate) const CHILD_GDSCR: u32 = 0x5000;
pub(crate) const HW_GDSCR: u32 = 0x6000;
pub(crate) const SCRATCH: u32 = 0x9000;

pub(crate) const CX_LEVELS: &[Corner] =
    &[Corner::Lower, Corner::Low, Corner::Nominal, Corner::High];

const XO_MAP: ParentMap = ParentMap {
    parent: "bi_tcxo",
    cfg: 0,
};

const fn gdsc(gdscr: u32, parent: Option<&'static str>, pwrsts: PowerStates) -> GdscDesc {
    GdscDesc {
        gdscr,
        parent,
        pwrsts,
        control: GdscControl::SoftwareControlled,
        hw_ctrl: false,
        poll_cfg: false,
        votable: false,
        clamp_io_ctrl: None,
        status_reg: None,
    }
}

const fn parking_branch(parent: &'static str, cbcr: u32) -> BranchDesc {
    BranchDesc {
        park_parent_on_disable: true,
        ..BranchDesc::cbcr(Some(parent), cbcr)
    }
}

pub(crate) const CORE_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(100_000_000, "pll0_out_even", 6),
    freq!(200_000_000, "pll0_out_even", 3),
    freq!(404_000_000, "pll0_out_even", 1),
    freq!(600_000_000, "pll0_out_even", 1),
];

pub(crate) const AUX_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(150_000_000, "gpll0", 4),
    freq!(300_000_000, "gpll0", 2),
    freq!(600_000_000, "gpll0", 1),
];

const AUX_LITE_TBL: &[Freq] = &[
    freq!(19_200_000, "bi_tcxo", 1),
    freq!(150_000_000, "gpll0", 4),
    freq!(300_000_000, "gpll0", 2),
];

const NODES: &[NodeDesc] = &[
    NodeDesc {
        name: "bi_tcxo",
        kind: NodeKind::Fixed { rate: 19_200_000 },
        vdd: None,
    },
    NodeDesc {
        name: "gpll0",
        kind: NodeKind::Fixed { rate: 600_000_000 },
        vdd: None,
    },
    NodeDesc {
        name: "pll0",
        kind: NodeKind::Pll(PllDesc {
            offset: 0x0,
            parent: "bi_tcxo",
            vco: &[VcoBand {
                min_rate: 249_600_000,
                max_rate: 2_000_000_000,
                band_id: 0,
            }],
            alpha_width: 16,
            initial: None,
        }),
        vdd: None,
    },
    NodeDesc {
        name: "pll0_out_even",
        kind: NodeKind::PostDiv(PostDivDesc {
            offset: 0x0,
            parent: "pll0",
            shift: 8,
            width: 4,
            table: &[(0x0, 1), (0x1, 2)],
            follows_parent: true,
        }),
        vdd: None,
    },
    NodeDesc {
        name: "core_clk_src",
        kind: NodeKind::Rcg(RcgDesc {
            cmd_rcgr: CORE_CMD,
            mnd_width: 0,
            hid_width: 5,
            parent_map: &[
                XO_MAP,
                ParentMap {
                    parent: "pll0_out_even",
                    cfg: 1,
                },
            ],
            freq_tbl: CORE_TBL,
            mode: RcgMode::ExactMatch,
            follows_parent: true,
            force_enable: false,
            safe_config: false,
        }),
        vdd: Some(VddDesc {
            regulator: "vdd_cx",
            rate_max: &[
                (Corner::Lower, 19_200_000),
                (Corner::Low, 200_000_000),
                (Corner::Nominal, 600_000_000),
            ],
        }),
    },
    NodeDesc {
        name: "core_clk",
        kind: NodeKind::Branch(BranchDesc::cbcr(Some("core_clk_src"), CORE_CBCR)),
        vdd: None,
    },
    NodeDesc {
        name: "aux_clk_src",
        kind: NodeKind::Rcg(RcgDesc {
            cmd_rcgr: AUX_CMD,
            mnd_width: 0,
            hid_width: 5,
            parent_map: &[
                XO_MAP,
                ParentMap {
                    parent: "gpll0",
                    cfg: 5,
                },
            ],
            freq_tbl: AUX_TBL,
            mode: RcgMode::ExactMatch,
            follows_parent: false,
            force_enable: false,
            safe_config: true,
        }),
        vdd: Some(VddDesc {
            regulator: "vdd_cx",
            rate_max: &[
                (Corner::Lower, 19_200_000),
                (Corner::Low, 150_000_000),
                (Corner::Nominal, 300_000_000),
                (Corner::High, 600_000_000),
            ],
        }),
    },
    NodeDesc {
        name: "aux_clk",
        kind: NodeKind::Branch(BranchDesc::cbcr(Some("aux_clk_src"), 0x2100)),
        vdd: None,
    },
    NodeDesc {
        name: "shared_clk_src",
        kind: NodeKind::Rcg(RcgDesc {
            cmd_rcgr: SHARED_CMD,
            mnd_width: 0,
            hid_width: 5,
            parent_map: &[
                XO_MAP,
                ParentMap {
                    parent: "gpll0",
                    cfg: 5,
                },
            ],
            freq_tbl: &[freq!(19_200_000, "bi_tcxo", 1), freq!(300_000_000, "gpll0", 2)],
            mode: RcgMode::SharedSafeSwitch,
            follows_parent: false,
            force_enable: false,
            safe_config: false,
        }),
        vdd: Some(VddDesc {
            regulator: "vdd_cx",
            rate_max: &[(Corner::Lower, 19_200_000), (Corner::Nominal, 300_000_000)],
        }),
    },
    NodeDesc {
        name: "shared_a_clk",
        kind: NodeKind::Branch(parking_branch("shared_clk_src", SHARED_A_CBCR)),
        vdd: None,
    },
    NodeDesc {
        name: "shared_b_clk",
        kind: NodeKind::Branch(parking_branch("shared_clk_src", SHARED_B_CBCR)),
        vdd: None,
    },
    NodeDesc {
        name: "top_gdsc",
        kind: NodeKind::PowerDomain(gdsc(TOP_GDSCR, None, PowerStates::OffOnRetain)),
        vdd: None,
    },
    NodeDesc {
        name: "child_gdsc",
        kind: NodeKind::PowerDomain(gdsc(CHILD_GDSCR, Some("top_gdsc"), PowerStates::OffOn)),
        vdd: None,
    },
    NodeDesc {
        name: "hw_gdsc",
        kind: NodeKind::PowerDomain(GdscDesc {
            control: GdscControl::HardwareRetained,
            ..gdsc(HW_GDSCR, None, PowerStates::OffOn)
        }),
        vdd: None,
    },
];

pub(crate) static TEST_CC: ControllerDesc = ControllerDesc {
    name: "test_cc",
    nodes: NODES,
    resets: &[
        ResetDesc::bcr("core_bcr", 0x8000),
        ResetDesc {
            name: "aux_reset",
            offset: 0x8004,
            bit: 2,
        },
    ],
    init: &[RegUpdate {
        offset: SCRATCH,
        mask: 0x3,
        value: 0x1,
    }],
    variants: &[
        VariantFixup {
            tag: "lite",
            freq_tables: &[("aux_clk_src", AUX_LITE_TBL)],
            ceilings: &[("aux_clk_src", Corner::Low, 100_000_000)],
        },
        VariantFixup {
            tag: "broken",
            freq_tables: &[("core_clk", AUX_LITE_TBL)],
            ceilings: &[],
        },
        VariantFixup {
            tag: "capped",
            freq_tables: &[],
            ceilings: &[("core_clk_src", Corner::Nominal, 404_000_000)],
        },
    ],
};

/// Sink that keeps every event it is handed.
#[derive(Debug, Default)]
pub(crate) struct Recorder(Mutex<Vec<ClockEvent>>);

impl Recorder {
    pub(crate) fn take(&self) -> Vec<ClockEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl EventSink for Recorder {
    fn report(&self, event: &ClockEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// One controller on an emulated port, with the rail journaling into the
/// port's trace.
pub(crate) struct Rig {
    pub(crate) port: Arc<EmulatedPort>,
    pub(crate) trace: Trace,
    pub(crate) rail: Arc<EmulatedRail>,
    pub(crate) cx: RegulatorHandle,
    pub(crate) events: Arc<Recorder>,
    pub(crate) cc: ClockController,
}

pub(crate) fn builder(port: &Arc<EmulatedPort>, cx: &RegulatorHandle) -> ControllerBuilder {
    ControllerBuilder::new(&TEST_CC)
        .port(port.clone())
        .regulators(vec![cx.clone()])
}

pub(crate) fn rig_with(configure: impl FnOnce(ControllerBuilder) -> ControllerBuilder) -> Rig {
    let port = Arc::new(EmulatedPort::for_controller(&TEST_CC));
    let trace = port.trace();
    let rail = Arc::new(EmulatedRail::new("vdd_cx", trace.clone()));
    let cx = RegulatorHandle::new("vdd_cx", CX_LEVELS, rail.clone());
    let events = Arc::new(Recorder::default());
    let cc = configure(builder(&port, &cx).sink(events.clone()))
        .build()
        .unwrap();
    trace.clear();
    Rig {
        port,
        trace,
        rail,
        cx,
        events,
        cc,
    }
}

pub(crate) fn rig() -> Rig {
    rig_with(|builder| builder)
}
