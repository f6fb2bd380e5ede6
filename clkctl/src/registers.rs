// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register layouts of Qualcomm clock-controller blocks.
//!
//! Values are read through the [`RegisterPort`](crate::port::RegisterPort)
//! as plain `u32`s and decoded with [`LocalRegisterCopy`].

use tock_registers::{register_bitfields, LocalRegisterCopy};

register_bitfields![u32,
    /// Branch control register.
    pub CBCR [
        CLK_ENABLE OFFSET(0) NUMBITS(1) [],
        HW_CTL OFFSET(1) NUMBITS(1) [],
        SLEEP OFFSET(4) NUMBITS(4) [],
        WAKEUP OFFSET(8) NUMBITS(4) [],
        CLK_OFF OFFSET(31) NUMBITS(1) []
    ],

    /// RCG command register, at the RCG base.
    pub CMD_RCGR [
        UPDATE OFFSET(0) NUMBITS(1) [],
        ROOT_EN OFFSET(1) NUMBITS(1) [],
        DIRTY_CFG OFFSET(4) NUMBITS(1) [],
        ROOT_OFF OFFSET(31) NUMBITS(1) []
    ],

    /// RCG configuration register, at the RCG base + 0x4.
    pub CFG_RCGR [
        SRC_DIV OFFSET(0) NUMBITS(5) [],
        SRC_SEL OFFSET(8) NUMBITS(3) [],
        MODE OFFSET(12) NUMBITS(2) [
            Bypass = 0,
            DualEdge = 2
        ],
        HW_CLK_CTRL OFFSET(20) NUMBITS(1) []
    ],

    /// Fabia PLL mode register.
    pub PLL_MODE [
        OUTCTRL OFFSET(0) NUMBITS(1) [],
        BYPASSNL OFFSET(1) NUMBITS(1) [],
        RESET_N OFFSET(2) NUMBITS(1) [],
        VOTE_FSM_ENA OFFSET(20) NUMBITS(1) [],
        UPDATE OFFSET(22) NUMBITS(1) [],
        ACK_LATCH OFFSET(29) NUMBITS(1) [],
        LOCK_DET OFFSET(31) NUMBITS(1) []
    ],

    /// Fabia PLL user control register.
    pub PLL_USER_CTL [
        OUT_MAIN OFFSET(0) NUMBITS(1) [],
        OUT_EVEN OFFSET(1) NUMBITS(1) [],
        OUT_ODD OFFSET(2) NUMBITS(1) [],
        POST_DIV_EVEN OFFSET(8) NUMBITS(4) [],
        POST_DIV_ODD OFFSET(12) NUMBITS(4) []
    ],

    pub PLL_OPMODE [
        MODE OFFSET(0) NUMBITS(3) [
            Standby = 0,
            Run = 1
        ]
    ],

    /// GDSC control register.
    pub GDSCR [
        SW_COLLAPSE OFFSET(0) NUMBITS(1) [],
        HW_CONTROL OFFSET(1) NUMBITS(1) [],
        RETAIN_FF_ENABLE OFFSET(11) NUMBITS(1) [],
        CLK_DIS_WAIT OFFSET(12) NUMBITS(4) [],
        EN_FEW_WAIT OFFSET(16) NUMBITS(4) [],
        EN_REST_WAIT OFFSET(20) NUMBITS(4) [],
        PWR_ON OFFSET(31) NUMBITS(1) []
    ],

    /// GDSC configuration register, at the GDSCR + 0x4.
    pub CFG_GDSCR [
        POWER_DOWN_COMPLETE OFFSET(15) NUMBITS(1) [],
        POWER_UP_COMPLETE OFFSET(16) NUMBITS(1) []
    ],

    /// GDSC memory/IO clamp control.
    pub CLAMP_IO [
        CLAMP OFFSET(0) NUMBITS(1) []
    ],

    /// Block control register.
    pub BCR [
        BLK_ARES OFFSET(0) NUMBITS(1) []
    ]
];

pub type CbcrVal = LocalRegisterCopy<u32, CBCR::Register>;
pub type CmdRcgrVal = LocalRegisterCopy<u32, CMD_RCGR::Register>;
pub type CfgRcgrVal = LocalRegisterCopy<u32, CFG_RCGR::Register>;
pub type PllModeVal = LocalRegisterCopy<u32, PLL_MODE::Register>;
pub type PllUserCtlVal = LocalRegisterCopy<u32, PLL_USER_CTL::Register>;
pub type GdscrVal = LocalRegisterCopy<u32, GDSCR::Register>;
pub type CfgGdscrVal = LocalRegisterCopy<u32, CFG_GDSCR::Register>;

/// Offsets inside an RCG block, relative to `CMD_RCGR`.
pub mod rcg {
    pub const CMD: u32 = 0x0;
    pub const CFG: u32 = 0x4;
    pub const M: u32 = 0x8;
    pub const N: u32 = 0xc;
    pub const D: u32 = 0x10;
}

/// Offsets inside a Fabia PLL block, relative to the PLL base.
pub mod pll {
    pub const MODE: u32 = 0x0;
    pub const L_VAL: u32 = 0x4;
    pub const USER_CTL: u32 = 0xc;
    pub const OPMODE: u32 = 0x2c;
    pub const FRAC: u32 = 0x38;

    /// Size of the block, used to route emulated writes.
    pub const SIZE: u32 = 0x40;
}

/// Offset of `CFG_GDSCR` relative to `GDSCR`.
pub const CFG_GDSCR_OFFSET: u32 = 0x4;

/// Mask of a register field given as (shift, width).
#[inline]
pub const fn field_mask(shift: u8, width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        ((1u32 << width) - 1) << shift
    }
}
