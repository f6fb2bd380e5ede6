// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Compile-time configuration of the clock engine.
//!
//! Every hardware wait in the engine is bounded by one of the timeouts below.
//! The values are the hardware-specified worst cases for Qualcomm clock
//! controllers; an expired wait surfaces as a timeout error and is never
//! retried by the engine itself.

use core::time::Duration;

/// Timeouts and tolerances used by the engine.
///
/// The values in effect live in [`CONFIG`] below.
pub(crate) struct Config {
    /// How long a branch may take to report its `CLK_OFF` bit changed.
    pub(crate) branch_halt_timeout: Duration,

    /// Settle time for branches that have no usable halt bit.
    pub(crate) branch_delay_us: u32,

    /// How long an RCG may take to clear `CMD_RCGR.UPDATE` or `ROOT_OFF`.
    pub(crate) rcg_update_timeout: Duration,

    /// How long a PLL may take to latch a new L/alpha pair and to report
    /// `LOCK_DET`.
    pub(crate) pll_lock_timeout: Duration,

    /// How long a GDSC may take to power up or collapse.
    pub(crate) gdsc_timeout: Duration,

    /// Time a block reset is held asserted by `reset()`.
    pub(crate) reset_hold_us: u32,

    /// Amount a rounded-up fractional PLL rate may exceed the request.
    ///
    /// The alpha register has a limited number of bits, so the achievable
    /// rate can land marginally above the requested one. Post-dividers
    /// accept the same slack above a request.
    pub(crate) pll_rate_margin_hz: u64,

    /// Tolerance between a pixel clock's parent request and the rate the
    /// parent can actually produce.
    pub(crate) pixel_delta_hz: u64,
}

/// The settings every controller instance runs with.
pub(crate) const CONFIG: Config = Config {
    branch_halt_timeout: Duration::from_micros(200),
    branch_delay_us: 10,
    rcg_update_timeout: Duration::from_micros(500),
    pll_lock_timeout: Duration::from_micros(200),
    gdsc_timeout: Duration::from_micros(500),
    reset_hold_us: 1,
    pll_rate_margin_hz: 500,
    pixel_delta_hz: 100_000,
};
