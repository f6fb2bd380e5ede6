// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock-controller engine.
//!
//! A clock controller is a block of memory-mapped registers holding PLLs,
//! root clock generators, dividers, clock gates, power domains and block
//! resets. This crate turns a static description of such a block (see
//! [`desc`]) into a live [`ClockController`] that resolves rate requests
//! across the clock tree, sequences enables parent-first, and keeps the
//! voltage corners of the rails the clocks run on at or above what the
//! running rates require.
//!
//! Register access goes through the [`RegisterPort`] trait. The
//! [`emu::EmulatedPort`] implementation models the status bits of every
//! block and journals writes, which is what the tests run against.

mod branch;
mod config;
mod div;
mod gdsc;
mod pll;
mod rate;
mod rcg;
mod reset;
mod sequencer;
mod state;
mod variant;

pub mod controller;
pub mod corner;
pub mod debug;
pub mod desc;
pub mod emu;
pub mod error;
pub mod graph;
pub mod port;
pub mod registers;

#[cfg(test)]
mod testing;

pub use controller::{build_controller, ClockController, ControllerBuilder, ResetId};
pub use corner::{corner_for_rate, Corner, RegulatorHandle, VoltageRail, Voter};
pub use debug::{ClockEvent, EventSink, LogSink};
pub use error::{ClockError, Result};
pub use graph::{Graph, NodeId};
pub use port::{PollTimeout, RegisterPort};
pub use state::{BranchState, PowerState};
