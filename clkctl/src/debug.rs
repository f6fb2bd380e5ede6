// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Observability hooks.
//!
//! The engine itself never logs. Each controller reports what it did as
//! [`ClockEvent`]s to an optional [`EventSink`], after the operation has
//! released the instance lock. [`LogSink`] forwards the events to the `log`
//! facade; tests can install a collecting sink instead.

use crate::corner::Corner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    RateChanged {
        controller: &'static str,
        node: &'static str,
        old: Option<u64>,
        new: u64,
    },
    Enabled {
        controller: &'static str,
        node: &'static str,
    },
    Disabled {
        controller: &'static str,
        node: &'static str,
    },
    /// An RCG was switched to its safe source.
    Parked {
        controller: &'static str,
        node: &'static str,
    },
    /// A parked RCG got its stored configuration back.
    Unparked {
        controller: &'static str,
        node: &'static str,
    },
    CornerCommitted {
        regulator: &'static str,
        corner: Corner,
    },
    Timeout {
        controller: &'static str,
        node: &'static str,
        offset: u32,
        last: u32,
    },
    /// A hardware-retained domain did not confirm a transition in time; the
    /// request was kept anyway.
    HardwareRetained {
        controller: &'static str,
        node: &'static str,
        offset: u32,
        last: u32,
    },
}

pub trait EventSink: Send + Sync {
    fn report(&self, event: &ClockEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn report(&self, event: &ClockEvent) {
        match event {
            ClockEvent::RateChanged {
                controller,
                node,
                old,
                new,
            } => log::debug!("{}: {} {:?} -> {} Hz", controller, node, old, new),
            ClockEvent::Enabled { controller, node } => {
                log::debug!("{}: {} enabled", controller, node)
            }
            ClockEvent::Disabled { controller, node } => {
                log::debug!("{}: {} disabled", controller, node)
            }
            ClockEvent::Parked { controller, node } => {
                log::debug!("{}: {} parked on safe source", controller, node)
            }
            ClockEvent::Unparked { controller, node } => {
                log::debug!("{}: {} restored from safe source", controller, node)
            }
            ClockEvent::CornerCommitted { regulator, corner } => {
                log::info!("{}: corner {:?}", regulator, corner)
            }
            ClockEvent::Timeout {
                controller,
                node,
                offset,
                last,
            } => log::warn!(
                "{}: {} timed out at {:#06x} (last {:#010x})",
                controller,
                node,
                offset,
                last
            ),
            ClockEvent::HardwareRetained {
                controller,
                node,
                offset,
                last,
            } => log::warn!(
                "{}: {} left to hardware, unconfirmed at {:#06x} (last {:#010x})",
                controller,
                node,
                offset,
                last
            ),
        }
    }
}
