// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register access port.
//!
//! The engine never touches memory-mapped I/O directly. Each controller
//! instance borrows one [`RegisterPort`] that covers its address window, and
//! every read, write and bounded wait goes through it. A board supplies the
//! real transport; tests use [`crate::emu::EmulatedPort`].

use core::time::Duration;

/// A bounded wait expired before the register matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    /// Value of the register at the last read.
    pub last: u32,
}

/// 32-bit register window of one clock controller.
///
/// Offsets are byte offsets from the start of the window.
pub trait RegisterPort: Send + Sync {
    fn read32(&self, offset: u32) -> u32;

    fn write32(&self, offset: u32, value: u32);

    /// Wait until `read32(offset) & mask == expected`, for at most `timeout`.
    fn poll32(
        &self,
        offset: u32,
        mask: u32,
        expected: u32,
        timeout: Duration,
    ) -> Result<(), PollTimeout>;

    /// Read-modify-write of the bits in `mask`.
    ///
    /// The write is skipped when the register already holds the value.
    fn update32(&self, offset: u32, mask: u32, value: u32) {
        let old = self.read32(offset);
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write32(offset, new);
        }
    }

    /// Busy delay used where the hardware offers no status bit to poll.
    fn delay_us(&self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }
}
