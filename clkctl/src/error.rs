// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Error type shared by every clock-controller operation.

use crate::corner::Corner;

/// Failure of a clock-controller operation.
///
/// Errors returned by `set_rate`, `enable` and `disable` mean the hardware
/// may be partially reconfigured. Re-query with `recalc_rate` or the status
/// reads before retrying.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("{node}: no frequency table or VCO band entry fits {rate} Hz")]
    RateOutOfRange { node: &'static str, rate: u64 },

    #[error("{node}: parent chain is not rooted in a fixed source")]
    ParentUnresolved { node: &'static str },

    #[error("{node}: no voltage corner ceiling covers {rate} Hz")]
    CornerUnavailable { node: &'static str, rate: u64 },

    #[error("{regulator}: corner {corner:?} is above the highest supported level")]
    RegulatorLimit {
        regulator: &'static str,
        corner: Corner,
    },

    #[error("{regulator}: rail refused corner {corner:?}")]
    RailFailure {
        regulator: &'static str,
        corner: Corner,
    },

    #[error("register {offset:#06x} did not acknowledge, last read {last:#010x}")]
    RegisterTimeout { offset: u32, last: u32 },

    #[error("{node}: state change not confirmed at {offset:#06x}, last read {last:#010x}")]
    EnableTimeout {
        node: &'static str,
        offset: u32,
        last: u32,
    },

    #[error("{node}: operation not supported by this node kind")]
    NotSupported { node: &'static str },

    #[error("{node}: disable without a matching enable")]
    NotEnabled { node: &'static str },

    #[error("no node named {0}")]
    UnknownNode(String),

    #[error("no reset line {0}")]
    UnknownReset(String),

    #[error("invalid controller description: {0}")]
    InvalidDescription(String),

    #[error("variant {tag} rejected: {reason}")]
    VariantRejected { tag: String, reason: &'static str },
}

pub type Result<T> = core::result::Result<T, ClockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_carries_register_value() {
        let err = ClockError::EnableTimeout {
            node: "cam_cc_bps_clk",
            offset: 0x6024,
            last: 0x8000_0001,
        };
        assert_eq!(
            err.to_string(),
            "cam_cc_bps_clk: state change not confirmed at 0x6024, last read 0x80000001"
        );
    }
}
