// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Fabia fractional PLL.
//!
//! The output rate is `parent * (L + alpha / 2^alpha_width)`. L lands in
//! `L_VAL`, alpha in `FRAC`. A running PLL picks up new values only after the
//! `UPDATE` handshake, followed by a fresh lock.

use tock_registers::LocalRegisterCopy;

use crate::config::CONFIG;
use crate::desc::{PllConfig, PllDesc, VcoBand};
use crate::error::{ClockError, Result};
use crate::port::RegisterPort;
use crate::registers::{field_mask, pll, PllModeVal, PLL_MODE, PLL_OPMODE, PLL_USER_CTL};

/// Output rate of a PLL programmed with `l` and `alpha`.
pub(crate) fn rate_of(prate: u64, l: u32, alpha: u32, alpha_width: u8) -> u64 {
    let frac = (u128::from(prate) * u128::from(alpha)) >> alpha_width;
    prate * u64::from(l) + frac as u64
}

/// First band in table order that contains `rate`.
pub(crate) fn band_for(vco: &[VcoBand], rate: u64) -> Option<&VcoBand> {
    vco.iter()
        .find(|band| band.min_rate <= rate && rate <= band.max_rate)
}

/// L and alpha reaching at least `rate` off `prate`.
///
/// Alpha is rounded up, so the achieved rate may exceed the request by the
/// configured margin but never falls below it.
pub(crate) fn solve(desc: &PllDesc, prate: u64, rate: u64) -> Option<(PllConfig, u64)> {
    if prate == 0 {
        return None;
    }
    band_for(desc.vco, rate)?;

    let mut l = rate / prate;
    let remainder = u128::from(rate % prate);
    let mut alpha = ((remainder << desc.alpha_width) + u128::from(prate) - 1) / u128::from(prate);
    if alpha >> desc.alpha_width != 0 {
        l += 1;
        alpha = 0;
    }
    let config = PllConfig {
        l: u32::try_from(l).ok()?,
        alpha: alpha as u32,
    };

    let achieved = rate_of(prate, config.l, config.alpha, desc.alpha_width);
    if achieved < rate || achieved > rate.saturating_add(CONFIG.pll_rate_margin_hz) {
        return None;
    }
    Some((config, achieved))
}

/// Current L/alpha pair.
pub(crate) fn read_config(port: &dyn RegisterPort, desc: &PllDesc) -> PllConfig {
    PllConfig {
        l: port.read32(desc.offset + pll::L_VAL) & field_mask(0, 16),
        alpha: port.read32(desc.offset + pll::FRAC) & field_mask(0, desc.alpha_width),
    }
}

pub(crate) fn is_enabled(port: &dyn RegisterPort, desc: &PllDesc) -> bool {
    let mode = PllModeVal::new(port.read32(desc.offset + pll::MODE));
    let opmode = LocalRegisterCopy::<u32, PLL_OPMODE::Register>::new(
        port.read32(desc.offset + pll::OPMODE),
    );
    mode.is_set(PLL_MODE::OUTCTRL) && opmode.matches_all(PLL_OPMODE::MODE::Run)
}

/// Write L and alpha. A running PLL is latched and must relock.
pub(crate) fn program(
    port: &dyn RegisterPort,
    desc: &PllDesc,
    config: PllConfig,
    running: bool,
) -> Result<()> {
    port.write32(desc.offset + pll::L_VAL, config.l);
    port.write32(desc.offset + pll::FRAC, config.alpha);
    if !running {
        return Ok(());
    }

    let mode = desc.offset + pll::MODE;
    let update = PLL_MODE::UPDATE.mask << PLL_MODE::UPDATE.shift;
    port.update32(mode, update, update);
    port.poll32(mode, update, 0, CONFIG.pll_lock_timeout)
        .map_err(|timeout| ClockError::RegisterTimeout {
            offset: mode,
            last: timeout.last,
        })?;
    wait_for_lock(port, desc).map_err(|last| ClockError::RegisterTimeout { offset: mode, last })
}

/// Bring the PLL out of standby and open its outputs.
pub(crate) fn enable(port: &dyn RegisterPort, desc: &PllDesc, node: &'static str) -> Result<()> {
    if is_enabled(port, desc) {
        return Ok(());
    }
    let mode = desc.offset + pll::MODE;
    let outctrl = PLL_MODE::OUTCTRL.mask << PLL_MODE::OUTCTRL.shift;
    let reset_n = PLL_MODE::RESET_N.mask << PLL_MODE::RESET_N.shift;

    port.update32(mode, outctrl, 0);
    port.write32(desc.offset + pll::OPMODE, PLL_OPMODE::MODE::Standby.value);
    port.update32(mode, reset_n, reset_n);
    port.write32(desc.offset + pll::OPMODE, PLL_OPMODE::MODE::Run.value);
    wait_for_lock(port, desc).map_err(|last| ClockError::EnableTimeout {
        node,
        offset: mode,
        last,
    })?;

    port.update32(desc.offset + pll::USER_CTL, outputs(), outputs());
    port.update32(mode, outctrl, outctrl);
    Ok(())
}

pub(crate) fn disable(port: &dyn RegisterPort, desc: &PllDesc) {
    let outctrl = PLL_MODE::OUTCTRL.mask << PLL_MODE::OUTCTRL.shift;
    port.update32(desc.offset + pll::MODE, outctrl, 0);
    port.update32(desc.offset + pll::USER_CTL, outputs(), 0);
    port.write32(desc.offset + pll::OPMODE, PLL_OPMODE::MODE::Standby.value);
}

fn outputs() -> u32 {
    (PLL_USER_CTL::OUT_MAIN::SET + PLL_USER_CTL::OUT_EVEN::SET + PLL_USER_CTL::OUT_ODD::SET).value
}

fn wait_for_lock(port: &dyn RegisterPort, desc: &PllDesc) -> core::result::Result<(), u32> {
    let lock = PLL_MODE::LOCK_DET.mask << PLL_MODE::LOCK_DET.shift;
    port.poll32(desc.offset + pll::MODE, lock, lock, CONFIG.pll_lock_timeout)
        .map_err(|timeout| timeout.last)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANDS: &[VcoBand] = &[
        VcoBand {
            min_rate: 249_600_000,
            max_rate: 2_000_000_000,
            band_id: 0,
        },
        VcoBand {
            min_rate: 125_000_000,
            max_rate: 1_000_000_000,
            band_id: 1,
        },
    ];

    const PLL: PllDesc = PllDesc {
        offset: 0,
        parent: "bi_tcxo",
        vco: BANDS,
        alpha_width: 16,
        initial: None,
    };

    #[test]
    fn test_solve_exact_fraction() {
        let (config, achieved) = solve(&PLL, 19_200_000, 600_000_000).unwrap();
        assert_eq!(config, PllConfig { l: 0x1f, alpha: 0x4000 });
        assert_eq!(achieved, 600_000_000);
    }

    #[test]
    fn test_solve_rounds_alpha_up() {
        let (config, achieved) = solve(&PLL, 19_200_000, 808_000_000).unwrap();
        assert_eq!(config.l, 0x2a);
        assert_eq!(config.alpha, 0x1556);
        assert!(achieved >= 808_000_000 && achieved <= 808_000_500);
    }

    #[test]
    fn test_solve_integer_multiple() {
        let (config, achieved) = solve(&PLL, 19_200_000, 960_000_000).unwrap();
        assert_eq!(config, PllConfig { l: 0x32, alpha: 0 });
        assert_eq!(achieved, 960_000_000);
    }

    #[test]
    fn test_solve_outside_vco_bands() {
        assert_eq!(solve(&PLL, 19_200_000, 100_000_000), None);
        assert_eq!(solve(&PLL, 19_200_000, 2_400_000_000), None);
        assert_eq!(solve(&PLL, 0, 600_000_000), None);
    }

    #[test]
    fn test_overlapping_bands_pick_first() {
        assert_eq!(band_for(BANDS, 600_000_000).map(|b| b.band_id), Some(0));
        assert_eq!(band_for(BANDS, 200_000_000).map(|b| b.band_id), Some(1));
    }

    #[test]
    fn test_rate_of_initial_configs() {
        assert_eq!(rate_of(19_200_000, 0x2c, 0xcaaa, 16), 859_999_804);
        assert_eq!(rate_of(19_200_000, 0x1d, 0x2aaa, 16), 559_999_804);
    }
}
