// Licensed under the Apache-2.0 license

//! Host bus clocking relative to the bridge domain clock.

use fugit::HertzU32;

use crate::common::ConfigurationError;
use crate::sync::{CONTROL_SYNC_STAGES, DATA_SYNC_STAGES};

/// Shortest SPI half period the data plane can follow: the synchronizer
/// delay plus one tick for the output to settle and one for the host to
/// sample it.
pub const MIN_SPI_HALF_TICKS: u32 = DATA_SYNC_STAGES as u32 + 2;

/// Shortest I2C quarter period for a given input latency (synchronizer
/// plus glitch filter). SDA released by the target after a synchronized
/// SCL fall must itself be synchronized before SCL rises again.
#[must_use]
pub const fn min_i2c_quarter_ticks(latency: u32) -> u32 {
    2 * latency + 2
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusTiming {
    domain: HertzU32,
    i2c: HertzU32,
    spi: HertzU32,
}

impl Default for BusTiming {
    /// 100 MHz fabric clock, 400 kHz fast-mode I2C, 10 MHz SPI.
    fn default() -> Self {
        Self {
            domain: HertzU32::MHz(100),
            i2c: HertzU32::kHz(400),
            spi: HertzU32::MHz(10),
        }
    }
}

impl BusTiming {
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidFrequency`] for a zero rate,
    /// [`ConfigurationError::BusTooFast`] when either host bus toggles
    /// faster than an unfiltered synchronizer can follow.
    pub fn new(domain: HertzU32, i2c: HertzU32, spi: HertzU32) -> Result<Self, ConfigurationError> {
        if domain.raw() == 0 || i2c.raw() == 0 || spi.raw() == 0 {
            return Err(ConfigurationError::InvalidFrequency);
        }
        let timing = Self { domain, i2c, spi };
        if timing.i2c_quarter_ticks() < min_i2c_quarter_ticks(CONTROL_SYNC_STAGES as u32)
            || timing.spi_half_ticks() < MIN_SPI_HALF_TICKS
        {
            return Err(ConfigurationError::BusTooFast);
        }
        Ok(timing)
    }

    #[must_use]
    pub fn domain(&self) -> HertzU32 {
        self.domain
    }

    #[must_use]
    pub fn i2c(&self) -> HertzU32 {
        self.i2c
    }

    #[must_use]
    pub fn spi(&self) -> HertzU32 {
        self.spi
    }

    /// Domain ticks per quarter SCL period.
    #[must_use]
    pub fn i2c_quarter_ticks(&self) -> u32 {
        self.domain.raw() / self.i2c.raw().saturating_mul(4)
    }

    /// Domain ticks per half SCLK period.
    #[must_use]
    pub fn spi_half_ticks(&self) -> u32 {
        self.domain.raw() / self.spi.raw().saturating_mul(2)
    }

    /// Check that the I2C bus is slow enough for an input latency of
    /// `latency` ticks.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::BusTooFast`] otherwise.
    pub fn check_i2c_latency(&self, latency: u32) -> Result<(), ConfigurationError> {
        if self.i2c_quarter_ticks() < min_i2c_quarter_ticks(latency) {
            Err(ConfigurationError::BusTooFast)
        } else {
            Ok(())
        }
    }
}
