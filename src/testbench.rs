// Licensed under the Apache-2.0 license

//! Host-side simulation harness.
//!
//! The testbench owns one [`Bridge`] and plays the host: it resolves the
//! open-drain I2C lines, steps the host SPI model and advances the domain
//! clock. Bus-functional masters borrow it through [`Testbench::i2c`] and
//! [`Testbench::spi`]. A background SPI frame started with
//! [`Testbench::start_spi`] keeps clocking while the I2C master runs.

use crate::bridge::{Bridge, BridgeConfig, PinInputs};
use crate::common::{resolve_open_drain, ConfigurationError, Drive, Logger, NoOpLogger};
use crate::i2c::I2cMaster;
use crate::spi::{self, Frame, SpiHost, SpiMaster};
use crate::sync::{input_latency, CONTROL_SYNC_STAGES};
use crate::timing::BusTiming;

pub struct Testbench<L: Logger = NoOpLogger> {
    bridge: Bridge<L>,
    timing: BusTiming,
    scl: Drive,
    sda: Drive,
    spi: SpiMaster,
    switches: u16,
}

impl Testbench<NoOpLogger> {
    /// # Errors
    ///
    /// [`ConfigurationError::BusTooFast`] when the I2C clock leaves too
    /// little margin for the configured glitch filter.
    pub fn new(config: BridgeConfig, timing: BusTiming) -> Result<Self, ConfigurationError> {
        Self::with_logger(config, timing, NoOpLogger)
    }
}

impl<L: Logger> Testbench<L> {
    /// # Errors
    ///
    /// See [`Testbench::new`].
    pub fn with_logger(
        config: BridgeConfig,
        timing: BusTiming,
        logger: L,
    ) -> Result<Self, ConfigurationError> {
        timing.check_i2c_latency(input_latency(CONTROL_SYNC_STAGES, config.i2c.debounce))?;
        Ok(Self {
            spi: SpiMaster::new(config.spi.mode, timing.spi_half_ticks()),
            bridge: Bridge::with_logger(config, logger),
            timing,
            scl: Drive::Released,
            sda: Drive::Released,
            switches: 0,
        })
    }

    /// Advance the domain clock by one tick.
    pub fn tick(&mut self) {
        let outputs = self.bridge.outputs();
        let spi = self.spi.step(outputs.miso.unwrap_or(true));
        let pins = PinInputs {
            scl: self.scl_level(),
            sda: self.sda_level(),
            sclk: spi.sclk,
            mosi: spi.mosi,
            cs_n: spi.cs_n,
            switches: self.switches,
        };
        self.bridge.tick(&pins);
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Resolved SCL level. The bridge never stretches the clock.
    #[must_use]
    pub fn scl_level(&self) -> bool {
        resolve_open_drain(&[self.scl])
    }

    /// Resolved SDA level with both the host and the bridge drivers.
    #[must_use]
    pub fn sda_level(&self) -> bool {
        resolve_open_drain(&[self.sda, self.bridge.outputs().sda])
    }

    pub fn drive_scl(&mut self, drive: Drive) {
        self.scl = drive;
    }

    pub fn drive_sda(&mut self, drive: Drive) {
        self.sda = drive;
    }

    pub fn set_switches(&mut self, switches: u16) {
        self.switches = switches;
    }

    #[must_use]
    pub fn leds(&self) -> u16 {
        self.bridge.outputs().leds
    }

    #[must_use]
    pub fn timing(&self) -> &BusTiming {
        &self.timing
    }

    #[must_use]
    pub fn bridge(&self) -> &Bridge<L> {
        &self.bridge
    }

    pub fn logger_mut(&mut self) -> &mut L {
        self.bridge.logger_mut()
    }

    /// Reset the bridge and return every host driver to idle.
    pub fn reset(&mut self) {
        self.scl = Drive::Released;
        self.sda = Drive::Released;
        self.spi = SpiMaster::new(self.bridge.config().spi.mode, self.timing.spi_half_ticks());
        self.bridge.reset();
    }

    /// Bit-banged I2C host on this bench.
    pub fn i2c(&mut self) -> I2cMaster<'_, L> {
        I2cMaster::new(self)
    }

    /// Blocking SPI host on this bench.
    pub fn spi(&mut self) -> SpiHost<'_, L> {
        SpiHost::new(self)
    }

    /// Start clocking one SPI frame in the background.
    ///
    /// # Errors
    ///
    /// [`spi::Error::Busy`] while a frame is in flight,
    /// [`spi::Error::FrameTooLong`] for an oversized frame.
    pub fn start_spi(&mut self, frame: &[u8]) -> Result<(), spi::Error> {
        self.spi.start(frame)
    }

    /// Start a background frame that releases chip select after `bits`
    /// clocks.
    ///
    /// # Errors
    ///
    /// As [`Testbench::start_spi`].
    pub fn start_spi_truncated(&mut self, frame: &[u8], bits: usize) -> Result<(), spi::Error> {
        self.spi.start_truncated(frame, bits)
    }

    /// Poll the background frame, advancing the clock by one tick while it
    /// is still in flight.
    ///
    /// # Errors
    ///
    /// `WouldBlock` until the frame completes; [`spi::Error::Idle`] when no
    /// frame was started.
    pub fn poll_spi(&mut self) -> nb::Result<Frame, spi::Error> {
        match self.spi.take() {
            Err(nb::Error::WouldBlock) => {
                self.tick();
                Err(nb::Error::WouldBlock)
            }
            other => other,
        }
    }

    #[must_use]
    pub fn spi_busy(&self) -> bool {
        self.spi.is_busy()
    }
}
