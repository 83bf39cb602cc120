// Licensed under the Apache-2.0 license

//! Bridge top level.
//!
//! Every tick: synchronize all inputs, step the control-plane target, step
//! the data-plane engine, then commit register writes and status mirrors.
//! Commits land at the end of the tick, so a register read issued on the
//! same tick as a write observes the old value.

use crate::common::{ConfigurationError, Drive, Logger, NoOpLogger};
use crate::i2c::{
    I2cTarget, I2cTargetConfig, I2cTargetConfigBuilder, TargetEvent, TargetOutput, TargetStatus,
};
use crate::regs::RegisterFile;
use crate::spi::{SpiEvent, SpiOutput, SpiTarget, SpiTargetConfig};
use crate::sync::{
    SyncChain, Synchronizer, CONTROL_SYNC_STAGES, DATA_SYNC_STAGES, PIN_SYNC_STAGES,
};
use embedded_hal::spi::Mode;

/// Raw pin levels entering the bridge on one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinInputs {
    pub scl: bool,
    pub sda: bool,
    pub sclk: bool,
    pub mosi: bool,
    pub cs_n: bool,
    pub switches: u16,
}

impl PinInputs {
    /// Every bus idle for the given data-plane mode.
    #[must_use]
    pub fn idle(mode: Mode) -> Self {
        Self {
            scl: true,
            sda: true,
            sclk: SpiTargetConfig::new(mode).idle_clock(),
            mosi: false,
            cs_n: true,
            switches: 0,
        }
    }
}

/// Pin drive leaving the bridge after one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct PinOutputs {
    pub sda: Drive,
    pub miso: Option<bool>,
    pub leds: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct BridgeConfig {
    pub i2c: I2cTargetConfig,
    pub spi: SpiTargetConfig,
}

#[derive(Default)]
pub struct BridgeConfigBuilder {
    i2c: I2cTargetConfigBuilder,
    spi: SpiTargetConfig,
}

impl BridgeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn address(mut self, address: u8) -> Self {
        self.i2c = self.i2c.address(address);
        self
    }
    #[must_use]
    pub fn debounce(mut self, ticks: u16) -> Self {
        self.i2c = self.i2c.debounce(ticks);
        self
    }
    #[must_use]
    pub fn spi_mode(mut self, mode: Mode) -> Self {
        self.spi = SpiTargetConfig::new(mode);
        self
    }
    /// # Errors
    ///
    /// Propagates [`ConfigurationError`] from the I2C target settings.
    pub fn build(self) -> Result<BridgeConfig, ConfigurationError> {
        Ok(BridgeConfig {
            i2c: self.i2c.build()?,
            spi: self.spi,
        })
    }
}

pub struct Bridge<L: Logger = NoOpLogger> {
    config: BridgeConfig,
    scl: Synchronizer<CONTROL_SYNC_STAGES>,
    sda: Synchronizer<CONTROL_SYNC_STAGES>,
    sclk: Synchronizer<DATA_SYNC_STAGES>,
    mosi: Synchronizer<DATA_SYNC_STAGES>,
    cs_n: Synchronizer<DATA_SYNC_STAGES>,
    switches: SyncChain<u16, PIN_SYNC_STAGES>,
    i2c: I2cTarget,
    spi: SpiTarget,
    regs: RegisterFile,
    outputs: PinOutputs,
    cycle: u64,
    logger: L,
}

impl Bridge<NoOpLogger> {
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_logger(config, NoOpLogger)
    }
}

impl<L: Logger> Bridge<L> {
    pub fn with_logger(config: BridgeConfig, logger: L) -> Self {
        let debounce = config.i2c.debounce;
        let idle = PinInputs::idle(config.spi.mode);
        Self {
            config,
            scl: Synchronizer::with_debounce(idle.scl, debounce),
            sda: Synchronizer::with_debounce(idle.sda, debounce),
            sclk: Synchronizer::new(idle.sclk),
            mosi: Synchronizer::new(idle.mosi),
            cs_n: Synchronizer::new(idle.cs_n),
            switches: SyncChain::new(idle.switches),
            i2c: I2cTarget::new(&config.i2c),
            spi: SpiTarget::new(&config.spi),
            regs: RegisterFile::new(),
            outputs: PinOutputs::default(),
            cycle: 0,
            logger,
        }
    }

    /// Synchronous reset: engines idle, registers at reset values, inputs
    /// assumed idle.
    pub fn reset(&mut self) {
        self.scl.reset();
        self.sda.reset();
        self.sclk.reset();
        self.mosi.reset();
        self.cs_n.reset();
        self.switches.fill(0);
        self.i2c.reset();
        self.spi.reset();
        self.regs.reset();
        self.outputs = PinOutputs::default();
        self.cycle = 0;
        self.logger.debug(format_args!("bridge: reset"));
    }

    /// Advance one domain clock tick.
    pub fn tick(&mut self, pins: &PinInputs) -> PinOutputs {
        let scl = self.scl.sample(pins.scl);
        let sda = self.sda.sample(pins.sda);
        let sclk = self.sclk.sample(pins.sclk);
        let mosi = self.mosi.sample(pins.mosi);
        let cs_n = self.cs_n.sample(pins.cs_n);
        let switches = self.switches.clock(pins.switches);

        let control = self.i2c.step(scl, sda, &self.regs);
        let data = self.spi.step(sclk, mosi, cs_n);

        self.commit(&control, &data, switches);
        self.trace(&control, &data);

        self.outputs = PinOutputs {
            sda: control.sda,
            miso: data.miso,
            leds: self.regs.leds(),
        };
        self.cycle = self.cycle.wrapping_add(1);
        self.outputs
    }

    fn commit(&mut self, control: &TargetOutput, data: &SpiOutput, switches: u16) {
        if let Some(strobe) = control.write {
            self.regs.write(strobe.address, strobe.data);
        }
        self.regs.set_switches(switches);
        self.regs.set_data_active(data.active);
        if let Some(byte) = data.received {
            self.regs.set_data_rx(byte);
        }
        if matches!(data.event, Some(SpiEvent::FrameAborted { .. })) {
            self.regs.raise_error();
        }
    }

    fn trace(&mut self, control: &TargetOutput, data: &SpiOutput) {
        let cycle = self.cycle;
        match control.event {
            Some(TargetEvent::AddressRejected(addr)) => self
                .logger
                .debug(format_args!("{cycle}: i2c address 0x{addr:02X} not ours")),
            Some(event) => self.logger.debug(format_args!("{cycle}: i2c {event:?}")),
            None => {}
        }
        match data.event {
            Some(SpiEvent::FrameAborted { bits }) => self
                .logger
                .warn(format_args!("{cycle}: spi frame ended after {bits} bits of a byte")),
            Some(event) => self.logger.debug(format_args!("{cycle}: spi {event:?}")),
            None => {}
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    #[must_use]
    pub fn i2c_status(&self) -> TargetStatus {
        self.i2c.status()
    }

    #[must_use]
    pub fn spi_target(&self) -> &SpiTarget {
        &self.spi
    }

    /// Drive levels produced by the last tick.
    #[must_use]
    pub fn outputs(&self) -> PinOutputs {
        self.outputs
    }

    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    pub fn into_logger(self) -> L {
        self.logger
    }
}
