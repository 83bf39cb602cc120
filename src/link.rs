// Licensed under the Apache-2.0 license

//! Host driver for the bridge control plane.
//!
//! Works over any `embedded_hal::i2c::I2c` bus. Register reads use a
//! write of the register pointer followed by a repeated START.

use core::fmt;

use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::i2c::DEFAULT_TARGET_ADDRESS;
use crate::regs::map::{self, DataMode, DeviceInfo, LinkCaps, SysStatus, SystemBlock};

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<E> {
    Bus(E),
    /// Identity or version does not match this driver.
    UnexpectedDevice(DeviceInfo),
}

impl<E> From<E> for LinkError<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

/// Human-readable bring-up report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemReport {
    pub info: DeviceInfo,
    pub caps: LinkCaps,
}

impl fmt::Display for SystemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.info;
        if info.device_id == map::EXPECTED_DEVICE_ID {
            writeln!(f, "Device:     Artix-7 (Basys 3)")?;
        } else {
            writeln!(f, "Device:     unknown (ID 0x{:02X})", info.device_id)?;
        }
        writeln!(f, "Gateware:   v{}.{}", info.version_maj, info.version_min)?;
        let status = info.status;
        writeln!(
            f,
            "Status:     [0x{:02X}] control {}, data {}, {}",
            status.0,
            if status.ready() { "ready" } else { "busy" },
            if status.data_active() { "active" } else { "idle" },
            if status.error() { "fault" } else { "nominal" },
        )?;
        let phy = match self.caps.width_tier() {
            0 => "standard SPI (1-bit)",
            1 => "dual SPI (2-bit)",
            2 => "quad SPI (4-bit)",
            _ => "FMC (8-bit)",
        };
        write!(
            f,
            "Link:       [0x{:02X}] {phy}, {} MHz, DMA {}",
            self.caps.0,
            self.caps.max_clock_mhz(),
            if self.caps.dma() { "enabled" } else { "disabled" },
        )
    }
}

pub struct LinkClient<I: I2c> {
    bus: I,
    address: SevenBitAddress,
}

impl<I: I2c> LinkClient<I> {
    pub fn new(bus: I) -> Self {
        Self::with_address(bus, DEFAULT_TARGET_ADDRESS)
    }

    pub fn with_address(bus: I, address: SevenBitAddress) -> Self {
        Self { bus, address }
    }

    pub fn release(self) -> I {
        self.bus
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn read_register(&mut self, register: u8) -> Result<u8, I::Error> {
        let mut value = [0u8];
        self.bus.write_read(self.address, &[register], &mut value)?;
        let [byte] = value;
        Ok(byte)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), I::Error> {
        self.bus.write(self.address, &[register, value])
    }

    /// Read consecutive registers starting at `register`.
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn read_burst(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), I::Error> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.bus.write_read(self.address, &[register], buffer)
    }

    /// Read and check the system block.
    ///
    /// # Errors
    ///
    /// [`LinkError::UnexpectedDevice`] when the identity check fails.
    pub fn probe(&mut self) -> Result<DeviceInfo, LinkError<I::Error>> {
        let mut raw = [0u8; SystemBlock::LEN];
        self.read_burst(map::DEVICE_ID, &mut raw)?;
        let info = SystemBlock::from_raw(raw).info();
        if info.is_compatible() {
            Ok(info)
        } else {
            Err(LinkError::UnexpectedDevice(info))
        }
    }

    /// Identity, status and capabilities in one report.
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transfers.
    pub fn system_report(&mut self) -> Result<SystemReport, I::Error> {
        let mut raw = [0u8; SystemBlock::LEN];
        self.read_burst(map::DEVICE_ID, &mut raw)?;
        Ok(SystemReport {
            info: SystemBlock::from_raw(raw).info(),
            caps: self.link_caps()?,
        })
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn status(&mut self) -> Result<SysStatus, I::Error> {
        self.read_register(map::SYS_STATUS).map(SysStatus)
    }

    /// Clear the sticky error flag.
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn clear_error(&mut self) -> Result<(), I::Error> {
        self.write_register(map::SYS_STATUS, map::STATUS_ERROR)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn set_irq_enable(&mut self, enable: bool) -> Result<(), I::Error> {
        let value = if enable { map::CTRL_IRQ_ENABLE } else { 0 };
        self.write_register(map::SYS_CTRL, value)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn link_caps(&mut self) -> Result<LinkCaps, I::Error> {
        self.read_register(map::LINK_CAPS).map(LinkCaps)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn data_mode(&mut self) -> Result<DataMode, I::Error> {
        self.read_register(map::DATA_MODE).map(DataMode)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn set_data_mode(&mut self, mode: DataMode) -> Result<(), I::Error> {
        self.write_register(map::DATA_MODE, mode.0)
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn set_leds(&mut self, leds: u16) -> Result<(), I::Error> {
        let [low, high] = leds.to_le_bytes();
        self.bus.write(self.address, &[map::LED_OUT, low, high])
    }

    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn switches(&mut self) -> Result<u16, I::Error> {
        let mut raw = [0u8; 2];
        self.read_burst(map::SW_IN, &mut raw)?;
        Ok(u16::from_le_bytes(raw))
    }

    /// Last byte the data plane assembled.
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn data_rx_last(&mut self) -> Result<u8, I::Error> {
        self.read_register(map::DATA_RX_LAST)
    }

    /// True while a data-plane frame is in progress.
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transfer.
    pub fn data_active(&mut self) -> Result<bool, I::Error> {
        self.read_register(map::DATA_STATUS)
            .map(|status| status & map::DATA_STATUS_ACTIVE != 0)
    }
}
