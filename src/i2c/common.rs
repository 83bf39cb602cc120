// Licensed under the Apache-2.0 license

//! Common types for the I2C register target and the host bus model.
//!
//! This module provides the target configuration, protocol states, slave
//! events and status reports shared by the engine, the bridge and tests.

use embedded_hal::i2c::SevenBitAddress;

use crate::common::{ConfigurationError, Drive};

/// Address the bridge answers on unless configured otherwise.
pub const DEFAULT_TARGET_ADDRESS: SevenBitAddress = 0x55;

/// Transfer direction carried in bit 0 of the address byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

impl Direction {
    #[must_use]
    pub const fn from_rw_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            Self::Write
        } else {
            Self::Read
        }
    }
}

/// Progress through an acknowledge clock: the rising edge must be seen
/// before the falling edge may end the acknowledge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AckGate {
    AwaitRise,
    AwaitFall,
}

/// Protocol state of the target engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TargetState {
    #[default]
    Idle,
    GetAddr,
    AckAddr(AckGate),
    GetReg,
    AckReg(AckGate),
    WriteData,
    AckWrite(AckGate),
    ReadData,
    WaitAck(AckGate),
}

impl TargetState {
    /// States in which the engine owns SDA. START and STOP detection is
    /// suppressed here so the engine never decodes its own transitions.
    #[must_use]
    pub const fn drives_sda(self) -> bool {
        matches!(
            self,
            Self::AckAddr(_) | Self::AckReg(_) | Self::AckWrite(_) | Self::ReadData
        )
    }
}

/// Slave-side events, reported on the tick they occur.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetEvent {
    Start,
    AddressMatched { read: bool },
    AddressRejected(u8),
    RegisterSelected(u8),
    ByteWritten { address: u8, data: u8 },
    ByteLoaded { address: u8, data: u8 },
    MasterNack,
    Stop,
}

/// One-tick register write request produced by a completed write byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteStrobe {
    pub address: u8,
    pub data: u8,
}

/// Result of one engine step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct TargetOutput {
    pub sda: Drive,
    pub write: Option<WriteStrobe>,
    pub event: Option<TargetEvent>,
}

/// Status information for the target engine
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TargetStatus {
    /// Configured 7-bit address
    pub address: SevenBitAddress,
    /// Current protocol state
    pub state: TargetState,
    /// Register pointer used by the next data byte
    pub register: u8,
    /// Whether a transaction addressed to this target is in progress
    pub busy: bool,
    /// Last event that occurred
    pub last_event: Option<TargetEvent>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct I2cTargetConfig {
    pub address: SevenBitAddress,
    pub debounce: u16,
}

impl Default for I2cTargetConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_TARGET_ADDRESS,
            debounce: 0,
        }
    }
}

pub struct I2cTargetConfigBuilder {
    address: SevenBitAddress,
    debounce: u16,
}

impl Default for I2cTargetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cTargetConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: DEFAULT_TARGET_ADDRESS,
            debounce: 0,
        }
    }
    #[must_use]
    pub fn address(mut self, address: SevenBitAddress) -> Self {
        self.address = address;
        self
    }
    /// Glitch filter width on SCL and SDA, in domain clock ticks.
    #[must_use]
    pub fn debounce(mut self, ticks: u16) -> Self {
        self.debounce = ticks;
        self
    }
    /// # Errors
    ///
    /// Rejects addresses in the reserved ranges 0x00-0x07 and 0x78-0x7F.
    pub fn build(self) -> Result<I2cTargetConfig, ConfigurationError> {
        if !(0x08..=0x77).contains(&self.address) {
            return Err(ConfigurationError::InvalidAddress(self.address));
        }
        Ok(I2cTargetConfig {
            address: self.address,
            debounce: self.debounce,
        })
    }
}
