// Licensed under the Apache-2.0 license

//! Register addresses, reset values and typed bit views.
//!
//! Blocks: system 0x00-0x0F, link 0x10-0x1F, I/O 0x20-0x2F, data engine
//! 0x30-0x3F.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const DEVICE_ID: u8 = 0x00;
pub const VERSION_MAJ: u8 = 0x01;
pub const VERSION_MIN: u8 = 0x02;
pub const SYS_STATUS: u8 = 0x03;
pub const SYS_CTRL: u8 = 0x04;
pub const SCRATCH0: u8 = 0x05;
pub const SCRATCH1: u8 = 0x06;

pub const LINK_CAPS: u8 = 0x10;
pub const DATA_MODE: u8 = 0x11;
pub const DATA_CLK_DIV: u8 = 0x12;
pub const DATA_STATUS: u8 = 0x13;

pub const LED_OUT: u8 = 0x20;
pub const LED_OUT_H: u8 = 0x21;
pub const SW_IN: u8 = 0x22;
pub const SW_IN_H: u8 = 0x23;

pub const DATA_RX_LAST: u8 = 0x30;

pub const EXPECTED_DEVICE_ID: u8 = 0xA7;
pub const EXPECTED_VERSION_MAJ: u8 = 0x01;

/// SYS_STATUS bits.
pub const STATUS_READY: u8 = 1 << 7;
pub const STATUS_DATA_ACTIVE: u8 = 1 << 6;
pub const STATUS_ERROR: u8 = 1 << 5;
pub const STATUS_IRQ_PENDING: u8 = 1 << 4;

/// SYS_CTRL bits.
pub const CTRL_IRQ_ENABLE: u8 = 1 << 0;

/// DATA_STATUS bits.
pub const DATA_STATUS_ACTIVE: u8 = 1 << 7;

/// Write policy of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Host writes are discarded.
    ReadOnly,
    /// Host writes store the byte verbatim.
    ReadWrite,
    /// Writing 1 to a bit in `mask` clears it; all other bits ignore writes.
    WriteOneToClear { mask: u8 },
}

/// Static description of one mapped register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDef {
    pub address: u8,
    pub name: &'static str,
    pub access: Access,
    pub reset: u8,
}

impl RegisterDef {
    const fn new(address: u8, name: &'static str, access: Access, reset: u8) -> Self {
        Self {
            address,
            name,
            access,
            reset,
        }
    }
}

/// The bridge register map, sorted by address.
pub const REGISTER_MAP: &[RegisterDef] = &[
    RegisterDef::new(DEVICE_ID, "DEVICE_ID", Access::ReadOnly, EXPECTED_DEVICE_ID),
    RegisterDef::new(VERSION_MAJ, "VERSION_MAJ", Access::ReadOnly, EXPECTED_VERSION_MAJ),
    RegisterDef::new(VERSION_MIN, "VERSION_MIN", Access::ReadOnly, 0x00),
    RegisterDef::new(
        SYS_STATUS,
        "SYS_STATUS",
        Access::WriteOneToClear { mask: STATUS_ERROR },
        STATUS_READY,
    ),
    RegisterDef::new(SYS_CTRL, "SYS_CTRL", Access::ReadWrite, 0x00),
    RegisterDef::new(SCRATCH0, "SCRATCH0", Access::ReadWrite, 0x00),
    RegisterDef::new(SCRATCH1, "SCRATCH1", Access::ReadWrite, 0x00),
    RegisterDef::new(LINK_CAPS, "LINK_CAPS", Access::ReadOnly, 0x15),
    RegisterDef::new(DATA_MODE, "DATA_MODE", Access::ReadWrite, 0x00),
    RegisterDef::new(DATA_CLK_DIV, "DATA_CLK_DIV", Access::ReadWrite, 0x04),
    RegisterDef::new(DATA_STATUS, "DATA_STATUS", Access::ReadOnly, 0x00),
    RegisterDef::new(LED_OUT, "LED_OUT", Access::ReadWrite, 0x00),
    RegisterDef::new(LED_OUT_H, "LED_OUT_H", Access::ReadWrite, 0x00),
    RegisterDef::new(SW_IN, "SW_IN", Access::ReadOnly, 0x00),
    RegisterDef::new(SW_IN_H, "SW_IN_H", Access::ReadOnly, 0x00),
    RegisterDef::new(DATA_RX_LAST, "DATA_RX_LAST", Access::ReadOnly, 0x00),
];

/// LINK_CAPS view: what the data plane of this build supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCaps(pub u8);

impl LinkCaps {
    /// Bus width tier: 0 = x1, 1 = x2, 2 = x4, 3 = x8.
    #[must_use]
    pub const fn width_tier(self) -> u8 {
        (self.0 >> 6) & 0x03
    }

    #[must_use]
    pub const fn bus_width(self) -> u8 {
        1 << self.width_tier()
    }

    /// Clock tier: 0 = 10 MHz, 1 = 25 MHz, 2 = 50 MHz, 3 = 100 MHz.
    #[must_use]
    pub const fn clock_tier(self) -> u8 {
        (self.0 >> 4) & 0x03
    }

    #[must_use]
    pub const fn max_clock_mhz(self) -> u32 {
        match self.clock_tier() {
            0 => 10,
            1 => 25,
            2 => 50,
            _ => 100,
        }
    }

    #[must_use]
    pub const fn wide_interface(self) -> bool {
        self.0 & (1 << 3) != 0
    }

    #[must_use]
    pub const fn dma(self) -> bool {
        self.0 & (1 << 2) != 0
    }

    #[must_use]
    pub const fn crc(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    #[must_use]
    pub const fn irq(self) -> bool {
        self.0 & 1 != 0
    }
}

/// Data-plane transport selected in DATA_MODE[1:0].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataPlaneMode {
    Spi = 0,
    SpiHigh = 1,
    Qspi = 2,
    Fmc = 3,
}

impl DataPlaneMode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Spi,
            1 => Self::SpiHigh,
            2 => Self::Qspi,
            _ => Self::Fmc,
        }
    }
}

/// DATA_MODE view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataMode(pub u8);

impl DataMode {
    const ENABLE: u8 = 1 << 7;
    const LOOPBACK: u8 = 1 << 6;

    #[must_use]
    pub const fn new(mode: DataPlaneMode, enable: bool) -> Self {
        Self((mode as u8) | if enable { Self::ENABLE } else { 0 })
    }

    #[must_use]
    pub const fn with_loopback(self, loopback: bool) -> Self {
        if loopback {
            Self(self.0 | Self::LOOPBACK)
        } else {
            Self(self.0 & !Self::LOOPBACK)
        }
    }

    /// Width selector in bits 3:2.
    #[must_use]
    pub const fn with_width(self, width: u8) -> Self {
        Self((self.0 & !0x0C) | ((width & 0x03) << 2))
    }

    #[must_use]
    pub const fn enabled(self) -> bool {
        self.0 & Self::ENABLE != 0
    }

    #[must_use]
    pub const fn loopback(self) -> bool {
        self.0 & Self::LOOPBACK != 0
    }

    #[must_use]
    pub const fn width(self) -> u8 {
        (self.0 >> 2) & 0x03
    }

    #[must_use]
    pub const fn mode(self) -> DataPlaneMode {
        DataPlaneMode::from_bits(self.0)
    }
}

/// SYS_STATUS view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysStatus(pub u8);

impl SysStatus {
    #[must_use]
    pub const fn ready(self) -> bool {
        self.0 & STATUS_READY != 0
    }

    #[must_use]
    pub const fn data_active(self) -> bool {
        self.0 & STATUS_DATA_ACTIVE != 0
    }

    #[must_use]
    pub const fn error(self) -> bool {
        self.0 & STATUS_ERROR != 0
    }

    #[must_use]
    pub const fn irq_pending(self) -> bool {
        self.0 & STATUS_IRQ_PENDING != 0
    }
}

/// Raw layout of the system block as returned by a burst read starting
/// at DEVICE_ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct SystemBlock {
    pub device_id: u8,
    pub version_maj: u8,
    pub version_min: u8,
    pub sys_status: u8,
    pub sys_ctrl: u8,
    pub scratch0: u8,
    pub scratch1: u8,
}

impl SystemBlock {
    pub const LEN: usize = core::mem::size_of::<Self>();

    #[must_use]
    pub fn from_raw(raw: [u8; SystemBlock::LEN]) -> Self {
        zerocopy::transmute!(raw)
    }

    /// Decode a burst read. Returns `None` unless `bytes` is exactly one
    /// block long.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Self::read_from_bytes(bytes).ok()
    }

    #[must_use]
    pub const fn info(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: self.device_id,
            version_maj: self.version_maj,
            version_min: self.version_min,
            status: SysStatus(self.sys_status),
        }
    }
}

/// Identity and health summary a host checks at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: u8,
    pub version_maj: u8,
    pub version_min: u8,
    pub status: SysStatus,
}

impl DeviceInfo {
    /// True for a ready bridge of the expected identity and major version.
    #[must_use]
    pub const fn is_compatible(&self) -> bool {
        self.device_id == EXPECTED_DEVICE_ID
            && self.version_maj == EXPECTED_VERSION_MAJ
            && self.status.ready()
    }
}
