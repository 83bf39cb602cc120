// Licensed under the Apache-2.0 license

//! Common types for the SPI echo target and the host SPI model.

use embedded_hal::spi::{ErrorKind, Mode, Phase, Polarity, MODE_0};

/// Largest frame the host model clocks in one chip-select assertion.
pub const MAX_FRAME_LEN: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpiTargetConfig {
    pub mode: Mode,
}

impl Default for SpiTargetConfig {
    fn default() -> Self {
        Self { mode: MODE_0 }
    }
}

impl SpiTargetConfig {
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// SCLK level while no frame is in progress.
    #[must_use]
    pub fn idle_clock(&self) -> bool {
        self.mode.polarity == Polarity::IdleHigh
    }
}

/// Which SCLK transitions sample and which shift, for a given mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockEdges {
    pub sample_on_rising: bool,
}

impl ClockEdges {
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        let leading_rises = mode.polarity == Polarity::IdleLow;
        let sample_leading = mode.phase == Phase::CaptureOnFirstTransition;
        Self {
            sample_on_rising: leading_rises == sample_leading,
        }
    }
}

/// Data-plane frame events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpiEvent {
    FrameStart,
    ByteReceived(u8),
    FrameEnd,
    /// Chip select released with `bits` of a byte already shifted.
    FrameAborted { bits: u8 },
}

/// Host SPI model errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A frame is already being clocked.
    Busy,
    /// Frame longer than [`MAX_FRAME_LEN`].
    FrameTooLong,
    /// No frame was started.
    Idle,
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Busy => ErrorKind::ChipSelectFault,
            Error::FrameTooLong | Error::Idle => ErrorKind::Other,
        }
    }
}
