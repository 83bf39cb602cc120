// Licensed under the Apache-2.0 license

//! Tick-driven host SPI model.
//!
//! The master is stepped by the testbench on every domain clock tick, so
//! a frame progresses in the background while the I2C model runs.
//! One frame is one chip-select assertion; bytes are clocked back to back.

use embedded_hal::spi::{ErrorType, Mode, Operation, Phase, Polarity, SpiDevice};
use heapless::Vec;

use super::common::{Error, MAX_FRAME_LEN};
use crate::common::Logger;
use crate::testbench::Testbench;

/// Levels the master puts on the data-plane pins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpiPins {
    pub sclk: bool,
    pub mosi: bool,
    pub cs_n: bool,
}

pub type Frame = Vec<u8, MAX_FRAME_LEN>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Setup,
    Leading,
    Trailing,
    Hold,
    Gap,
    Complete,
}

#[derive(Debug, Clone)]
pub struct SpiMaster {
    mode: Mode,
    half_period: u32,
    stage: Stage,
    countdown: u32,
    tx: Frame,
    rx: Frame,
    index: usize,
    bit: u8,
    clocked: usize,
    limit: usize,
    shift_in: u8,
    pins: SpiPins,
}

impl SpiMaster {
    /// `half_period` is the SCLK half period in domain ticks.
    #[must_use]
    pub fn new(mode: Mode, half_period: u32) -> Self {
        let idle = mode.polarity == Polarity::IdleHigh;
        Self {
            mode,
            half_period: half_period.max(1),
            stage: Stage::Idle,
            countdown: 0,
            tx: Vec::new(),
            rx: Vec::new(),
            index: 0,
            bit: 0,
            clocked: 0,
            limit: 0,
            shift_in: 0,
            pins: SpiPins {
                sclk: idle,
                mosi: false,
                cs_n: true,
            },
        }
    }

    #[must_use]
    pub fn pins(&self) -> SpiPins {
        self.pins
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self.stage, Stage::Idle | Stage::Complete)
    }

    fn idle_clock(&self) -> bool {
        self.mode.polarity == Polarity::IdleHigh
    }

    fn capture_leading(&self) -> bool {
        self.mode.phase == Phase::CaptureOnFirstTransition
    }

    fn current_bit(&self) -> bool {
        self.tx
            .get(self.index)
            .is_some_and(|byte| byte & (0x80 >> self.bit) != 0)
    }

    /// Assert chip select and start clocking `frame`.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] while a frame is in flight, [`Error::FrameTooLong`]
    /// when `frame` exceeds [`MAX_FRAME_LEN`].
    pub fn start(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.start_truncated(frame, frame.len() * 8)
    }

    /// Like [`SpiMaster::start`] but release chip select after `bits`
    /// clocks, possibly in the middle of a byte. A trailing partial byte is
    /// not returned.
    ///
    /// # Errors
    ///
    /// As [`SpiMaster::start`].
    pub fn start_truncated(&mut self, frame: &[u8], bits: usize) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        self.tx = Vec::from_slice(frame).map_err(|()| Error::FrameTooLong)?;
        self.limit = bits.min(frame.len() * 8);
        self.clocked = 0;
        self.rx.clear();
        self.index = 0;
        self.bit = 0;
        self.shift_in = 0;
        self.pins.cs_n = false;
        self.pins.sclk = self.idle_clock();
        if self.capture_leading() {
            self.pins.mosi = self.current_bit();
        }
        self.stage = Stage::Setup;
        self.countdown = self.half_period;
        Ok(())
    }

    /// Collect the bytes read back by a finished frame.
    ///
    /// # Errors
    ///
    /// `WouldBlock` while the frame is in flight, [`Error::Idle`] when no
    /// frame was started.
    pub fn take(&mut self) -> nb::Result<Frame, Error> {
        match self.stage {
            Stage::Complete => {
                self.stage = Stage::Idle;
                Ok(core::mem::take(&mut self.rx))
            }
            Stage::Idle => Err(nb::Error::Other(Error::Idle)),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    /// Advance one tick. `miso` is the line level as it stood before this
    /// tick.
    pub fn step(&mut self, miso: bool) -> SpiPins {
        if !self.is_busy() {
            return self.pins;
        }
        if self.countdown > 1 {
            self.countdown -= 1;
            return self.pins;
        }
        self.countdown = self.half_period;
        match self.stage {
            Stage::Setup | Stage::Trailing => {
                if self.clocked >= self.limit {
                    self.stage = Stage::Hold;
                } else {
                    self.leading_edge(miso);
                }
            }
            Stage::Leading => self.trailing_edge(miso),
            Stage::Hold => {
                self.pins.cs_n = true;
                self.stage = Stage::Gap;
            }
            Stage::Gap => self.stage = Stage::Complete,
            Stage::Idle | Stage::Complete => {}
        }
        self.pins
    }

    fn leading_edge(&mut self, miso: bool) {
        self.pins.sclk = !self.idle_clock();
        if self.capture_leading() {
            self.capture(miso);
        } else {
            self.pins.mosi = self.current_bit();
        }
        self.stage = Stage::Leading;
    }

    fn trailing_edge(&mut self, miso: bool) {
        self.pins.sclk = self.idle_clock();
        if !self.capture_leading() {
            self.capture(miso);
        }
        self.clocked += 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            let _ = self.rx.push(self.shift_in);
            self.index += 1;
        }
        if self.capture_leading() {
            self.pins.mosi = self.current_bit();
        }
        self.stage = if self.clocked >= self.limit {
            Stage::Hold
        } else {
            Stage::Trailing
        };
    }

    fn capture(&mut self, miso: bool) {
        self.shift_in = (self.shift_in << 1) | u8::from(miso);
    }
}

/// Blocking [`SpiDevice`] on a testbench.
///
/// A transaction is one chip-select assertion: all operations are
/// concatenated into a single frame and clocked back to back. Delay
/// operations do not stretch the frame.
pub struct SpiHost<'a, L: Logger> {
    bench: &'a mut Testbench<L>,
}

impl<'a, L: Logger> SpiHost<'a, L> {
    pub fn new(bench: &'a mut Testbench<L>) -> Self {
        Self { bench }
    }
}

impl<L: Logger> ErrorType for SpiHost<'_, L> {
    type Error = Error;
}

impl<L: Logger> SpiDevice for SpiHost<'_, L> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut frame = Frame::new();
        for operation in operations.iter() {
            let pushed = match operation {
                Operation::Read(buffer) => frame.resize(frame.len() + buffer.len(), 0),
                Operation::Write(bytes) => frame.extend_from_slice(bytes),
                Operation::Transfer(read, write) => frame.extend_from_slice(write).and_then(|()| {
                    let pad = read.len().saturating_sub(write.len());
                    frame.resize(frame.len() + pad, 0)
                }),
                Operation::TransferInPlace(buffer) => frame.extend_from_slice(buffer),
                Operation::DelayNs(_) => Ok(()),
            };
            pushed.map_err(|()| Error::FrameTooLong)?;
        }

        self.bench.start_spi(&frame)?;
        let received = nb::block!(self.bench.poll_spi())?;

        let mut bytes = received.iter().copied();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Read(buffer) | Operation::TransferInPlace(buffer) => {
                    for slot in buffer.iter_mut() {
                        *slot = bytes.next().unwrap_or(0);
                    }
                }
                Operation::Write(written) => {
                    for _ in bytes.by_ref().take(written.len()) {}
                }
                Operation::Transfer(read, write) => {
                    let slots = read.len().max(write.len());
                    for i in 0..slots {
                        let byte = bytes.next().unwrap_or(0);
                        if let Some(slot) = read.get_mut(i) {
                            *slot = byte;
                        }
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}
