// Licensed under the Apache-2.0 license

//! SPI echo shift engine.
//!
//! Full duplex, MSB first. The byte shifted out during a byte slot is the
//! last complete byte received, so a host sees its previous byte echoed
//! one slot later. The first slot after reset returns 0x00.

use embedded_hal::spi::Mode;

use super::common::{ClockEdges, SpiEvent, SpiTargetConfig};
use crate::sync::BusSample;

/// Result of one engine step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct SpiOutput {
    /// MISO level, `None` while deselected.
    pub miso: Option<bool>,
    pub active: bool,
    pub received: Option<u8>,
    pub event: Option<SpiEvent>,
}

#[derive(Debug, Clone)]
pub struct SpiTarget {
    mode: Mode,
    edges: ClockEdges,
    active: bool,
    bit_count: u8,
    rx: u8,
    tx: u8,
    last_rx: u8,
}

impl SpiTarget {
    #[must_use]
    pub fn new(config: &SpiTargetConfig) -> Self {
        Self {
            mode: config.mode,
            edges: ClockEdges::for_mode(config.mode),
            active: false,
            bit_count: 0,
            rx: 0,
            tx: 0,
            last_rx: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(&SpiTargetConfig::new(self.mode));
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Byte that the next frame will echo.
    #[must_use]
    pub fn last_received(&self) -> u8 {
        self.last_rx
    }

    /// Advance one tick with synchronized SCLK, MOSI and active-low CS.
    pub fn step(&mut self, sclk: BusSample, mosi: BusSample, cs_n: BusSample) -> SpiOutput {
        let mut event = None;
        let mut received = None;

        if cs_n.falling {
            self.active = true;
            self.bit_count = 0;
            self.rx = 0;
            self.tx = self.last_rx;
            event = Some(SpiEvent::FrameStart);
        } else if cs_n.rising && self.active {
            self.active = false;
            event = Some(if self.bit_count == 0 {
                SpiEvent::FrameEnd
            } else {
                SpiEvent::FrameAborted {
                    bits: self.bit_count,
                }
            });
            self.bit_count = 0;
        }

        if self.active {
            let (sample, drive) = if self.edges.sample_on_rising {
                (sclk.rising, sclk.falling)
            } else {
                (sclk.falling, sclk.rising)
            };
            if sample {
                self.rx = (self.rx << 1) | u8::from(mosi.value);
                if self.bit_count == 7 {
                    self.bit_count = 0;
                    self.last_rx = self.rx;
                    self.tx = self.rx;
                    received = Some(self.rx);
                    event = Some(SpiEvent::ByteReceived(self.rx));
                } else {
                    self.bit_count += 1;
                }
            } else if drive && self.bit_count != 0 {
                // bit 7 stays on the line until the host has sampled it
                self.tx <<= 1;
            }
        }

        SpiOutput {
            miso: self.active.then_some(self.tx & 0x80 != 0),
            active: self.active,
            received,
            event,
        }
    }
}
