// Licensed under the Apache-2.0 license

//! I2C register target.
//!
//! A Mealy machine advanced once per domain clock tick with synchronized
//! SCL and SDA samples. The protocol is the common register framing:
//!
//! ```text
//! write: S | addr+W | A | reg | A | data | A | data | A ... | P
//! read:  S | addr+W | A | reg | A | Sr | addr+R | A | data | A ... data | N | P
//! ```
//!
//! The register pointer advances after every data byte in either
//! direction and wraps at 0xFF. STOP returns the session to idle with the
//! pointer at 0x00, so a bare read transaction starts at DEVICE_ID.

use embedded_hal::i2c::SevenBitAddress;

use super::common::{
    AckGate, Direction, I2cTargetConfig, TargetEvent, TargetOutput, TargetState, TargetStatus,
    WriteStrobe,
};
use super::traits::RegisterRead;
use crate::common::Drive;
use crate::sync::BusSample;

enum Ack {
    Pending(AckGate),
    Done,
}

/// Advance an acknowledge gate by one sample. The falling edge only
/// completes the acknowledge once the rising edge has been latched, which
/// skips the falling edge of the preceding data bit.
fn gate(gate: AckGate, scl: BusSample) -> Ack {
    match gate {
        AckGate::AwaitRise if scl.rising => Ack::Pending(AckGate::AwaitFall),
        AckGate::AwaitFall if scl.falling => Ack::Done,
        other => Ack::Pending(other),
    }
}

#[derive(Debug, Clone)]
pub struct I2cTarget {
    address: SevenBitAddress,
    state: TargetState,
    direction: Direction,
    bit_count: u8,
    shift: u8,
    register: u8,
    tx: u8,
    last_event: Option<TargetEvent>,
}

impl I2cTarget {
    #[must_use]
    pub fn new(config: &I2cTargetConfig) -> Self {
        Self {
            address: config.address,
            state: TargetState::Idle,
            direction: Direction::Write,
            bit_count: 0,
            shift: 0,
            register: 0,
            tx: 0,
            last_event: None,
        }
    }

    /// Session reset: idle, counters and register pointer cleared.
    pub fn reset(&mut self) {
        self.state = TargetState::Idle;
        self.direction = Direction::Write;
        self.register = 0;
        self.tx = 0;
        self.last_event = None;
        self.clear_shift();
    }

    #[must_use]
    pub fn state(&self) -> TargetState {
        self.state
    }

    #[must_use]
    pub fn status(&self) -> TargetStatus {
        TargetStatus {
            address: self.address,
            state: self.state,
            register: self.register,
            busy: !matches!(self.state, TargetState::Idle | TargetState::GetAddr),
            last_event: self.last_event,
        }
    }

    /// Current SDA drive, a function of state alone.
    #[must_use]
    pub fn sda(&self) -> Drive {
        match self.state {
            TargetState::AckAddr(_) | TargetState::AckReg(_) | TargetState::AckWrite(_) => {
                Drive::Low
            }
            TargetState::ReadData => Drive::from_level(self.tx & 0x80 != 0),
            _ => Drive::Released,
        }
    }

    fn clear_shift(&mut self) {
        self.bit_count = 0;
        self.shift = 0;
    }

    /// Shift one bit in MSB first. Returns the byte on the 8th bit.
    fn shift_in(&mut self, bit: bool) -> Option<u8> {
        self.shift = (self.shift << 1) | u8::from(bit);
        if self.bit_count == 7 {
            self.bit_count = 0;
            Some(self.shift)
        } else {
            self.bit_count += 1;
            None
        }
    }

    fn load_tx<R: RegisterRead + ?Sized>(&mut self, regs: &R) -> TargetEvent {
        self.tx = regs.read_register(self.register);
        self.bit_count = 0;
        TargetEvent::ByteLoaded {
            address: self.register,
            data: self.tx,
        }
    }

    /// Advance one tick.
    pub fn step<R: RegisterRead + ?Sized>(
        &mut self,
        scl: BusSample,
        sda: BusSample,
        regs: &R,
    ) -> TargetOutput {
        let mut write = None;
        let event = if !self.state.drives_sda() && scl.value && sda.falling {
            self.clear_shift();
            self.state = TargetState::GetAddr;
            Some(TargetEvent::Start)
        } else if !self.state.drives_sda() && scl.value && sda.rising {
            self.clear_shift();
            self.register = 0;
            self.tx = 0;
            self.state = TargetState::Idle;
            Some(TargetEvent::Stop)
        } else {
            self.advance(scl, sda, regs, &mut write)
        };

        if event.is_some() {
            self.last_event = event;
        }
        TargetOutput {
            sda: self.sda(),
            write,
            event,
        }
    }

    fn advance<R: RegisterRead + ?Sized>(
        &mut self,
        scl: BusSample,
        sda: BusSample,
        regs: &R,
        write: &mut Option<WriteStrobe>,
    ) -> Option<TargetEvent> {
        match self.state {
            TargetState::Idle => None,
            TargetState::GetAddr => {
                if !scl.rising {
                    return None;
                }
                let byte = self.shift_in(sda.value)?;
                let address = byte >> 1;
                if address == self.address {
                    self.direction = Direction::from_rw_bit(byte);
                    self.state = TargetState::AckAddr(AckGate::AwaitRise);
                    Some(TargetEvent::AddressMatched {
                        read: self.direction == Direction::Read,
                    })
                } else {
                    self.state = TargetState::Idle;
                    Some(TargetEvent::AddressRejected(address))
                }
            }
            TargetState::AckAddr(g) => match gate(g, scl) {
                Ack::Pending(g) => {
                    self.state = TargetState::AckAddr(g);
                    None
                }
                Ack::Done => match self.direction {
                    Direction::Read => {
                        self.state = TargetState::ReadData;
                        Some(self.load_tx(regs))
                    }
                    Direction::Write => {
                        self.clear_shift();
                        self.state = TargetState::GetReg;
                        None
                    }
                },
            },
            TargetState::GetReg => {
                if !scl.rising {
                    return None;
                }
                let byte = self.shift_in(sda.value)?;
                // pointer is live before the acknowledge starts
                self.register = byte;
                self.state = TargetState::AckReg(AckGate::AwaitRise);
                Some(TargetEvent::RegisterSelected(byte))
            }
            TargetState::AckReg(g) => match gate(g, scl) {
                Ack::Pending(g) => {
                    self.state = TargetState::AckReg(g);
                    None
                }
                Ack::Done => {
                    self.clear_shift();
                    self.state = TargetState::WriteData;
                    None
                }
            },
            TargetState::WriteData => {
                if scl.rising && self.shift_in(sda.value).is_some() {
                    self.state = TargetState::AckWrite(AckGate::AwaitRise);
                }
                None
            }
            TargetState::AckWrite(g) => match gate(g, scl) {
                Ack::Pending(g) => {
                    self.state = TargetState::AckWrite(g);
                    None
                }
                Ack::Done => {
                    let strobe = WriteStrobe {
                        address: self.register,
                        data: self.shift,
                    };
                    *write = Some(strobe);
                    self.register = self.register.wrapping_add(1);
                    self.clear_shift();
                    self.state = TargetState::WriteData;
                    Some(TargetEvent::ByteWritten {
                        address: strobe.address,
                        data: strobe.data,
                    })
                }
            },
            TargetState::ReadData => {
                if scl.falling {
                    self.tx <<= 1;
                    if self.bit_count == 7 {
                        self.bit_count = 0;
                        self.state = TargetState::WaitAck(AckGate::AwaitRise);
                    } else {
                        self.bit_count += 1;
                    }
                }
                None
            }
            TargetState::WaitAck(AckGate::AwaitRise) => {
                if !scl.rising {
                    return None;
                }
                if sda.value {
                    self.state = TargetState::Idle;
                    Some(TargetEvent::MasterNack)
                } else {
                    self.register = self.register.wrapping_add(1);
                    self.state = TargetState::WaitAck(AckGate::AwaitFall);
                    None
                }
            }
            TargetState::WaitAck(AckGate::AwaitFall) => {
                if !scl.falling {
                    return None;
                }
                self.state = TargetState::ReadData;
                Some(self.load_tx(regs))
            }
        }
    }
}
