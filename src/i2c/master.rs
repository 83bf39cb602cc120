// Licensed under the Apache-2.0 license

//! Bit-banged I2C host for the testbench.
//!
//! Each SCL period is four quarter periods: data changes in the first
//! quarter while SCL is low, SCL is high for the middle two and the host
//! samples SDA at the midpoint of the high phase.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::common::{Drive, Logger};
use crate::testbench::Testbench;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NoAcknowledge(NoAcknowledgeSource),
    /// SDA held low by another driver when the host wanted a START.
    BusBusy,
    InvalidAddress(u8),
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::NoAcknowledge(source) => ErrorKind::NoAcknowledge(*source),
            Error::BusBusy => ErrorKind::Bus,
            Error::InvalidAddress(_) => ErrorKind::Other,
        }
    }
}

pub struct I2cMaster<'a, L: Logger> {
    bench: &'a mut Testbench<L>,
    quarter: u32,
}

impl<'a, L: Logger> I2cMaster<'a, L> {
    pub fn new(bench: &'a mut Testbench<L>) -> Self {
        let quarter = bench.timing().i2c_quarter_ticks();
        Self { bench, quarter }
    }

    fn hold(&mut self, quarters: u32) {
        self.bench.run(self.quarter * quarters);
    }

    fn scl(&mut self, level: bool) {
        self.bench.drive_scl(Drive::from_level(level));
    }

    fn sda(&mut self, level: bool) {
        self.bench.drive_sda(Drive::from_level(level));
    }

    /// START, or repeated START when a transfer is already in progress.
    fn start(&mut self) -> Result<(), Error> {
        if !self.bench.scl_level() {
            self.sda(true);
            self.hold(1);
            self.scl(true);
            self.hold(1);
        }
        if !self.bench.sda_level() {
            return Err(Error::BusBusy);
        }
        self.sda(false);
        self.hold(1);
        self.scl(false);
        self.hold(1);
        Ok(())
    }

    fn stop(&mut self) {
        self.sda(false);
        self.hold(1);
        self.scl(true);
        self.hold(1);
        self.sda(true);
        // bus free time
        self.hold(2);
    }

    fn write_bit(&mut self, bit: bool) {
        self.sda(bit);
        self.hold(1);
        self.scl(true);
        self.hold(2);
        self.scl(false);
        self.hold(1);
    }

    fn read_bit(&mut self) -> bool {
        self.sda(true);
        self.hold(1);
        self.scl(true);
        self.hold(1);
        let bit = self.bench.sda_level();
        self.hold(1);
        self.scl(false);
        self.hold(1);
        bit
    }

    /// Returns true when the byte was acknowledged.
    fn write_byte(&mut self, byte: u8) -> bool {
        for i in (0..8).rev() {
            self.write_bit(byte & (1 << i) != 0);
        }
        !self.read_bit()
    }

    fn read_byte(&mut self, ack: bool) -> u8 {
        let mut byte = 0;
        for _ in 0..8 {
            byte = (byte << 1) | u8::from(self.read_bit());
        }
        self.write_bit(!ack);
        byte
    }

    fn run_operations(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
        started: &mut bool,
    ) -> Result<(), Error> {
        let mut previous_read = None;
        for i in 0..operations.len() {
            let next_read = matches!(operations.get(i + 1), Some(Operation::Read(_)));
            let Some(operation) = operations.get_mut(i) else {
                break;
            };
            let read = matches!(operation, Operation::Read(_));
            if previous_read != Some(read) {
                self.start()?;
                *started = true;
                if !self.write_byte((address << 1) | u8::from(read)) {
                    self.bench
                        .logger_mut()
                        .warn(format_args!("i2c host: no ACK from address 0x{address:02X}"));
                    return Err(Error::NoAcknowledge(NoAcknowledgeSource::Address));
                }
            }
            previous_read = Some(read);

            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        if !self.write_byte(byte) {
                            return Err(Error::NoAcknowledge(NoAcknowledgeSource::Data));
                        }
                    }
                }
                Operation::Read(buffer) => {
                    let len = buffer.len();
                    for (j, slot) in buffer.iter_mut().enumerate() {
                        let last = j + 1 == len && !next_read;
                        *slot = self.read_byte(!last);
                    }
                }
            }
        }
        Ok(())
    }
}

impl<L: Logger> ErrorType for I2cMaster<'_, L> {
    type Error = Error;
}

impl<L: Logger> I2c for I2cMaster<'_, L> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }
        let mut started = false;
        let result = self.run_operations(address, operations, &mut started);
        if started {
            self.stop();
        }
        result
    }
}
