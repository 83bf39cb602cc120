// Licensed under the Apache-2.0 license

//! Register port traits.
//!
//! The target engine never owns the register file. It reads through
//! [`RegisterRead`] while loading transmit bytes and hands writes back to
//! the caller as [`WriteStrobe`](super::WriteStrobe)s, which the owner
//! applies through [`RegisterWrite`] at the end of the tick.

/// Read side of the host-visible register space.
pub trait RegisterRead {
    /// Current value at `address`. Unmapped addresses read as 0. Reading
    /// has no side effects.
    fn read_register(&self, address: u8) -> u8;
}

/// Write side of the host-visible register space.
pub trait RegisterWrite: RegisterRead {
    /// Apply a host write. The access policy of the addressed register
    /// decides what, if anything, changes.
    fn write_register(&mut self, address: u8, data: u8);
}

impl RegisterRead for [u8; 256] {
    fn read_register(&self, address: u8) -> u8 {
        self.get(usize::from(address)).copied().unwrap_or(0)
    }
}

impl RegisterWrite for [u8; 256] {
    fn write_register(&mut self, address: u8, data: u8) {
        if let Some(slot) = self.get_mut(usize::from(address)) {
            *slot = data;
        }
    }
}
