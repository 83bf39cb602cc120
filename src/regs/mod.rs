// Licensed under the Apache-2.0 license

//! Host-visible register file.
//!
//! Storage is a short table sorted by address. Host writes go through the
//! per-register [`Access`] policy; hardware status inputs bypass it through
//! the side-channel setters, which the bridge calls every tick.

pub mod map;

use heapless::Vec;

use crate::i2c::{RegisterRead, RegisterWrite};
pub use map::{Access, RegisterDef, REGISTER_MAP};

/// Upper bound on mapped registers.
pub const MAX_REGISTERS: usize = 32;

/// Rejected register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// Two entries share an address.
    DuplicateAddress(u8),
    /// More entries than [`MAX_REGISTERS`].
    TooManyRegisters,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    def: RegisterDef,
    value: u8,
}

/// Register storage plus live status composition.
const _: () = assert!(map_fits(REGISTER_MAP));

/// True when `defs` is strictly ascending by address and fits the table.
const fn map_fits(defs: &[RegisterDef]) -> bool {
    if defs.len() > MAX_REGISTERS {
        return false;
    }
    let mut rest = defs;
    while let [first, tail @ ..] = rest {
        if let [second, ..] = tail {
            if first.address >= second.address {
                return false;
            }
        }
        rest = tail;
    }
    true
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    slots: Vec<Slot, MAX_REGISTERS>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Register file for the bridge map, at reset values.
    #[must_use]
    pub fn new() -> Self {
        // the bridge map is checked against the table at compile time
        Self::with_map(REGISTER_MAP).unwrap_or_else(|_| Self { slots: Vec::new() })
    }

    /// Register file for an arbitrary map. Entries may come in any order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] when two entries share an address or the map
    /// does not fit.
    pub fn with_map(defs: &[RegisterDef]) -> Result<Self, MapError> {
        let mut slots: Vec<Slot, MAX_REGISTERS> = Vec::new();
        for def in defs {
            match slots.binary_search_by_key(&def.address, |s| s.def.address) {
                Ok(_) => return Err(MapError::DuplicateAddress(def.address)),
                Err(pos) => slots
                    .insert(
                        pos,
                        Slot {
                            def: *def,
                            value: def.reset,
                        },
                    )
                    .map_err(|_| MapError::TooManyRegisters)?,
            }
        }
        Ok(Self { slots })
    }

    fn slot(&self, address: u8) -> Option<&Slot> {
        self.slots
            .binary_search_by_key(&address, |s| s.def.address)
            .ok()
            .and_then(|i| self.slots.get(i))
    }

    fn slot_mut(&mut self, address: u8) -> Option<&mut Slot> {
        match self.slots.binary_search_by_key(&address, |s| s.def.address) {
            Ok(i) => self.slots.get_mut(i),
            Err(_) => None,
        }
    }

    /// Current value; unmapped addresses read 0.
    #[must_use]
    pub fn read(&self, address: u8) -> u8 {
        let stored = self.slot(address).map_or(0, |s| s.value);
        if address == map::SYS_STATUS {
            self.compose_status(stored)
        } else {
            stored
        }
    }

    /// Host write through the access policy. RO and unmapped writes are
    /// dropped without error.
    pub fn write(&mut self, address: u8, data: u8) {
        if let Some(slot) = self.slot_mut(address) {
            match slot.def.access {
                Access::ReadOnly => {}
                Access::ReadWrite => slot.value = data,
                Access::WriteOneToClear { mask } => slot.value &= !(data & mask),
            }
        }
    }

    /// Mapped register description at `address`.
    #[must_use]
    pub fn definition(&self, address: u8) -> Option<&RegisterDef> {
        self.slot(address).map(|s| &s.def)
    }

    /// Mapped addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots.iter().map(|s| s.def.address)
    }

    /// Restore every register to its reset value.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.value = slot.def.reset;
        }
    }

    /// Switch bank mirror.
    pub fn set_switches(&mut self, switches: u16) {
        let [low, high] = switches.to_le_bytes();
        self.set_hardware(map::SW_IN, low);
        self.set_hardware(map::SW_IN_H, high);
    }

    /// Data-plane frame activity.
    pub fn set_data_active(&mut self, active: bool) {
        let bits = if active { map::DATA_STATUS_ACTIVE } else { 0 };
        self.update_hardware(map::DATA_STATUS, map::DATA_STATUS_ACTIVE, bits);
        let bits = if active { map::STATUS_DATA_ACTIVE } else { 0 };
        self.update_hardware(map::SYS_STATUS, map::STATUS_DATA_ACTIVE, bits);
    }

    /// Last byte assembled by the data plane.
    pub fn set_data_rx(&mut self, byte: u8) {
        self.set_hardware(map::DATA_RX_LAST, byte);
    }

    /// Set the sticky error bit. Only a host write-one-to-clear removes it.
    pub fn raise_error(&mut self) {
        self.update_hardware(map::SYS_STATUS, map::STATUS_ERROR, map::STATUS_ERROR);
    }

    /// LED bank driven by LED_OUT and LED_OUT_H.
    #[must_use]
    pub fn leds(&self) -> u16 {
        u16::from_le_bytes([self.read(map::LED_OUT), self.read(map::LED_OUT_H)])
    }

    fn set_hardware(&mut self, address: u8, value: u8) {
        self.update_hardware(address, 0xFF, value);
    }

    fn update_hardware(&mut self, address: u8, mask: u8, bits: u8) {
        if let Some(slot) = self.slot_mut(address) {
            slot.value = (slot.value & !mask) | (bits & mask);
        }
    }

    fn compose_status(&self, stored: u8) -> u8 {
        let ctrl = self.slot(map::SYS_CTRL).map_or(0, |s| s.value);
        let irq_enabled = ctrl & map::CTRL_IRQ_ENABLE != 0;
        let pending = irq_enabled && stored & map::STATUS_ERROR != 0;
        let stored = stored & !map::STATUS_IRQ_PENDING;
        if pending {
            stored | map::STATUS_IRQ_PENDING
        } else {
            stored
        }
    }
}

impl RegisterRead for RegisterFile {
    fn read_register(&self, address: u8) -> u8 {
        self.read(address)
    }
}

impl RegisterWrite for RegisterFile {
    fn write_register(&mut self, address: u8, data: u8) {
        self.write(address, data);
    }
}
