// Licensed under the Apache-2.0 license

//! Shared plumbing for the bridge model: diagnostic logging, pin drive
//! levels and the configuration error reported by every builder.

use core::fmt;

/// Sink for diagnostic messages emitted by the bridge and the host
/// bus-functional models.
///
/// Components are generic over `L: Logger` and default to [`NoOpLogger`],
/// so silent builds carry no formatting cost.
pub trait Logger {
    fn debug(&mut self, args: fmt::Arguments<'_>);
    fn warn(&mut self, args: fmt::Arguments<'_>);
}

/// Logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: fmt::Arguments<'_>) {}
    fn warn(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Logger writing one line per message to an `embedded_io::Write` sink.
///
/// Write failures are dropped; logging must never change bus behavior.
pub struct WriteLogger<W: embedded_io::Write> {
    sink: W,
    verbose: bool,
}

impl<W: embedded_io::Write> WriteLogger<W> {
    /// Logs warnings and debug messages.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            verbose: true,
        }
    }

    /// Logs warnings only.
    pub fn quiet(sink: W) -> Self {
        Self {
            sink,
            verbose: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }
}

impl<W: embedded_io::Write> Logger for WriteLogger<W> {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        if self.verbose {
            let _ = writeln!(self.sink, "[DBG] {args}");
        }
    }

    fn warn(&mut self, args: fmt::Arguments<'_>) {
        let _ = writeln!(self.sink, "[WRN] {args}");
    }
}

/// Open-drain drive state of a bus line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Drive {
    /// High impedance; the pull-up wins unless another driver pulls low.
    #[default]
    Released,
    Low,
}

impl Drive {
    #[must_use]
    pub fn from_level(level: bool) -> Self {
        if level {
            Drive::Released
        } else {
            Drive::Low
        }
    }
}

/// Wired-AND of every open-drain driver on a line. A line with no driver
/// pulling low reads high.
#[must_use]
pub fn resolve_open_drain(drivers: &[Drive]) -> bool {
    !drivers.iter().any(|d| *d == Drive::Low)
}

/// Rejected configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Seven-bit address outside 0x08..=0x77.
    InvalidAddress(u8),
    /// Bus clock too fast for the synchronizer and filter latency of the
    /// receiving domain.
    BusTooFast,
    /// Zero or otherwise unusable clock frequency.
    InvalidFrequency,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr) => write!(f, "invalid 7-bit address 0x{addr:02X}"),
            Self::BusTooFast => f.write_str("bus clock too fast for the sampling domain"),
            Self::InvalidFrequency => f.write_str("invalid clock frequency"),
        }
    }
}
