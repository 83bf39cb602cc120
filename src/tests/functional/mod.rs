// Licensed under the Apache-2.0 license

//! Verification suites run against a simulated bridge.
//!
//! Each suite builds its own [`Testbench`], drives it through the host
//! models and writes one `Testing <name>... PASSED|FAILED` line per check
//! to an `embedded_io::Write` sink.

pub mod concurrent_test;
pub mod control_plane_test;
pub mod data_plane_test;

use core::fmt;

use embedded_io::Write;
use fugit::HertzU32;

use crate::bridge::BridgeConfig;
use crate::common::ConfigurationError;
use crate::i2c;
use crate::link::LinkError;
use crate::spi;
use crate::testbench::Testbench;
use crate::timing::BusTiming;

/// Suite names with one-line descriptions, in run order.
pub const SUITES: &[(&str, &str)] = &[
    ("basic_write", "I2C write to writable registers with readback verification"),
    ("basic_read", "I2C read from read-only registers (DEVICE_ID, VERSION)"),
    ("read_only", "Verify write protection on read-only registers"),
    ("loopback", "SPI loopback test - verify TX appears on next RX"),
    ("concurrent", "Concurrent I2C and SPI operations"),
    ("stress", "High-volume stress test with concurrent operations"),
];

/// Why a check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Config(ConfigurationError),
    I2c(i2c::Error),
    Spi(spi::Error),
    UnexpectedDevice(u8),
    Register { address: u8, expected: u8, actual: u8 },
    Echo { index: usize, expected: u8, actual: u8 },
    Check(&'static str),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::I2c(e) => write!(f, "i2c: {e:?}"),
            Self::Spi(e) => write!(f, "spi: {e:?}"),
            Self::UnexpectedDevice(id) => write!(f, "unexpected device id 0x{id:02X}"),
            Self::Register {
                address,
                expected,
                actual,
            } => write!(
                f,
                "register 0x{address:02X}: expected 0x{expected:02X}, got 0x{actual:02X}"
            ),
            Self::Echo {
                index,
                expected,
                actual,
            } => write!(
                f,
                "byte {index}: expected 0x{expected:02X}, got 0x{actual:02X}"
            ),
            Self::Check(what) => f.write_str(what),
        }
    }
}

impl From<ConfigurationError> for Failure {
    fn from(e: ConfigurationError) -> Self {
        Self::Config(e)
    }
}

impl From<i2c::Error> for Failure {
    fn from(e: i2c::Error) -> Self {
        Self::I2c(e)
    }
}

impl From<spi::Error> for Failure {
    fn from(e: spi::Error) -> Self {
        Self::Spi(e)
    }
}

impl From<LinkError<i2c::Error>> for Failure {
    fn from(e: LinkError<i2c::Error>) -> Self {
        match e {
            LinkError::Bus(e) => Self::I2c(e),
            LinkError::UnexpectedDevice(info) => Self::UnexpectedDevice(info.device_id),
        }
    }
}

pub type CheckResult = Result<(), Failure>;

/// Pass/fail counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub passed: u32,
    pub failed: u32,
}

impl Summary {
    pub fn record<W: Write>(&mut self, out: &mut W, name: &str, result: CheckResult) {
        let _ = write!(out, "Testing {name}... ");
        match result {
            Ok(()) => {
                self.passed += 1;
                let _ = writeln!(out, "PASSED\r");
            }
            Err(failure) => {
                self.failed += 1;
                let _ = writeln!(out, "FAILED ({failure})\r");
            }
        }
    }

    pub fn merge(&mut self, other: Summary) {
        self.passed += other.passed;
        self.failed += other.failed;
    }

    #[must_use]
    pub fn ok(&self) -> bool {
        self.failed == 0
    }
}

/// 10 MHz domain clock, 250 kHz I2C, 1 MHz SPI: the fastest buses an
/// unfiltered bridge follows, which keeps suites short.
///
/// # Errors
///
/// Never for these rates; kept fallible like every timing constructor.
pub fn suite_timing() -> Result<BusTiming, ConfigurationError> {
    BusTiming::new(HertzU32::MHz(10), HertzU32::kHz(250), HertzU32::MHz(1))
}

/// Bridge at default configuration on the suite timing.
///
/// # Errors
///
/// Propagates timing validation.
pub fn default_bench() -> Result<Testbench, Failure> {
    Ok(Testbench::new(BridgeConfig::default(), suite_timing()?)?)
}

pub(crate) fn expect_register(address: u8, expected: u8, actual: u8) -> CheckResult {
    if expected == actual {
        Ok(())
    } else {
        Err(Failure::Register {
            address,
            expected,
            actual,
        })
    }
}

pub(crate) fn expect_echo(sent: &[u8], received: &[u8], previous: u8) -> CheckResult {
    if sent.len() != received.len() {
        return Err(Failure::Check("frame length changed"));
    }
    let expected = core::iter::once(previous).chain(sent.iter().copied());
    for (index, (expected, actual)) in expected.zip(received.iter().copied()).enumerate() {
        if expected != actual {
            return Err(Failure::Echo {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Run one suite by name. Returns `None` for an unknown name.
pub fn run_suite<W: Write>(name: &str, out: &mut W) -> Option<Summary> {
    let summary = match name {
        "basic_write" => control_plane_test::run_basic_write_tests(out),
        "basic_read" => control_plane_test::run_basic_read_tests(out),
        "read_only" => control_plane_test::run_read_only_tests(out),
        "loopback" => data_plane_test::run_loopback_tests(out),
        "concurrent" => concurrent_test::run_concurrent_tests(out),
        "stress" => concurrent_test::run_stress_tests(out),
        _ => return None,
    };
    Some(summary)
}

/// Run every suite in [`SUITES`] order.
pub fn run_all<W: Write>(out: &mut W) -> Summary {
    let mut total = Summary::default();
    for (name, _) in SUITES {
        if let Some(summary) = run_suite(name, out) {
            total.merge(summary);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_suite_passes() {
        for (name, _) in SUITES {
            let mut out = Vec::new();
            let summary = run_suite(name, &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(summary.ok(), "{name}:\n{text}");
            assert!(summary.passed > 0, "{name}");
            assert!(!text.contains("FAILED"));
        }
    }

    #[test]
    fn test_unknown_suite() {
        let mut out = Vec::new();
        assert!(run_suite("nope", &mut out).is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn test_expect_echo() {
        assert_eq!(expect_echo(&[1, 2, 3], &[9, 1, 2], 9), Ok(()));
        assert_eq!(
            expect_echo(&[1, 2, 3], &[9, 1, 7], 9),
            Err(Failure::Echo {
                index: 2,
                expected: 2,
                actual: 7
            })
        );
    }

    #[test]
    fn test_summary_lines() {
        let mut out = Vec::new();
        let mut summary = Summary::default();
        summary.record(&mut out, "one", Ok(()));
        summary.record(&mut out, "two", Err(Failure::Check("boom")));
        assert_eq!(summary, Summary { passed: 1, failed: 1 });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Testing one... PASSED\r\nTesting two... FAILED (boom)\r\n"
        );
    }
}
