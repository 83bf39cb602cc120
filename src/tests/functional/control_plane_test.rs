// Licensed under the Apache-2.0 license

use embedded_hal::i2c::{I2c, NoAcknowledgeSource};
use embedded_io::Write;
use hex_literal::hex;

use super::{default_bench, expect_register, CheckResult, Failure, Summary};
use crate::i2c::{self, DEFAULT_TARGET_ADDRESS};
use crate::link::LinkClient;
use crate::regs::map::{self, Access, REGISTER_MAP};

/// Bit patterns written to every read-write register.
const PATTERNS: [u8; 6] = hex!("00 FF 55 AA 0F F0");

pub fn run_basic_write_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Control Plane Write Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "scratch write and readback", test_scratch_readback());
    summary.record(out, "pattern writes to read-write registers", test_patterns());
    summary.record(out, "full value sweep", test_value_sweep());
    summary.record(out, "burst write auto-increment", test_burst_write());
    summary.record(out, "LED bank drive", test_led_drive());
    summary
}

pub fn run_basic_read_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Control Plane Read Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "identity registers", test_identity());
    summary.record(out, "link capabilities", test_link_caps());
    summary.record(out, "device probe", test_probe());
    summary.record(out, "burst read matches single reads", test_burst_read());
    summary.record(out, "switch mirror", test_switch_mirror());
    summary.record(out, "unmapped addresses", test_unmapped());
    summary
}

pub fn run_read_only_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Write Protection Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "read-only registers ignore writes", test_read_only());
    summary.record(out, "foreign address is not acknowledged", test_foreign_address());
    summary.record(out, "sticky error write-one-to-clear", test_sticky_error());
    summary
}

fn test_scratch_readback() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    for value in [0x55, 0xAA] {
        link.write_register(map::SCRATCH0, value)?;
        expect_register(map::SCRATCH0, value, link.read_register(map::SCRATCH0)?)?;
    }
    Ok(())
}

fn test_patterns() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    for def in REGISTER_MAP.iter().filter(|d| d.access == Access::ReadWrite) {
        for pattern in PATTERNS {
            link.write_register(def.address, pattern)?;
            expect_register(def.address, pattern, link.read_register(def.address)?)?;
        }
    }
    Ok(())
}

fn test_value_sweep() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    for value in 0..=u8::MAX {
        link.write_register(map::SCRATCH1, value)?;
        expect_register(map::SCRATCH1, value, link.read_register(map::SCRATCH1)?)?;
    }
    Ok(())
}

fn test_burst_write() -> CheckResult {
    let mut bench = default_bench()?;
    bench.i2c().write(0x55, &hex!("05 C0 DE"))?;
    let mut link = LinkClient::new(bench.i2c());
    expect_register(map::SCRATCH0, 0xC0, link.read_register(map::SCRATCH0)?)?;
    expect_register(map::SCRATCH1, 0xDE, link.read_register(map::SCRATCH1)?)
}

fn test_led_drive() -> CheckResult {
    let mut bench = default_bench()?;
    for leds in [0x0001u16, 0x8000, 0xA5A5, 0x0000] {
        LinkClient::new(bench.i2c()).set_leds(leds)?;
        if bench.leds() != leds {
            return Err(Failure::Check("LED pins do not follow LED_OUT"));
        }
    }
    Ok(())
}

fn test_identity() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    expect_register(map::DEVICE_ID, 0xA7, link.read_register(map::DEVICE_ID)?)?;
    expect_register(map::VERSION_MAJ, 0x01, link.read_register(map::VERSION_MAJ)?)?;
    expect_register(map::VERSION_MIN, 0x00, link.read_register(map::VERSION_MIN)?)
}

fn test_link_caps() -> CheckResult {
    let mut bench = default_bench()?;
    let caps = LinkClient::new(bench.i2c()).link_caps()?;
    expect_register(map::LINK_CAPS, 0x15, caps.0)?;
    if caps.max_clock_mhz() != 25 || !caps.dma() {
        return Err(Failure::Check("capability fields decode wrong"));
    }
    Ok(())
}

fn test_probe() -> CheckResult {
    let mut bench = default_bench()?;
    let info = LinkClient::new(bench.i2c()).probe()?;
    if info.status.ready() {
        Ok(())
    } else {
        Err(Failure::Check("bridge not ready after reset"))
    }
}

fn test_burst_read() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    link.write_register(map::SCRATCH0, 0x12)?;
    link.write_register(map::SCRATCH1, 0x34)?;
    let mut burst = [0u8; 7];
    link.read_burst(map::DEVICE_ID, &mut burst)?;
    for (address, value) in (0u8..).zip(burst) {
        expect_register(address, link.read_register(address)?, value)?;
    }
    Ok(())
}

fn test_switch_mirror() -> CheckResult {
    let mut bench = default_bench()?;
    for switches in [0x0000u16, 0xFFFF, 0x1234, 0x8001] {
        bench.set_switches(switches);
        bench.run(4);
        if LinkClient::new(bench.i2c()).switches()? != switches {
            return Err(Failure::Check("switch mirror mismatch"));
        }
    }
    Ok(())
}

fn test_unmapped() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    for address in [0x07, 0x14, 0x2F, 0x31, 0xFF] {
        link.write_register(address, 0x5A)?;
        expect_register(address, 0x00, link.read_register(address)?)?;
    }
    Ok(())
}

fn test_read_only() -> CheckResult {
    let mut bench = default_bench()?;
    let mut link = LinkClient::new(bench.i2c());
    for def in REGISTER_MAP.iter().filter(|d| d.access == Access::ReadOnly) {
        let before = link.read_register(def.address)?;
        for value in [!before, 0x00, 0xFF] {
            link.write_register(def.address, value)?;
            expect_register(def.address, before, link.read_register(def.address)?)?;
        }
    }
    Ok(())
}

fn test_foreign_address() -> CheckResult {
    let mut bench = default_bench()?;
    let snapshot: [u8; 256] = core::array::from_fn(|a| {
        bench.bridge().registers().read(u8::try_from(a).unwrap_or(0))
    });

    let nack: Result<(), i2c::Error> =
        Err(i2c::Error::NoAcknowledge(NoAcknowledgeSource::Address));
    for address in (0x00..=0x7Fu8).filter(|&a| a != DEFAULT_TARGET_ADDRESS) {
        if bench.i2c().write(address, &[map::SCRATCH0, 0x99]) != nack {
            return Err(Failure::Check("foreign address was acknowledged"));
        }
    }

    for (address, before) in (0u8..=u8::MAX).zip(snapshot) {
        expect_register(address, before, bench.bridge().registers().read(address))?;
    }
    Ok(())
}

fn test_sticky_error() -> CheckResult {
    let mut bench = default_bench()?;
    bench.start_spi_truncated(&[0xFF], 5)?;
    nb::block!(bench.poll_spi())?;

    let mut link = LinkClient::new(bench.i2c());
    if !link.status()?.error() {
        return Err(Failure::Check("aborted frame did not raise the error flag"));
    }
    link.write_register(map::SYS_STATUS, !map::STATUS_ERROR)?;
    if !link.status()?.error() {
        return Err(Failure::Check("error cleared by a zero bit"));
    }
    link.clear_error()?;
    expect_register(map::SYS_STATUS, map::STATUS_READY, link.read_register(map::SYS_STATUS)?)
}
