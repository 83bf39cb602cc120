// Licensed under the Apache-2.0 license

use embedded_io::Write;

use super::{default_bench, expect_echo, expect_register, CheckResult, Failure, Summary};
use crate::link::LinkClient;
use crate::regs::map;
use crate::spi::MAX_FRAME_LEN;

const STRESS_ROUNDS: u8 = 12;

pub fn run_concurrent_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Concurrent Plane Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "status mirrors during a frame", test_status_during_frame());
    summary.record(out, "register traffic during a frame", test_registers_during_frame());
    summary
}

pub fn run_stress_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Stress Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "interleaved frames and register traffic", test_interleaved());
    summary
}

/// Deterministic frame contents for a given seed.
fn pattern(seed: u8, len: usize) -> heapless::Vec<u8, MAX_FRAME_LEN> {
    (0..len)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i as u8).wrapping_mul(17)) ^ 0x5A)
        .collect()
}

fn test_status_during_frame() -> CheckResult {
    let mut bench = default_bench()?;
    let frame = pattern(1, MAX_FRAME_LEN);
    bench.start_spi(&frame)?;

    let mut link = LinkClient::new(bench.i2c());
    if !link.data_active()? {
        return Err(Failure::Check("DATA_STATUS idle while selected"));
    }
    if !link.status()?.data_active() {
        return Err(Failure::Check("SYS_STATUS idle while selected"));
    }
    drop(link);
    if !bench.spi_busy() {
        return Err(Failure::Check("frame ended before the register reads"));
    }

    let received = nb::block!(bench.poll_spi())?;
    expect_echo(&frame, &received, 0x00)?;

    let mut link = LinkClient::new(bench.i2c());
    if link.data_active()? || link.status()?.data_active() {
        return Err(Failure::Check("activity flag stuck after frame"));
    }
    Ok(())
}

fn test_registers_during_frame() -> CheckResult {
    let mut bench = default_bench()?;
    let frame = pattern(2, MAX_FRAME_LEN);
    bench.start_spi(&frame)?;

    let mut link = LinkClient::new(bench.i2c());
    link.write_register(map::SCRATCH0, 0x5A)?;
    link.set_leds(0x0F0F)?;
    expect_register(map::SCRATCH0, 0x5A, link.read_register(map::SCRATCH0)?)?;
    drop(link);

    let received = nb::block!(bench.poll_spi())?;
    expect_echo(&frame, &received, 0x00)?;
    if bench.leds() != 0x0F0F {
        return Err(Failure::Check("LED write lost during frame"));
    }
    Ok(())
}

fn test_interleaved() -> CheckResult {
    let mut bench = default_bench()?;
    let mut previous = 0x00;
    for round in 0..STRESS_ROUNDS {
        let frame = pattern(round, 8 + usize::from(round) * 4);
        bench.start_spi(&frame)?;

        let mut link = LinkClient::new(bench.i2c());
        let value = round.wrapping_mul(0x1D);
        link.write_register(map::SCRATCH1, value)?;
        expect_register(map::SCRATCH1, value, link.read_register(map::SCRATCH1)?)?;
        drop(link);

        let received = nb::block!(bench.poll_spi())?;
        expect_echo(&frame, &received, previous)?;
        previous = frame.last().copied().unwrap_or(previous);

        let mirrored = LinkClient::new(bench.i2c()).data_rx_last()?;
        expect_register(map::DATA_RX_LAST, previous, mirrored)?;
    }
    Ok(())
}
