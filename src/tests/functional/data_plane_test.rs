// Licensed under the Apache-2.0 license

use embedded_hal::spi::{SpiDevice, MODE_0, MODE_1, MODE_2, MODE_3};
use embedded_io::Write;
use hex_literal::hex;

use super::{
    default_bench, expect_echo, expect_register, suite_timing, CheckResult, Failure, Summary,
};
use crate::bridge::BridgeConfigBuilder;
use crate::link::LinkClient;
use crate::regs::map;
use crate::spi::Frame;
use crate::testbench::Testbench;

pub fn run_loopback_tests<W: Write>(out: &mut W) -> Summary {
    let _ = writeln!(out, "\r\n=== Data Plane Loopback Tests ===\r");
    let mut summary = Summary::default();

    summary.record(out, "single-byte frames after reset", test_single_byte_frames());
    summary.record(out, "back-to-back bytes in one frame", test_multi_byte_frame());
    summary.record(out, "receive mirror over I2C", test_rx_mirror());
    summary.record(out, "device transactions", test_device_transactions());
    summary.record(out, "all clock modes", test_clock_modes());
    summary
}

fn exchange(bench: &mut Testbench, frame: &[u8]) -> Result<Frame, Failure> {
    bench.start_spi(frame)?;
    Ok(nb::block!(bench.poll_spi())?)
}

fn test_single_byte_frames() -> CheckResult {
    let mut bench = default_bench()?;
    let sent = hex!("00 01 02 03");
    let expected = hex!("00 00 01 02");
    for (index, (byte, want)) in sent.into_iter().zip(expected).enumerate() {
        let received = exchange(&mut bench, &[byte])?;
        let actual = received.first().copied().unwrap_or(0xFF);
        if actual != want {
            return Err(Failure::Echo {
                index,
                expected: want,
                actual,
            });
        }
    }
    Ok(())
}

fn test_multi_byte_frame() -> CheckResult {
    let mut bench = default_bench()?;
    let first = hex!("DE AD BE EF");
    expect_echo(&first, &exchange(&mut bench, &first)?, 0x00)?;
    let second = hex!("01 23 45 67 89 AB CD EF");
    expect_echo(&second, &exchange(&mut bench, &second)?, 0xEF)
}

fn test_rx_mirror() -> CheckResult {
    let mut bench = default_bench()?;
    for byte in [0x3C, 0xC3, 0x00] {
        exchange(&mut bench, &[0x11, byte])?;
        let mirrored = LinkClient::new(bench.i2c()).data_rx_last()?;
        expect_register(map::DATA_RX_LAST, byte, mirrored)?;
    }
    Ok(())
}

fn test_device_transactions() -> CheckResult {
    let mut bench = default_bench()?;
    let mut spi = bench.spi();
    spi.write(&[0x42])?;
    let mut buffer = [0x10, 0x20];
    spi.transfer_in_place(&mut buffer)?;
    expect_echo(&[0x10, 0x20], &buffer, 0x42)?;
    let mut read = [0u8; 1];
    spi.read(&mut read)?;
    expect_echo(&[0x00], &read, 0x20)
}

fn test_clock_modes() -> CheckResult {
    for mode in [MODE_0, MODE_1, MODE_2, MODE_3] {
        let config = BridgeConfigBuilder::new().spi_mode(mode).build()?;
        let mut bench = Testbench::new(config, suite_timing()?)?;
        let frame = hex!("81 7E 00 FF");
        expect_echo(&frame, &exchange(&mut bench, &frame)?, 0x00)?;
    }
    Ok(())
}
