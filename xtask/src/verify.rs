// Licensed under the Apache-2.0 license

use adaptive_link::bridge::BridgeConfig;
use adaptive_link::common::WriteLogger;
use adaptive_link::link::LinkClient;
use adaptive_link::regs::map;
use adaptive_link::testbench::Testbench;
use adaptive_link::tests::functional::{self, Summary, SUITES};
use anyhow::{bail, Context, Result};

#[derive(Debug, Default)]
pub struct Options {
    pub tests: Vec<String>,
    pub list: bool,
    pub report: bool,
    pub trace: bool,
}

impl Options {
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--test" => {
                    let name = args.next().context("--test needs a suite name")?;
                    if name != "all" {
                        options.tests.push(name);
                    }
                }
                "--list" => options.list = true,
                "--report" => options.report = true,
                "--trace" => options.trace = true,
                other => bail!("unknown verify option: {other}"),
            }
        }
        Ok(options)
    }
}

pub fn run(options: &Options) -> Result<()> {
    if options.list {
        println!("Available suites:");
        for (name, description) in SUITES {
            println!("  {name:<12} {description}");
        }
        return Ok(());
    }

    if options.report {
        print_report()?;
    }
    if options.trace {
        trace_transaction()?;
    }

    let names: Vec<&str> = if options.tests.is_empty() {
        SUITES.iter().map(|(name, _)| *name).collect()
    } else {
        options.tests.iter().map(String::as_str).collect()
    };

    let mut total = Summary::default();
    for name in names {
        let mut buffer = Vec::new();
        let summary = functional::run_suite(name, &mut buffer)
            .with_context(|| format!("unknown suite '{name}' (try --list)"))?;
        print!("{}", String::from_utf8_lossy(&buffer));
        total.merge(summary);
    }

    println!();
    println!("{} passed, {} failed", total.passed, total.failed);
    if !total.ok() {
        bail!("{} check(s) failed", total.failed);
    }
    Ok(())
}

fn print_report() -> Result<()> {
    let timing = functional::suite_timing().map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut bench =
        Testbench::new(BridgeConfig::default(), timing).map_err(|e| anyhow::anyhow!("{e}"))?;
    let report = LinkClient::new(bench.i2c())
        .system_report()
        .map_err(|e| anyhow::anyhow!("system report failed: {e:?}"))?;
    println!("=== Bridge System Report ===");
    println!("{report}");
    println!();
    Ok(())
}

fn trace_transaction() -> Result<()> {
    let timing = functional::suite_timing().map_err(|e| anyhow::anyhow!("{e}"))?;
    let logger = WriteLogger::new(Vec::new());
    let mut bench = Testbench::with_logger(BridgeConfig::default(), timing, logger)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut link = LinkClient::new(bench.i2c());
    link.write_register(map::SCRATCH0, 0xA5)
        .map_err(|e| anyhow::anyhow!("write failed: {e:?}"))?;
    let value = link
        .read_register(map::SCRATCH0)
        .map_err(|e| anyhow::anyhow!("read failed: {e:?}"))?;
    drop(link);

    println!("=== Bus Trace (SCRATCH0 <- 0xA5, read back 0x{value:02X}) ===");
    let log = std::mem::replace(bench.logger_mut(), WriteLogger::new(Vec::new())).into_inner();
    print!("{}", String::from_utf8_lossy(&log));
    println!();
    Ok(())
}
