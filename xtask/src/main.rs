// Licensed under the Apache-2.0 license

mod verify;

use anyhow::{bail, Result};

fn usage() {
    println!("Usage: cargo xtask <command> [options]");
    println!();
    println!("Commands:");
    println!("  verify [--test NAME]... [--list] [--report] [--trace]");
    println!("      Run the functional suites against the simulated bridge.");
    println!("      --test NAME  run only NAME (repeatable)");
    println!("      --list       list available suites and exit");
    println!("      --report     print the bring-up system report first");
    println!("      --trace      run one register transaction with bus tracing");
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        usage();
        return Ok(());
    };

    match command.as_str() {
        "verify" => {
            let options = verify::Options::parse(args)?;
            verify::run(&options)
        }
        "help" | "--help" | "-h" => {
            usage();
            Ok(())
        }
        other => {
            usage();
            bail!("unknown command: {other}")
        }
    }
}
