// Licensed under the Apache-2.0 license

//! Control-plane I2C.
//!
//! This module provides the register target state machine that runs inside
//! the bridge, the register port traits it reads through, and the
//! bit-banged host used to drive it from a testbench.

pub mod common;
pub mod master;
pub mod target;
pub mod traits;

pub use common::{
    AckGate, Direction, I2cTargetConfig, I2cTargetConfigBuilder, TargetEvent, TargetOutput,
    TargetState, TargetStatus, WriteStrobe, DEFAULT_TARGET_ADDRESS,
};
pub use master::{Error, I2cMaster};
pub use target::I2cTarget;
pub use traits::{RegisterRead, RegisterWrite};
