// Licensed under the Apache-2.0 license

//! Data-plane SPI: the echo shift engine inside the bridge and the host
//! model that clocks it.

pub mod common;
pub mod master;
pub mod target;

pub use common::{ClockEdges, Error, SpiEvent, SpiTargetConfig, MAX_FRAME_LEN};
pub use master::{Frame, SpiHost, SpiMaster, SpiPins};
pub use target::{SpiOutput, SpiTarget};
