// Licensed under the Apache-2.0 license

//! Input conditioning for pins arriving from outside the domain clock.
//!
//! Every external input passes through a chain of flip-flop stages before
//! any logic observes it. [`Synchronizer`] adds an optional glitch filter
//! and edge detection on top of the chain so downstream state machines
//! consume one [`BusSample`] per tick.

mod debounce;

pub use debounce::Debounce;

/// Flip-flop stages on the I2C clock and data inputs.
pub const CONTROL_SYNC_STAGES: usize = 3;
/// Flip-flop stages on the SPI clock, data and chip-select inputs.
pub const DATA_SYNC_STAGES: usize = 3;
/// Flip-flop stages on quasi-static inputs (switches).
pub const PIN_SYNC_STAGES: usize = 2;

/// Shift chain of `DEPTH` registers. The value presented at tick `n` is
/// the raw input captured at tick `n - DEPTH`.
#[derive(Debug, Clone, Copy)]
pub struct SyncChain<T: Copy, const DEPTH: usize> {
    stages: [T; DEPTH],
}

impl<T: Copy, const DEPTH: usize> SyncChain<T, DEPTH> {
    const MIN_DEPTH: () = assert!(DEPTH >= 2, "a synchronizer needs at least two stages");

    /// Chain with every stage holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::MIN_DEPTH;
        Self {
            stages: [initial; DEPTH],
        }
    }

    /// Clock one raw sample in and return the value leaving the last stage.
    pub fn clock(&mut self, raw: T) -> T {
        let mut carry = raw;
        for stage in &mut self.stages {
            core::mem::swap(stage, &mut carry);
        }
        carry
    }

    /// Force every stage to `value`.
    pub fn fill(&mut self, value: T) {
        self.stages = [value; DEPTH];
    }
}

/// Synchronized level of a line plus its edges, relative to the previous
/// synchronized level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusSample {
    pub value: bool,
    pub rising: bool,
    pub falling: bool,
}

impl BusSample {
    /// Steady level without an edge.
    #[must_use]
    pub const fn level(value: bool) -> Self {
        Self {
            value,
            rising: false,
            falling: false,
        }
    }
}

/// Ticks from a raw transition to the filtered edge for a chain of `depth`
/// stages followed by a `width`-tick debounce.
#[must_use]
pub const fn input_latency(depth: usize, width: u16) -> u32 {
    depth as u32 + (width as u32).saturating_sub(1)
}

/// Single-line synchronizer with glitch filter and edge detection.
#[derive(Debug, Clone, Copy)]
pub struct Synchronizer<const DEPTH: usize> {
    chain: SyncChain<bool, DEPTH>,
    filter: Debounce,
    previous: bool,
    idle: bool,
}

impl<const DEPTH: usize> Synchronizer<DEPTH> {
    /// Synchronizer without filtering whose stages reset to `idle`.
    #[must_use]
    pub fn new(idle: bool) -> Self {
        Self::with_debounce(idle, 0)
    }

    /// Synchronizer requiring a new level to persist for `width` consecutive
    /// ticks after the chain before it is accepted. A width of 0 disables the
    /// filter.
    #[must_use]
    pub fn with_debounce(idle: bool, width: u16) -> Self {
        Self {
            chain: SyncChain::new(idle),
            filter: Debounce::new(idle, width),
            previous: idle,
            idle,
        }
    }

    /// Clock one raw input sample.
    pub fn sample(&mut self, raw: bool) -> BusSample {
        let value = self.filter.clock(self.chain.clock(raw));
        let sample = BusSample {
            value,
            rising: value && !self.previous,
            falling: !value && self.previous,
        };
        self.previous = value;
        sample
    }

    /// Return every stage to the idle level.
    pub fn reset(&mut self) {
        self.chain.fill(self.idle);
        self.filter.reset(self.idle);
        self.previous = self.idle;
    }

    /// Latency in ticks from a raw transition to the matching edge.
    #[must_use]
    pub fn latency(&self) -> u32 {
        input_latency(DEPTH, self.filter.width())
    }
}
