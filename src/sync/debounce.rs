// Licensed under the Apache-2.0 license

/// Glitch filter: the output follows the input once a new level has held
/// for `width` consecutive ticks. Pulses shorter than `width` never appear
/// and an accepted edge is delayed by `width - 1` ticks.
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    width: u16,
    stable: bool,
    count: u16,
}

impl Debounce {
    #[must_use]
    pub const fn new(initial: bool, width: u16) -> Self {
        Self {
            width,
            stable: initial,
            count: 0,
        }
    }

    pub fn clock(&mut self, input: bool) -> bool {
        if self.width == 0 {
            self.stable = input;
            return input;
        }
        if input == self.stable {
            self.count = 0;
        } else {
            self.count = self.count.saturating_add(1);
            if self.count >= self.width {
                self.stable = input;
                self.count = 0;
            }
        }
        self.stable
    }

    pub fn reset(&mut self, level: bool) {
        self.stable = level;
        self.count = 0;
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }
}
