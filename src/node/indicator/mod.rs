//! Four-line LED bank used for every visual indication of the node.
//!
//! Lines are active-low: clearing a line lights its LED, setting it turns the
//! LED off.
use crate::infra::traits::gpio_port::{GpioPort, PinDirection, PinMode};

/// Number of status lines.
pub const LED_COUNT: usize = 4;

//==================================================================================STATUS_PATTERN
/// What the LED bank displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusPattern {
    /// Every LED off.
    AllOff,
    /// Fatal bus initialization failure: LED3 on, others off.
    BusInitFailure,
    /// Heartbeat dropped for lack of a free mailbox: LED2 on, others off.
    TransmitFailure,
    /// Low nibble of the value, bit n lighting LED n.
    Nibble(u8),
}

impl StatusPattern {
    /// Bit n set when LED n must be lit.
    pub const fn lit_mask(self) -> u8 {
        match self {
            StatusPattern::AllOff => 0b0000,
            StatusPattern::BusInitFailure => 0b1000,
            StatusPattern::TransmitFailure => 0b0100,
            StatusPattern::Nibble(value) => value & 0x0F,
        }
    }
}

//==================================================================================LED_BANK
/// Four active-low output lines on a GPIO collaborator.
pub struct LedBank<G: GpioPort> {
    gpio: G,
    lines: [G::Pin; LED_COUNT],
}

impl<G: GpioPort> LedBank<G> {
    /// Take over `gpio` for the given lines. Nothing is written yet.
    pub fn new(gpio: G, lines: [G::Pin; LED_COUNT]) -> Self {
        Self { gpio, lines }
    }

    /// Drive every line high (LEDs off), then make them push-pull outputs.
    pub fn init(&mut self, speed_mhz: u8) {
        for line in self.lines {
            self.gpio.set(line);
            self.gpio.configure(
                line,
                PinDirection::Output { speed_mhz },
                PinMode::PushPull,
            );
        }
    }

    /// Display `pattern`, writing all four lines in order.
    pub fn show(&mut self, pattern: StatusPattern) {
        let lit = pattern.lit_mask();
        for (index, line) in self.lines.into_iter().enumerate() {
            if lit & (1 << index) != 0 {
                self.gpio.clear(line);
            } else {
                self.gpio.set(line);
            }
        }
    }

    /// Light LED `index` (0 to 3). Out of range indices are ignored.
    pub fn light(&mut self, index: usize) {
        if let Some(&line) = self.lines.get(index) {
            self.gpio.clear(line);
        }
    }

    /// Turn LED `index` (0 to 3) off. Out of range indices are ignored.
    pub fn extinguish(&mut self, index: usize) {
        if let Some(&line) = self.lines.get(index) {
            self.gpio.set(line);
        }
    }

    pub fn lines(&self) -> &[G::Pin; LED_COUNT] {
        &self.lines
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// Give the GPIO collaborator back.
    pub fn free(self) -> G {
        self.gpio
    }
}
