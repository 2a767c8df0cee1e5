//! Minimal abstraction over the digital I/O the node drives. The core only
//! ever writes levels and configures pins; it never reads inputs.
use crate::infra::traits::platform::Peripheral;

/// Direction of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinDirection {
    Input,
    /// Output with the maximum toggle speed in MHz (2, 10 or 50 on STM32F1).
    Output { speed_mhz: u8 },
}

/// Electrical mode of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Floating input.
    Floating,
    /// Input with pull-up or pull-down; the output data latch selects which.
    PullUpDown,
    /// General purpose push-pull output.
    PushPull,
    /// General purpose open-drain output.
    OpenDrain,
    /// Alternate function push-pull output (peripheral-driven).
    AlternatePushPull,
}

/// Contract to drive output levels on named pins.
pub trait GpioPort {
    /// Pin handle, typically a `(port, number)` pair.
    type Pin: Copy + core::fmt::Debug;

    /// Drive `pin` high.
    fn set(&mut self, pin: Self::Pin);

    /// Drive `pin` low.
    fn clear(&mut self, pin: Self::Pin);

    /// Configure the direction and electrical mode of `pin`.
    fn configure(&mut self, pin: Self::Pin, direction: PinDirection, mode: PinMode);

    /// Clock gate of the port `pin` belongs to.
    fn port_clock(&self, pin: Self::Pin) -> Peripheral;
}
