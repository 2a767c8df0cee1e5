//! Status reflector: mirrors the low nibble of the first payload byte of a
//! received frame onto the LED bank.
use crate::{
    can::frame::ReceivedFrame,
    infra::traits::gpio_port::GpioPort,
    node::indicator::{LedBank, StatusPattern},
};

/// Show bits 0 to 3 of byte 0 of `received` on LEDs 0 to 3.
///
/// A set bit clears its line (LED on), a cleared bit sets it (LED off). Bytes
/// past the first are ignored; a frame without payload turns every LED off.
/// Returns the nibble displayed.
pub fn reflect_status<G: GpioPort>(received: &ReceivedFrame, leds: &mut LedBank<G>) -> u8 {
    let nibble = received.first_byte() & 0x0F;
    leds.show(StatusPattern::Nibble(nibble));
    nibble
}
