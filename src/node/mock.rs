//! Test doubles shared by the node unit tests.
use crate::{
    can::{controller::Mailbox, frame::CanFrame, FrameTransmitter},
    error::TransmitError,
    infra::traits::{
        gpio_port::{GpioPort, PinDirection, PinMode},
        platform::Peripheral,
    },
};

/// GPIO keeping the last level written to pins 0 to 7.
#[derive(Default)]
pub struct Lines {
    /// `Some(true)` once set, `Some(false)` once cleared.
    pub level: [Option<bool>; 8],
    pub writes: usize,
}

impl Lines {
    /// Levels of pins 0 to 3, `true` meaning high (LED off).
    pub fn leds(&self) -> [Option<bool>; 4] {
        [self.level[0], self.level[1], self.level[2], self.level[3]]
    }
}

impl GpioPort for Lines {
    type Pin = u8;

    fn set(&mut self, pin: u8) {
        self.level[pin as usize] = Some(true);
        self.writes += 1;
    }

    fn clear(&mut self, pin: u8) {
        self.level[pin as usize] = Some(false);
        self.writes += 1;
    }

    fn configure(&mut self, _pin: u8, _direction: PinDirection, _mode: PinMode) {}

    fn port_clock(&self, pin: u8) -> Peripheral {
        if pin < 4 {
            Peripheral::GpioA
        } else {
            Peripheral::GpioB
        }
    }
}

/// Transmitter keeping the last frame, refusing everything while `full`.
#[derive(Default)]
pub struct Transmitter {
    pub full: bool,
    pub sent: usize,
    pub last: Option<CanFrame>,
}

impl FrameTransmitter for Transmitter {
    fn transmit(&mut self, frame: &CanFrame) -> Result<Mailbox, TransmitError> {
        if self.full {
            return Err(TransmitError::MailboxFull);
        }
        self.sent += 1;
        self.last = Some(*frame);
        Ok(Mailbox::Mailbox0)
    }
}
