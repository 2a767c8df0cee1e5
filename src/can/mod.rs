//! CAN side of the node: frames, bit timing, acceptance filtering and the
//! bxCAN controller driver.
use crate::error::TransmitError;

pub mod controller;
pub mod filter;
pub mod frame;
pub mod timing;

use controller::Mailbox;
use frame::CanFrame;

/// Contract for anything able to queue a frame on the bus.
///
/// Implementations must not block: a frame that cannot be queued right away is
/// reported through [`TransmitError`] and dropped.
pub trait FrameTransmitter {
    fn transmit(&mut self, frame: &CanFrame) -> Result<Mailbox, TransmitError>;
}

impl<T: FrameTransmitter + ?Sized> FrameTransmitter for &mut T {
    fn transmit(&mut self, frame: &CanFrame) -> Result<Mailbox, TransmitError> {
        (**self).transmit(frame)
    }
}
