//! Acceptance filtering: a single 32-bit identifier/mask bank routing matching
//! frames to one of the two receive FIFOs.
use crate::can::frame::IdReg;
use embedded_can::Id;

/// Number of filter banks on a single-CAN device.
pub const FILTER_BANKS: u8 = 14;

/// Receive FIFO selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fifo {
    Fifo0 = 0,
    Fifo1 = 1,
}

impl Fifo {
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// One filter bank in 32-bit mask mode.
///
/// A frame passes when every identifier-register bit selected by `mask`
/// equals the same bit of `id`. A zero mask therefore accepts everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcceptanceFilter {
    pub bank: u8,
    /// Identifier in mailbox register layout (see [`IdReg`]).
    pub id: u32,
    /// Bits of `id` that must match.
    pub mask: u32,
    pub fifo: Fifo,
    pub enabled: bool,
}

impl AcceptanceFilter {
    /// Filter accepting every identifier into `fifo`.
    pub const fn accept_all(bank: u8, fifo: Fifo) -> Self {
        Self {
            bank,
            id: 0,
            mask: 0,
            fifo,
            enabled: true,
        }
    }

    /// Filter accepting exactly `id` (data and remote frames alike).
    pub fn exact(bank: u8, id: Id, fifo: Fifo) -> Self {
        Self {
            bank,
            id: IdReg::new(id, false).0,
            // Identifier bits and IDE, RTR left free.
            mask: !(IdReg::RTR | IdReg::TXRQ),
            fifo,
            enabled: true,
        }
    }

    /// Whether a frame whose identifier register reads `id_reg` is accepted.
    pub const fn matches(&self, id_reg: u32) -> bool {
        self.enabled && (id_reg ^ self.id) & self.mask == 0
    }

    /// Bit selecting this bank in the FM1R / FS1R / FFA1R / FA1R registers.
    pub const fn bank_bit(&self) -> u32 {
        1 << self.bank
    }
}

impl Default for AcceptanceFilter {
    /// Bank 0, accept all, FIFO 0.
    fn default() -> Self {
        Self::accept_all(0, Fifo::Fifo0)
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
