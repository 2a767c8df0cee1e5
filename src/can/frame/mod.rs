//! In-memory representation of classic CAN frames and their encoding in the
//! bxCAN mailbox identifier registers.
use embedded_can::{ExtendedId, Id, StandardId};

use crate::can::filter::Fifo;
use crate::error::FrameError;

/// Maximum payload of a classic CAN frame.
pub const MAX_DATA_LEN: usize = 8;

//==================================================================================ID_REGISTER
/// Identifier as laid out in TIxR / RIxR.
///
/// ```text
/// Bits 31-21 : standard identifier      (IDE = 0)
/// Bits 31-3  : extended identifier      (IDE = 1)
/// Bit  2     : IDE
/// Bit  1     : RTR
/// Bit  0     : TXRQ (transmit) / reserved (receive)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdReg(pub u32);

impl IdReg {
    const STANDARD_SHIFT: u32 = 21;
    const EXTENDED_SHIFT: u32 = 3;
    pub const IDE: u32 = 1 << 2;
    pub const RTR: u32 = 1 << 1;
    pub const TXRQ: u32 = 1 << 0;

    /// Encode `id` and the remote flag.
    pub fn new(id: Id, remote: bool) -> Self {
        let raw = match id {
            Id::Standard(id) => (id.as_raw() as u32) << Self::STANDARD_SHIFT,
            Id::Extended(id) => (id.as_raw() << Self::EXTENDED_SHIFT) | Self::IDE,
        };
        if remote {
            Self(raw | Self::RTR)
        } else {
            Self(raw)
        }
    }

    /// Raw value read from a mailbox, with the TXRQ/reserved bit dropped.
    pub fn from_register(reg: u32) -> Self {
        Self(reg & !Self::TXRQ)
    }

    pub fn is_extended(self) -> bool {
        self.0 & Self::IDE != 0
    }

    pub fn is_remote(self) -> bool {
        self.0 & Self::RTR != 0
    }

    /// Decode the identifier.
    pub fn id(self) -> Id {
        if self.is_extended() {
            // 29 bits survive the shift, always in range.
            let raw = self.0 >> Self::EXTENDED_SHIFT;
            Id::Extended(ExtendedId::new(raw).unwrap_or(ExtendedId::MAX))
        } else {
            let raw = (self.0 >> Self::STANDARD_SHIFT) as u16;
            Id::Standard(StandardId::new(raw).unwrap_or(StandardId::MAX))
        }
    }
}

//==================================================================================CAN_FRAME
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Classic CAN data or remote frame.
pub struct CanFrame {
    id: Id,
    remote: bool,
    dlc: u8,
    data: [u8; MAX_DATA_LEN],
}

impl CanFrame {
    /// Build a data frame; payloads longer than eight bytes are rejected.
    pub fn new_data(id: impl Into<Id>, data: &[u8]) -> Result<Self, FrameError> {
        if data.len() > MAX_DATA_LEN {
            return Err(FrameError::DataTooLong { len: data.len() });
        }
        let mut buffer = [0u8; MAX_DATA_LEN];
        buffer[..data.len()].copy_from_slice(data);
        Ok(Self {
            id: id.into(),
            remote: false,
            dlc: data.len() as u8,
            data: buffer,
        })
    }

    /// Build a full eight-byte data frame.
    pub fn with_payload(id: impl Into<Id>, data: [u8; MAX_DATA_LEN]) -> Self {
        Self {
            id: id.into(),
            remote: false,
            dlc: MAX_DATA_LEN as u8,
            data,
        }
    }

    /// Build a remote frame requesting `dlc` bytes.
    pub fn new_remote_request(id: impl Into<Id>, dlc: usize) -> Result<Self, FrameError> {
        if dlc > MAX_DATA_LEN {
            return Err(FrameError::InvalidDlc { dlc });
        }
        Ok(Self {
            id: id.into(),
            remote: true,
            dlc: dlc as u8,
            data: [0; MAX_DATA_LEN],
        })
    }

    /// Rebuild a frame from the four mailbox registers (IxR, DTxR, DLxR, DHxR).
    pub(crate) fn from_mailbox(id_reg: u32, dtr: u32, low: u32, high: u32) -> Self {
        let id_reg = IdReg::from_register(id_reg);
        let dlc = ((dtr & 0x0F) as u8).min(MAX_DATA_LEN as u8);
        let mut data = [0u8; MAX_DATA_LEN];
        data[..4].copy_from_slice(&low.to_le_bytes());
        data[4..].copy_from_slice(&high.to_le_bytes());
        if id_reg.is_remote() {
            data = [0; MAX_DATA_LEN];
        } else {
            data[dlc as usize..].fill(0);
        }
        Self {
            id: id_reg.id(),
            remote: id_reg.is_remote(),
            dlc,
            data,
        }
    }

    /// Identifier register value (without TXRQ).
    pub fn id_reg(&self) -> IdReg {
        IdReg::new(self.id, self.remote)
    }

    /// Payload bytes 0..4 as the DLxR word.
    pub(crate) fn low_word(&self) -> u32 {
        u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
    }

    /// Payload bytes 4..8 as the DHxR word.
    pub(crate) fn high_word(&self) -> u32 {
        u32::from_le_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
    }

    /// Full eight-byte buffer, zero-padded past the data length.
    pub fn raw_data(&self) -> &[u8; MAX_DATA_LEN] {
        &self.data
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::new_data(id, data).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        Self::new_remote_request(id, dlc).ok()
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.dlc as usize]
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, f: defmt::Formatter) {
        if self.remote {
            defmt::write!(f, "CanFrame {} remote dlc={=u8}", IdFormat(self.id), self.dlc)
        } else {
            defmt::write!(
                f,
                "CanFrame {} data={=[u8]}",
                IdFormat(self.id),
                &self.data[..self.dlc as usize]
            )
        }
    }
}

//==================================================================================ID_FORMAT
/// `defmt` rendering of an identifier: `std:0x7ff`, `ext:0x1fffffff`.
#[cfg(feature = "defmt")]
#[derive(Clone, Copy)]
pub struct IdFormat(pub Id);

#[cfg(feature = "defmt")]
impl defmt::Format for IdFormat {
    fn format(&self, f: defmt::Formatter) {
        match self.0 {
            Id::Standard(id) => defmt::write!(f, "std:{=u16:#x}", id.as_raw()),
            Id::Extended(id) => defmt::write!(f, "ext:{=u32:#x}", id.as_raw()),
        }
    }
}

//==================================================================================RECEIVED_FRAME
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame drained from a receive FIFO, with the filter that accepted it.
pub struct ReceivedFrame {
    pub frame: CanFrame,
    /// Filter match index reported by the controller (RDTxR.FMI).
    pub filter_index: u8,
    /// FIFO the frame was read from.
    pub fifo: Fifo,
}

impl ReceivedFrame {
    /// First payload byte, or zero for an empty or remote frame.
    pub fn first_byte(&self) -> u8 {
        embedded_can::Frame::data(&self.frame)
            .first()
            .copied()
            .unwrap_or(0)
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
