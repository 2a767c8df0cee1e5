//! Driver for the bxCAN controller: mode transitions, bit timing, the
//! acceptance filter bank, interrupt enables, transmit mailboxes and receive
//! FIFOs.
//!
//! Every operation is non-blocking except [`CanController::init`], whose
//! mode-transition polls are bounded by the configured poll limit.
use crate::{
    can::{
        filter::{AcceptanceFilter, Fifo, FILTER_BANKS},
        frame::{CanFrame, IdReg, ReceivedFrame},
        timing::{BusTiming, ModeFlags},
        FrameTransmitter,
    },
    error::{InitError, TransmitError},
    infra::traits::{
        can_registers::{CanRegisters, Register},
        platform::{Peripheral, Platform},
    },
};

/// Default number of MSR polls before declaring a mode transition failed.
pub const INIT_POLL_LIMIT: u32 = 0xFFFF;

// MCR
const MCR_INRQ: u32 = 1 << 0;
const MCR_SLEEP: u32 = 1 << 1;
// MSR
const MSR_INAK: u32 = 1 << 0;
const MSR_SLAK: u32 = 1 << 1;
// TSR
const TSR_TME_SHIFT: u32 = 26;
// RFxR
const RFR_FMP_MASK: u32 = 0b11;
const RFR_RFOM: u32 = 1 << 5;
// RDTxR
const RDTR_FMI_SHIFT: u32 = 8;
// FMR
const FMR_FINIT: u32 = 1 << 0;

//==================================================================================MAILBOX
/// Transmit mailbox index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mailbox {
    Mailbox0 = 0,
    Mailbox1 = 1,
    Mailbox2 = 2,
}

impl Mailbox {
    const ALL: [Mailbox; 3] = [Mailbox::Mailbox0, Mailbox::Mailbox1, Mailbox::Mailbox2];

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// TMEx bit in TSR.
    const fn empty_flag(self) -> u32 {
        1 << (TSR_TME_SHIFT + self as u32)
    }
}

//==================================================================================INTERRUPT
/// Interrupt causes of the controller, valued by their IER bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interrupt {
    TransmitMailboxEmpty = 0,
    Fifo0MessagePending = 1,
    Fifo0Full = 2,
    Fifo0Overrun = 3,
    Fifo1MessagePending = 4,
    Fifo1Full = 5,
    Fifo1Overrun = 6,
    ErrorWarning = 8,
    ErrorPassive = 9,
    BusOff = 10,
    LastErrorCode = 11,
    Error = 15,
    Wakeup = 16,
    Sleep = 17,
}

impl Interrupt {
    pub const fn ier_bit(self) -> u32 {
        1 << self as u32
    }
}

//==================================================================================CONTROLLER
/// Owner of one bxCAN register file.
pub struct CanController<R: CanRegisters> {
    regs: R,
    init_poll_limit: u32,
}

impl<R: CanRegisters> CanController<R> {
    /// Wrap `regs`, polling mode transitions up to [`INIT_POLL_LIMIT`] times.
    pub fn new(regs: R) -> Self {
        Self::with_poll_limit(regs, INIT_POLL_LIMIT)
    }

    /// Wrap `regs` with a custom poll bound (at least one poll is always made).
    pub fn with_poll_limit(regs: R, init_poll_limit: u32) -> Self {
        Self {
            regs,
            init_poll_limit: init_poll_limit.max(1),
        }
    }

    /// Borrow the register file.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Give the register file back.
    pub fn free(self) -> R {
        self.regs
    }

    /// Return the peripheral to its reset state through the clock controller.
    pub fn reset<P: Platform>(&mut self, platform: &mut P) {
        platform.reset_peripheral(Peripheral::Can1);
    }

    /// Enter initialization mode, apply `timing`, then request normal mode.
    ///
    /// Fails when the controller does not acknowledge either transition within
    /// the poll bound. The caller must treat the failure as fatal.
    pub fn init(&mut self, timing: &BusTiming) -> Result<(), InitError> {
        // Wake up and request initialization.
        self.regs.clear_bits(Register::Mcr, MCR_SLEEP);
        self.regs.set_bits(Register::Mcr, MCR_INRQ);

        if !self.poll_msr(MSR_INAK, true) {
            #[cfg(feature = "defmt")]
            defmt::error!("CAN: no INAK after {} polls", self.init_poll_limit);
            return Err(InitError::EnterInitTimeout {
                attempts: self.init_poll_limit,
            });
        }

        self.regs.write(Register::Btr, 0);
        let flags = timing.flags().mcr_bits();
        self.regs
            .modify(Register::Mcr, |mcr| (mcr & !ModeFlags::MCR_MASK) | flags);
        self.regs.write(Register::Btr, timing.btr());

        // Request normal mode.
        self.regs.clear_bits(Register::Mcr, MCR_INRQ);

        if !self.poll_msr(MSR_INAK, false) {
            #[cfg(feature = "defmt")]
            defmt::error!("CAN: INAK still set after {} polls", self.init_poll_limit);
            return Err(InitError::LeaveInitTimeout {
                attempts: self.init_poll_limit,
            });
        }

        #[cfg(feature = "defmt")]
        defmt::info!("CAN: normal mode, BTR={=u32:#x}", timing.btr());
        Ok(())
    }

    /// Poll MSR until `mask` reads as `set`, within the poll bound.
    fn poll_msr(&self, mask: u32, set: bool) -> bool {
        (0..self.init_poll_limit).any(|_| (self.regs.read(Register::Msr) & mask != 0) == set)
    }

    /// Neither initialization nor sleep mode is acknowledged.
    pub fn is_operational(&self) -> bool {
        self.regs.read(Register::Msr) & (MSR_INAK | MSR_SLAK) == 0
    }

    /// Program one filter bank in 32-bit identifier/mask mode.
    pub fn install_filter(&mut self, filter: &AcceptanceFilter) {
        debug_assert!(filter.bank < FILTER_BANKS, "filter bank out of range");
        let bit = filter.bank_bit();

        self.regs.set_bits(Register::Fmr, FMR_FINIT);
        self.regs.clear_bits(Register::Fa1r, bit);

        self.regs.set_bits(Register::Fs1r, bit);
        self.regs.clear_bits(Register::Fm1r, bit);
        match filter.fifo {
            Fifo::Fifo0 => self.regs.clear_bits(Register::Ffa1r, bit),
            Fifo::Fifo1 => self.regs.set_bits(Register::Ffa1r, bit),
        }
        self.regs.write(Register::Fr1(filter.bank), filter.id);
        self.regs.write(Register::Fr2(filter.bank), filter.mask);

        if filter.enabled {
            self.regs.set_bits(Register::Fa1r, bit);
        }
        self.regs.clear_bits(Register::Fmr, FMR_FINIT);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "CAN: filter bank {} id={=u32:#x} mask={=u32:#x}",
            filter.bank,
            filter.id,
            filter.mask
        );
    }

    /// Unmask `interrupt` in IER.
    pub fn enable_interrupt(&mut self, interrupt: Interrupt) {
        self.regs.set_bits(Register::Ier, interrupt.ier_bit());
    }

    /// Mask `interrupt` in IER.
    pub fn disable_interrupt(&mut self, interrupt: Interrupt) {
        self.regs.clear_bits(Register::Ier, interrupt.ier_bit());
    }

    /// Lowest-index empty mailbox, if any.
    pub fn free_mailbox(&self) -> Option<Mailbox> {
        let tsr = self.regs.read(Register::Tsr);
        Mailbox::ALL
            .into_iter()
            .find(|mb| tsr & mb.empty_flag() != 0)
    }

    /// Place `frame` in a free mailbox and request its transmission.
    ///
    /// Never blocks and never retries: with all three mailboxes pending the
    /// frame is dropped and [`TransmitError::MailboxFull`] is returned.
    pub fn transmit(&mut self, frame: &CanFrame) -> Result<Mailbox, TransmitError> {
        let Some(mailbox) = self.free_mailbox() else {
            #[cfg(feature = "defmt")]
            defmt::warn!("CAN: all transmit mailboxes pending");
            return Err(TransmitError::MailboxFull);
        };
        let idx = mailbox.index();

        self.regs
            .write(Register::Tdtr(idx), embedded_can::Frame::dlc(frame) as u32);
        self.regs.write(Register::Tdlr(idx), frame.low_word());
        self.regs.write(Register::Tdhr(idx), frame.high_word());
        // TXRQ last: the mailbox is handed to the hardware with this write.
        self.regs
            .write(Register::Tir(idx), frame.id_reg().0 | IdReg::TXRQ);

        #[cfg(feature = "defmt")]
        defmt::trace!("CAN: queued in mailbox {}", idx);
        Ok(mailbox)
    }

    /// Number of frames waiting in `fifo` (0 to 3).
    pub fn pending(&self, fifo: Fifo) -> u8 {
        (self.regs.read(Register::Rfr(fifo.index())) & RFR_FMP_MASK) as u8
    }

    /// Copy the oldest frame of `fifo` out of the hardware without releasing it.
    ///
    /// Every `Some` must be followed by exactly one [`release`](Self::release).
    pub fn receive(&mut self, fifo: Fifo) -> Option<ReceivedFrame> {
        if self.pending(fifo) == 0 {
            return None;
        }
        let idx = fifo.index();
        let rir = self.regs.read(Register::Rir(idx));
        let rdtr = self.regs.read(Register::Rdtr(idx));
        let rdlr = self.regs.read(Register::Rdlr(idx));
        let rdhr = self.regs.read(Register::Rdhr(idx));

        Some(ReceivedFrame {
            frame: CanFrame::from_mailbox(rir, rdtr, rdlr, rdhr),
            filter_index: (rdtr >> RDTR_FMI_SHIFT) as u8,
            fifo,
        })
    }

    /// Hand the output mailbox of `fifo` back to the hardware.
    pub fn release(&mut self, fifo: Fifo) {
        self.regs.write(Register::Rfr(fifo.index()), RFR_RFOM);
    }

    /// Read one frame from `fifo`, pass it to `f`, then release the slot.
    ///
    /// The slot is released exactly once per frame read; `None` means the
    /// FIFO was empty and nothing was released.
    pub fn drain<T, F>(&mut self, fifo: Fifo, f: F) -> Option<T>
    where
        F: FnOnce(&ReceivedFrame) -> T,
    {
        let received = self.receive(fifo)?;
        let result = f(&received);
        self.release(fifo);
        Some(result)
    }
}

impl<R: CanRegisters> FrameTransmitter for CanController<R> {
    fn transmit(&mut self, frame: &CanFrame) -> Result<Mailbox, TransmitError> {
        CanController::transmit(self, frame)
    }
}
