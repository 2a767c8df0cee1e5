//! Word-level access to the bxCAN register file. The controller driver only
//! speaks in terms of these registers, which keeps the mode-transition polling
//! and mailbox bookkeeping in portable code and lets tests substitute an
//! emulated peripheral.

/// One 32-bit register of the bxCAN peripheral.
///
/// Indexed variants carry the mailbox (0..3), FIFO (0..2) or filter bank
/// (0..14) they address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Master control register.
    Mcr,
    /// Master status register.
    Msr,
    /// Transmit status register.
    Tsr,
    /// Receive FIFO register (RF0R / RF1R).
    Rfr(u8),
    /// Interrupt enable register.
    Ier,
    /// Error status register.
    Esr,
    /// Bit timing register.
    Btr,
    /// TX mailbox identifier register.
    Tir(u8),
    /// TX mailbox data length control and time stamp register.
    Tdtr(u8),
    /// TX mailbox data low register (bytes 0..4).
    Tdlr(u8),
    /// TX mailbox data high register (bytes 4..8).
    Tdhr(u8),
    /// RX FIFO mailbox identifier register.
    Rir(u8),
    /// RX FIFO mailbox data length control, filter match index and time stamp.
    Rdtr(u8),
    /// RX FIFO mailbox data low register.
    Rdlr(u8),
    /// RX FIFO mailbox data high register.
    Rdhr(u8),
    /// Filter master register.
    Fmr,
    /// Filter mode register (0 = mask, 1 = list).
    Fm1r,
    /// Filter scale register (0 = dual 16-bit, 1 = single 32-bit).
    Fs1r,
    /// Filter FIFO assignment register.
    Ffa1r,
    /// Filter activation register.
    Fa1r,
    /// Filter bank register 1 (identifier in mask mode).
    Fr1(u8),
    /// Filter bank register 2 (mask in mask mode).
    Fr2(u8),
}

impl Register {
    /// Byte offset of the register from the peripheral base address.
    pub const fn offset(self) -> usize {
        match self {
            Register::Mcr => 0x000,
            Register::Msr => 0x004,
            Register::Tsr => 0x008,
            Register::Rfr(fifo) => 0x00C + 4 * fifo as usize,
            Register::Ier => 0x014,
            Register::Esr => 0x018,
            Register::Btr => 0x01C,
            Register::Tir(mb) => 0x180 + 0x10 * mb as usize,
            Register::Tdtr(mb) => 0x184 + 0x10 * mb as usize,
            Register::Tdlr(mb) => 0x188 + 0x10 * mb as usize,
            Register::Tdhr(mb) => 0x18C + 0x10 * mb as usize,
            Register::Rir(fifo) => 0x1B0 + 0x10 * fifo as usize,
            Register::Rdtr(fifo) => 0x1B4 + 0x10 * fifo as usize,
            Register::Rdlr(fifo) => 0x1B8 + 0x10 * fifo as usize,
            Register::Rdhr(fifo) => 0x1BC + 0x10 * fifo as usize,
            Register::Fmr => 0x200,
            Register::Fm1r => 0x204,
            Register::Fs1r => 0x20C,
            Register::Ffa1r => 0x214,
            Register::Fa1r => 0x21C,
            Register::Fr1(bank) => 0x240 + 8 * bank as usize,
            Register::Fr2(bank) => 0x244 + 8 * bank as usize,
        }
    }
}

/// Contract to read and write bxCAN registers.
///
/// Implementations must forward every call to the peripheral (or to a faithful
/// emulation of it): the driver polls status registers and relies on each
/// `read` observing the current hardware state.
pub trait CanRegisters {
    /// Read the current value of `reg`.
    fn read(&self, reg: Register) -> u32;

    /// Write `value` to `reg`.
    fn write(&mut self, reg: Register, value: u32);

    /// Read-modify-write helper.
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set the bits of `mask` in `reg`.
    fn set_bits(&mut self, reg: Register, mask: u32) {
        self.modify(reg, |v| v | mask);
    }

    /// Clear the bits of `mask` in `reg`.
    fn clear_bits(&mut self, reg: Register, mask: u32) {
        self.modify(reg, |v| v & !mask);
    }
}

impl<T: CanRegisters + ?Sized> CanRegisters for &mut T {
    fn read(&self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }
}
