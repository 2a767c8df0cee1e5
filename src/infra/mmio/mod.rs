//! Volatile memory-mapped implementation of [`CanRegisters`] for real silicon.
use core::ptr::{read_volatile, write_volatile};

use crate::infra::traits::can_registers::{CanRegisters, Register};

/// Base address of CAN1 on STM32F1 devices.
pub const CAN1_BASE: usize = 0x4000_6400;

/// Register file of a bxCAN instance accessed through its base address.
pub struct MmioRegisters {
    base: *mut u32,
}

impl MmioRegisters {
    /// Wrap the register block starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a bxCAN register block that stays mapped for the
    /// lifetime of the returned value, and no other code may access that block
    /// while it exists.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    fn ptr(&self, reg: Register) -> *mut u32 {
        // Offsets are word aligned and inside the 1 KiB block.
        self.base.wrapping_byte_add(reg.offset())
    }
}

// Sole owner of the block per the `new` contract; no interior state besides the pointer.
unsafe impl Send for MmioRegisters {}

impl CanRegisters for MmioRegisters {
    fn read(&self, reg: Register) -> u32 {
        unsafe { read_volatile(self.ptr(reg)) }
    }

    fn write(&mut self, reg: Register, value: u32) {
        unsafe { write_volatile(self.ptr(reg), value) }
    }
}
