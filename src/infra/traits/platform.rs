//! Integration contract with the MCU: clock tree, peripheral clock gating and
//! resets, and the interrupt controller. Everything the bring-up sequence needs
//! from the chip besides GPIO levels and the CAN register file.

/// Peripherals whose clock the node gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    /// Alternate function I/O block.
    Afio,
    /// GPIO port A.
    GpioA,
    /// GPIO port B.
    GpioB,
    /// GPIO port C.
    GpioC,
    /// First CAN controller.
    Can1,
}

/// Interrupt lines the node binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// CAN receive FIFO 0 (shared with USB low priority on STM32F103).
    CanRx0,
    /// CAN receive FIFO 1.
    CanRx1,
}

/// Contract towards the clock controller and the interrupt controller.
pub trait Platform {
    /// Bring the system clock tree to its operating frequency.
    fn configure_system_clock(&mut self);

    /// Gate the clock of `peripheral` on.
    fn enable_clock(&mut self, peripheral: Peripheral);

    /// Pulse the reset line of `peripheral`, returning it to register defaults.
    fn reset_peripheral(&mut self, peripheral: Peripheral);

    /// Assign `priority` to `irq`. Lower values preempt higher ones.
    fn set_priority(&mut self, irq: Irq, priority: u8);

    /// Unmask `irq` at the interrupt controller.
    fn enable_irq(&mut self, irq: Irq);
}
