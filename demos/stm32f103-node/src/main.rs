//! # STM32F103 CAN status node
//!
//! Heartbeat on the bus every second, low nibble of each received frame on
//! four LEDs, LED3 alone when the CAN controller cannot be initialized.
//!
//! ## Compilation
//! ```bash
//! cd demos/stm32f103-node
//! cargo build --release
//! ```
//!
//! ## Wiring
//! - PA6, PA7, PB0, PB1 → LED0..LED3 (cathode side, active-low)
//! - PA11 → CAN RX, PA12 → CAN TX (through a transceiver such as TJA1050)
//! - 8 MHz crystal on HSE
#![no_std]
#![no_main]

use can_status_node::{
    config::{NodeConfig, NodePins},
    infra::{
        mmio::{MmioRegisters, CAN1_BASE},
        traits::{
            gpio_port::{GpioPort, PinDirection, PinMode},
            platform::{Irq, Peripheral, Platform},
            tick_source::{TickClockSource, TickConfig, TickSource},
        },
    },
    node::{
        bringup::{halt, BringUp, BringUpOutcome},
        shared::SharedNode,
    },
};
use cortex_m::peripheral::{scb::SystemHandler, syst::SystClkSource, NVIC, SCB, SYST};
use cortex_m_rt::{entry, exception};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use panic_halt as _;
use stm32f1::stm32f103::{self as pac, gpioa, interrupt, Interrupt, FLASH, GPIOA, GPIOB, GPIOC, RCC};

/// NVIC implements the upper four priority bits on this part.
const NVIC_PRIO_BITS: u8 = 4;

/// Logical priority (0 most urgent) to the hardware priority byte.
const fn hw_priority(priority: u8) -> u8 {
    priority << (8 - NVIC_PRIO_BITS)
}

/// Set then clear a reset bit.
macro_rules! pulse {
    ($reg:expr, $field:ident) => {{
        $reg.modify(|_, w| w.$field().set_bit());
        $reg.modify(|_, w| w.$field().clear_bit());
    }};
}

// ============================================================================
// Platform: clock tree, clock gates, NVIC
// ============================================================================

struct Stm32f103 {
    rcc: RCC,
    flash: FLASH,
    nvic: NVIC,
}

impl Stm32f103 {
    const fn interrupt(irq: Irq) -> Interrupt {
        match irq {
            Irq::CanRx0 => Interrupt::USB_LP_CAN_RX0,
            Irq::CanRx1 => Interrupt::CAN_RX1,
        }
    }
}

impl Platform for Stm32f103 {
    /// 8 MHz HSE × 9 = 72 MHz SYSCLK, APB1 at 36 MHz, two flash wait states.
    #[allow(unused_unsafe)]
    fn configure_system_clock(&mut self) {
        let rcc = &self.rcc;

        rcc.cr.modify(|_, w| w.hseon().set_bit());
        while rcc.cr.read().hserdy().bit_is_clear() {}

        unsafe { self.flash.acr.write(|w| w.latency().bits(0b010)) }

        rcc.cfgr
            .modify(|_, w| unsafe { w.pllmul().bits(0b0111).pllsrc().bit(true) });
        rcc.cr.modify(|_, w| w.pllon().set_bit());
        while rcc.cr.read().pllrdy().bit_is_clear() {}

        // APB1 = HCLK / 2, system clock from the PLL.
        rcc.cfgr
            .modify(|_, w| unsafe { w.ppre1().bits(0b100).sw().bits(0b10) });
        while rcc.cfgr.read().sws().bits() != 0b10 {}
    }

    fn enable_clock(&mut self, peripheral: Peripheral) {
        let rcc = &self.rcc;
        match peripheral {
            Peripheral::Afio => rcc.apb2enr.modify(|_, w| w.afioen().set_bit()),
            Peripheral::GpioA => rcc.apb2enr.modify(|_, w| w.iopaen().set_bit()),
            Peripheral::GpioB => rcc.apb2enr.modify(|_, w| w.iopben().set_bit()),
            Peripheral::GpioC => rcc.apb2enr.modify(|_, w| w.iopcen().set_bit()),
            Peripheral::Can1 => rcc.apb1enr.modify(|_, w| w.canen().set_bit()),
        };
        // Erratum 2.1.13: first access right after the enable may be lost.
        cortex_m::asm::dsb();
    }

    fn reset_peripheral(&mut self, peripheral: Peripheral) {
        let rcc = &self.rcc;
        match peripheral {
            Peripheral::Afio => pulse!(rcc.apb2rstr, afiorst),
            Peripheral::GpioA => pulse!(rcc.apb2rstr, ioparst),
            Peripheral::GpioB => pulse!(rcc.apb2rstr, iopbrst),
            Peripheral::GpioC => pulse!(rcc.apb2rstr, iopcrst),
            Peripheral::Can1 => pulse!(rcc.apb1rstr, canrst),
        }
    }

    fn set_priority(&mut self, irq: Irq, priority: u8) {
        unsafe {
            self.nvic
                .set_priority(Self::interrupt(irq), hw_priority(priority));
        }
    }

    fn enable_irq(&mut self, irq: Irq) {
        unsafe { NVIC::unmask(Self::interrupt(irq)) }
    }
}

// ============================================================================
// GPIO
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Port {
    A,
    B,
    C,
}

/// The three GPIO ports of the board.
struct Board {
    gpioa: GPIOA,
    gpiob: GPIOB,
    gpioc: GPIOC,
}

impl Board {
    fn port(&self, port: Port) -> &gpioa::RegisterBlock {
        match port {
            Port::A => &*self.gpioa,
            Port::B => &*self.gpiob,
            Port::C => &*self.gpioc,
        }
    }
}

impl GpioPort for Board {
    type Pin = (Port, u8);

    fn set(&mut self, (port, pin): Self::Pin) {
        self.port(port).bsrr.write(|w| unsafe { w.bits(1 << pin) });
    }

    fn clear(&mut self, (port, pin): Self::Pin) {
        self.port(port)
            .bsrr
            .write(|w| unsafe { w.bits(1 << (16 + pin)) });
    }

    fn configure(&mut self, (port, pin): Self::Pin, direction: PinDirection, mode: PinMode) {
        let mode_bits: u32 = match direction {
            PinDirection::Input => 0b00,
            PinDirection::Output { speed_mhz: 10 } => 0b01,
            PinDirection::Output { speed_mhz: 2 } => 0b10,
            PinDirection::Output { .. } => 0b11,
        };
        let cnf_bits: u32 = match (direction, mode) {
            (PinDirection::Input, PinMode::Floating) => 0b01,
            (PinDirection::Input, PinMode::PullUpDown) => 0b10,
            (PinDirection::Input, _) => 0b01,
            (_, PinMode::OpenDrain) => 0b01,
            (_, PinMode::AlternatePushPull) => 0b10,
            _ => 0b00,
        };
        let shift = (pin % 8) * 4;
        let bits = (cnf_bits << 2 | mode_bits) << shift;
        let block = self.port(port);
        if pin < 8 {
            block
                .crl
                .modify(|r, w| unsafe { w.bits((r.bits() & !(0xF << shift)) | bits) });
        } else {
            block
                .crh
                .modify(|r, w| unsafe { w.bits((r.bits() & !(0xF << shift)) | bits) });
        }
    }

    fn port_clock(&self, (port, _): Self::Pin) -> Peripheral {
        match port {
            Port::A => Peripheral::GpioA,
            Port::B => Peripheral::GpioB,
            Port::C => Peripheral::GpioC,
        }
    }
}

const PINS: NodePins<(Port, u8)> = NodePins {
    leds: [(Port::A, 6), (Port::A, 7), (Port::B, 0), (Port::B, 1)],
    can_rx: (Port::A, 11),
    can_tx: (Port::A, 12),
};

// ============================================================================
// SysTick
// ============================================================================

struct SysTickSource {
    syst: SYST,
    scb: SCB,
}

impl TickSource for SysTickSource {
    fn set_priority(&mut self, priority: u8) {
        // Reset value 0 would outrank the receive interrupt.
        unsafe {
            self.scb
                .set_priority(SystemHandler::SysTick, hw_priority(priority));
        }
    }

    fn start(&mut self, config: &TickConfig) {
        let source = match config.source {
            TickClockSource::Ahb => SystClkSource::Core,
            TickClockSource::AhbDiv8 => SystClkSource::External,
        };
        self.syst.set_clock_source(source);
        self.syst.set_reload(config.reload - 1);
        self.syst.clear_current();
        self.syst.enable_interrupt();
        self.syst.enable_counter();
    }
}

// ============================================================================
// Firmware
// ============================================================================

static NODE: SharedNode<CriticalSectionRawMutex, MmioRegisters, Board> = SharedNode::new();

#[entry]
fn main() -> ! {
    let (Some(cp), Some(dp)) = (cortex_m::Peripherals::take(), pac::Peripherals::take()) else {
        halt()
    };
    let mut platform = Stm32f103 {
        rcc: dp.RCC,
        flash: dp.FLASH,
        nvic: cp.NVIC,
    };
    let mut tick = SysTickSource {
        syst: cp.SYST,
        scb: cp.SCB,
    };
    let board = Board {
        gpioa: dp.GPIOA,
        gpiob: dp.GPIOB,
        gpioc: dp.GPIOC,
    };
    let config = NodeConfig::default();

    // Sole owner of CAN1 from here on.
    let regs = unsafe { MmioRegisters::new(CAN1_BASE) };

    match BringUp::new(&config).run(&mut platform, &mut tick, regs, board, PINS, &NODE) {
        BringUpOutcome::Operational => loop {
            cortex_m::asm::wfi();
        },
        BringUpOutcome::Halted { .. } => halt(),
    }
}

#[exception]
fn SysTick() {
    NODE.on_tick();
}

#[interrupt]
fn USB_LP_CAN_RX0() {
    NODE.on_rx_pending();
}
