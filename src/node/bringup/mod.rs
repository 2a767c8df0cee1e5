//! Bring-up sequencer: orders clock, LED, CAN and tick initialization.
//!
//! ```text
//! Booting ──► Operational            (tick running, receive interrupt armed)
//!    │
//!    └──────► Halted(BusInit(..))    (LED3 lit, no interrupt, no tick)
//! ```
//!
//! A halted node is terminal: nothing is retried and nothing is reset. The
//! firmware parks in [`halt`] once it sees [`BringUpOutcome::Halted`].
//!
//! The node lands in its [`SharedNode`] slot before the receive line is
//! unmasked and before the tick starts, so the first interrupt of either kind
//! already finds it there.
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::{
    can::{
        controller::{CanController, Interrupt},
        filter::Fifo,
    },
    config::{NodePins, NodeConfig, CAN_TX_SPEED_MHZ, LED_SPEED_MHZ},
    error::HaltReason,
    infra::traits::{
        can_registers::CanRegisters,
        gpio_port::{GpioPort, PinDirection, PinMode},
        platform::{Irq, Peripheral, Platform},
        tick_source::TickSource,
    },
    node::{
        indicator::{LedBank, StatusPattern},
        shared::SharedNode,
        Node,
    },
};

/// Lifecycle of the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeState {
    /// Bring-up not run yet.
    Booting,
    /// Interrupts drive the node.
    Operational,
    /// Fatal failure; the node never leaves this state.
    Halted(HaltReason),
}

/// What bring-up produced.
pub enum BringUpOutcome<R: CanRegisters, G: GpioPort> {
    /// Node installed in its slot, interrupts live.
    Operational,
    /// Bus never came up; the LED bank shows the failure pattern.
    Halted {
        reason: HaltReason,
        controller: CanController<R>,
        leds: LedBank<G>,
    },
}

impl<R: CanRegisters, G: GpioPort> BringUpOutcome<R, G> {
    pub fn is_operational(&self) -> bool {
        matches!(self, BringUpOutcome::Operational)
    }
}

/// Interrupt line and cause serving a receive FIFO.
const fn rx_interrupt(fifo: Fifo) -> (Irq, Interrupt) {
    match fifo {
        Fifo::Fifo0 => (Irq::CanRx0, Interrupt::Fifo0MessagePending),
        Fifo::Fifo1 => (Irq::CanRx1, Interrupt::Fifo1MessagePending),
    }
}

/// One-shot initialization sequence.
pub struct BringUp<'a> {
    config: &'a NodeConfig,
    state: NodeState,
}

impl<'a> BringUp<'a> {
    pub fn new(config: &'a NodeConfig) -> Self {
        Self {
            config,
            state: NodeState::Booting,
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Run the whole sequence and install the node in `slot`.
    ///
    /// 1. system clock;
    /// 2. LED lines: port clocks, all off, push-pull outputs;
    /// 3. CAN: clocks, pins, receive interrupt priority, controller reset and
    ///    initialization, acceptance filter, receive interrupt enable;
    /// 4. node installed in `slot`, receive line unmasked;
    /// 5. tick source, less urgent than the receive interrupt.
    ///
    /// Initialization failure stops the sequence after step 3's controller
    /// init: the failure pattern is shown, the state becomes
    /// [`NodeState::Halted`] and `slot` stays untouched.
    pub fn run<P, T, M, R, G>(
        &mut self,
        platform: &mut P,
        tick: &mut T,
        regs: R,
        mut gpio: G,
        pins: NodePins<G::Pin>,
        slot: &SharedNode<M, R, G>,
    ) -> BringUpOutcome<R, G>
    where
        P: Platform,
        T: TickSource,
        M: RawMutex,
        R: CanRegisters,
        G: GpioPort,
    {
        let config = self.config;

        platform.configure_system_clock();
        #[cfg(feature = "defmt")]
        defmt::info!("Bring-up: core clock {} Hz", config.core_clock_hz());

        for line in pins.leds {
            platform.enable_clock(gpio.port_clock(line));
        }
        platform.enable_clock(Peripheral::Afio);
        platform.enable_clock(gpio.port_clock(pins.can_rx));
        platform.enable_clock(gpio.port_clock(pins.can_tx));
        platform.enable_clock(Peripheral::Can1);

        // CAN pins before the LED bank takes the port.
        gpio.set(pins.can_rx);
        gpio.configure(pins.can_rx, PinDirection::Input, PinMode::PullUpDown);
        gpio.configure(
            pins.can_tx,
            PinDirection::Output {
                speed_mhz: CAN_TX_SPEED_MHZ,
            },
            PinMode::AlternatePushPull,
        );

        let mut leds = LedBank::new(gpio, pins.leds);
        leds.init(LED_SPEED_MHZ);

        let fifo = config.filter().fifo;
        let (irq, interrupt) = rx_interrupt(fifo);
        platform.set_priority(irq, config.rx_irq_priority());

        let mut controller = CanController::with_poll_limit(regs, config.init_poll_limit());
        controller.reset(platform);
        if let Err(err) = controller.init(config.timing()) {
            let reason = HaltReason::BusInit(err);
            #[cfg(feature = "defmt")]
            defmt::error!("Bring-up: halting, {}", reason);
            leds.show(StatusPattern::BusInitFailure);
            self.state = NodeState::Halted(reason);
            return BringUpOutcome::Halted {
                reason,
                controller,
                leds,
            };
        }

        controller.install_filter(config.filter());
        // Pends at the NVIC until the line is unmasked below.
        controller.enable_interrupt(interrupt);

        slot.install(Node::new(controller, leds, config));
        platform.enable_irq(irq);

        tick.set_priority(config.tick_priority());
        tick.start(config.tick());
        self.state = NodeState::Operational;
        #[cfg(feature = "defmt")]
        defmt::info!("Bring-up: operational");

        BringUpOutcome::Operational
    }
}

/// Terminal state of a halted node: spin forever.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
