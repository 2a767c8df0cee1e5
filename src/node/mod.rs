//! The node itself: heartbeat, status reflection, bring-up and the glue that
//! lets interrupt handlers reach the running node.
//!
//! A running [`Node`] is the whole mutable state of the firmware. Interrupt
//! handlers only ever call [`Node::on_tick`] and [`Node::on_rx_pending`],
//! normally through a [`shared::SharedNode`].
use crate::{
    can::{
        controller::CanController,
        filter::Fifo,
        frame::ReceivedFrame,
    },
    config::NodeConfig,
    infra::traits::{can_registers::CanRegisters, gpio_port::GpioPort},
};

pub mod bringup;
pub mod heartbeat;
pub mod indicator;
pub mod shared;
pub mod status;

#[cfg(test)]
mod mock;

use heartbeat::{Heartbeat, HeartbeatEvent};
use indicator::LedBank;
use status::reflect_status;

/// Operational node: controller, LED bank and heartbeat state.
pub struct Node<R: CanRegisters, G: GpioPort> {
    controller: CanController<R>,
    leds: LedBank<G>,
    heartbeat: Heartbeat,
    rx_fifo: Fifo,
}

impl<R: CanRegisters, G: GpioPort> Node<R, G> {
    /// Assemble a node around an initialized controller and LED bank.
    pub fn new(controller: CanController<R>, leds: LedBank<G>, config: &NodeConfig) -> Self {
        Self {
            controller,
            leds,
            heartbeat: Heartbeat::new(config),
            rx_fifo: config.filter().fifo,
        }
    }

    /// Tick interrupt body.
    pub fn on_tick(&mut self) -> HeartbeatEvent {
        self.heartbeat.on_tick(&mut self.controller, &mut self.leds)
    }

    /// Receive interrupt body: drain one frame, reflect it, release the slot.
    ///
    /// `None` when the FIFO turned out to be empty.
    pub fn on_rx_pending(&mut self) -> Option<ReceivedFrame> {
        let leds = &mut self.leds;
        self.controller.drain(self.rx_fifo, |received| {
            let _nibble = reflect_status(received, leds);
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "RX filter {} -> status {=u8:#b}",
                received.filter_index,
                _nibble
            );
            *received
        })
    }

    pub fn controller(&self) -> &CanController<R> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CanController<R> {
        &mut self.controller
    }

    pub fn leds(&self) -> &LedBank<G> {
        &self.leds
    }

    pub fn leds_mut(&mut self) -> &mut LedBank<G> {
        &mut self.leds
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// FIFO the acceptance filter routes frames into.
    pub fn rx_fifo(&self) -> Fifo {
        self.rx_fifo
    }
}
