//! Heartbeat transmitter.
//!
//! Counts ticks; every `period` ticks it increments a wrapping counter and
//! submits one eight-byte data frame `[counter, pattern...]`. A frame that
//! finds no free mailbox is dropped, shown on the LED bank and never retried:
//! the next heartbeat goes out one period later as if nothing happened.
use embedded_can::Id;

use crate::{
    can::{controller::Mailbox, frame::CanFrame, frame::MAX_DATA_LEN, FrameTransmitter},
    config::NodeConfig,
    error::TransmitError,
    infra::traits::gpio_port::GpioPort,
    node::indicator::{LedBank, StatusPattern},
};

/// Result of advancing the tick counter by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Period not elapsed yet.
    Wait,
    /// Period elapsed: this heartbeat must go out now.
    Fire(CanFrame),
}

/// What one tick did on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatEvent {
    /// Nothing to send on this tick.
    Idle,
    /// Heartbeat queued in this mailbox.
    Sent(Mailbox),
    /// Heartbeat dropped; the transmit failure pattern is displayed.
    Dropped(TransmitError),
}

/// Tick counter and heartbeat counter, plus the frame shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    id: Id,
    pattern: [u8; MAX_DATA_LEN - 1],
    period: u16,
    ticks: u16,
    counter: u8,
}

impl Heartbeat {
    /// Both counters start at zero: the first frame carries counter 1.
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            id: config.heartbeat_id(),
            pattern: config.heartbeat_pattern(),
            period: config.heartbeat_period().max(1),
            ticks: 0,
            counter: 0,
        }
    }

    /// Ticks elapsed in the current period (0 to period - 1).
    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    /// Counter carried by the last heartbeat built.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Advance by one tick, building the next heartbeat when the period elapses.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        if self.ticks < self.period {
            return TickOutcome::Wait;
        }
        self.ticks = 0;
        self.counter = self.counter.wrapping_add(1);
        TickOutcome::Fire(self.frame())
    }

    /// Heartbeat frame for the current counter value.
    pub fn frame(&self) -> CanFrame {
        let mut data = [0u8; MAX_DATA_LEN];
        data[0] = self.counter;
        data[1..].copy_from_slice(&self.pattern);
        CanFrame::with_payload(self.id, data)
    }

    /// Tick handler body: advance and, when due, submit the heartbeat.
    ///
    /// A refused submission shows [`StatusPattern::TransmitFailure`] and leaves
    /// both counters as they are.
    pub fn on_tick<T, G>(&mut self, tx: &mut T, leds: &mut LedBank<G>) -> HeartbeatEvent
    where
        T: FrameTransmitter,
        G: GpioPort,
    {
        let TickOutcome::Fire(frame) = self.tick() else {
            return HeartbeatEvent::Idle;
        };
        match tx.transmit(&frame) {
            Ok(mailbox) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Heartbeat {} queued", self.counter);
                HeartbeatEvent::Sent(mailbox)
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Heartbeat {} dropped: {}", self.counter, err);
                leds.show(StatusPattern::TransmitFailure);
                HeartbeatEvent::Dropped(err)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Heartbeat {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Heartbeat {} counter={=u8} ticks={=u16}/{=u16}",
            crate::can::frame::IdFormat(self.id),
            self.counter,
            self.ticks,
            self.period
        )
    }
}
