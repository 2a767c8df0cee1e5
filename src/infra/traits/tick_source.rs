//! Periodic tick abstraction driving the heartbeat.
use embassy_time::Duration;

/// Clock feeding the tick counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickClockSource {
    /// Core clock (AHB).
    Ahb,
    /// Core clock divided by eight.
    AhbDiv8,
}

impl TickClockSource {
    /// Division applied to the core clock.
    pub const fn divider(self) -> u32 {
        match self {
            TickClockSource::Ahb => 1,
            TickClockSource::AhbDiv8 => 8,
        }
    }
}

/// Counter setup for a tick source: clock selection and reload value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickConfig {
    pub source: TickClockSource,
    /// Counts per tick period.
    pub reload: u32,
}

impl TickConfig {
    /// Largest reload a 24-bit down-counter accepts.
    pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

    /// Compute the reload producing `tick_hz` interrupts per second from
    /// `core_clock_hz` through `source`.
    ///
    /// 72 MHz / 8 / 1000 Hz gives 9000 counts per 1 ms tick.
    pub const fn from_frequency(core_clock_hz: u32, source: TickClockSource, tick_hz: u32) -> Self {
        Self {
            source,
            reload: core_clock_hz / source.divider() / tick_hz,
        }
    }

    /// Period of one tick for the given core clock.
    pub fn period(&self, core_clock_hz: u32) -> Duration {
        let counter_hz = (core_clock_hz / self.source.divider()) as u64;
        Duration::from_micros(self.reload as u64 * 1_000_000 / counter_hz)
    }
}

/// Contract for a free-running periodic interrupt source.
///
/// The firmware binds the tick interrupt to
/// [`SharedNode::on_tick`](crate::node::shared::SharedNode::on_tick); this
/// trait only controls the counter and the urgency of its interrupt.
pub trait TickSource {
    /// Assign `priority` to the tick interrupt. Lower values preempt higher ones.
    fn set_priority(&mut self, priority: u8);

    /// Program the counter with `config`, enable its interrupt and start counting.
    fn start(&mut self, config: &TickConfig);
}
