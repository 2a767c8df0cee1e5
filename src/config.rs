//! Node configuration: every number the node runs with, gathered in one
//! validated value.
//!
//! [`NodeConfig::default`] reproduces the reference hardware setup: 72 MHz core
//! clock, default bus timing, accept-all filter on bank 0 into FIFO 0, a
//! heartbeat on standard identifier 0 every 1000 ticks of 1 ms.
//!
//! ```
//! use can_status_node::config::NodeConfig;
//! use can_status_node::can::timing::BusTiming;
//!
//! let config = NodeConfig::builder()
//!     .timing(BusTiming::builder().prescaler(9))
//!     .heartbeat_period(500)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.timing().prescaler(), 9);
//! assert_eq!(config.heartbeat_period(), 500);
//! assert_eq!(config.tick().reload, 9000);
//! ```
use embedded_can::{Id, StandardId};

use crate::{
    can::{
        controller::INIT_POLL_LIMIT,
        filter::{AcceptanceFilter, Fifo, FILTER_BANKS},
        frame::MAX_DATA_LEN,
        timing::{BusTiming, BusTimingBuilder},
    },
    error::ConfigError,
    infra::traits::tick_source::{TickClockSource, TickConfig},
};

/// Ticks between two heartbeats.
pub const HEARTBEAT_PERIOD_TICKS: u16 = 1000;
/// Heartbeat payload bytes 1 to 7 (byte 0 is the counter).
pub const HEARTBEAT_PATTERN: [u8; MAX_DATA_LEN - 1] = [1, 2, 0, 0, 0, 0, 0];
/// Heartbeat identifier.
pub const HEARTBEAT_ID: StandardId = StandardId::ZERO;
/// Tick frequency.
pub const TICK_HZ: u32 = 1000;
/// Core clock once the clock tree is configured.
pub const CORE_CLOCK_HZ: u32 = 72_000_000;
/// NVIC priority of the receive interrupt (lower is more urgent).
pub const RX_IRQ_PRIORITY: u8 = 1;
/// Priority of the tick interrupt, below the receive interrupt.
pub const TICK_PRIORITY: u8 = 2;
/// Output speed of the LED lines.
pub const LED_SPEED_MHZ: u8 = 50;
/// Output speed of the CAN transmit line.
pub const CAN_TX_SPEED_MHZ: u8 = 50;

//==================================================================================NODE_PINS
/// Pin assignment of the node, in terms of the GPIO collaborator's pin type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodePins<P> {
    /// Status lines 0 to 3, active-low.
    pub leds: [P; 4],
    /// CAN receive line.
    pub can_rx: P,
    /// CAN transmit line.
    pub can_tx: P,
}

//==================================================================================NODE_CONFIG
/// Validated node configuration. Build it with [`NodeConfig::builder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    timing: BusTiming,
    filter: AcceptanceFilter,
    heartbeat_id: Id,
    heartbeat_pattern: [u8; MAX_DATA_LEN - 1],
    heartbeat_period: u16,
    core_clock_hz: u32,
    tick: TickConfig,
    init_poll_limit: u32,
    rx_irq_priority: u8,
    tick_priority: u8,
}

impl NodeConfig {
    pub const fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::new()
    }

    pub const fn timing(&self) -> &BusTiming {
        &self.timing
    }

    pub const fn filter(&self) -> &AcceptanceFilter {
        &self.filter
    }

    pub const fn heartbeat_id(&self) -> Id {
        self.heartbeat_id
    }

    pub const fn heartbeat_pattern(&self) -> [u8; MAX_DATA_LEN - 1] {
        self.heartbeat_pattern
    }

    /// Ticks between two heartbeats (at least one).
    pub const fn heartbeat_period(&self) -> u16 {
        self.heartbeat_period
    }

    pub const fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Tick source setup derived from the core clock and tick frequency.
    pub const fn tick(&self) -> &TickConfig {
        &self.tick
    }

    pub const fn init_poll_limit(&self) -> u32 {
        self.init_poll_limit
    }

    pub const fn rx_irq_priority(&self) -> u8 {
        self.rx_irq_priority
    }

    /// Always numerically above [`rx_irq_priority`](Self::rx_irq_priority).
    pub const fn tick_priority(&self) -> u8 {
        self.tick_priority
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NodeConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "NodeConfig timing={} filter={} heartbeat={} every {=u16} ticks tick={} core={=u32} Hz rx_prio={=u8} tick_prio={=u8}",
            self.timing,
            self.filter,
            crate::can::frame::IdFormat(self.heartbeat_id),
            self.heartbeat_period,
            self.tick,
            self.core_clock_hz,
            self.rx_irq_priority,
            self.tick_priority
        )
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            timing: BusTiming::default(),
            filter: AcceptanceFilter::default(),
            heartbeat_id: Id::Standard(HEARTBEAT_ID),
            heartbeat_pattern: HEARTBEAT_PATTERN,
            heartbeat_period: HEARTBEAT_PERIOD_TICKS,
            core_clock_hz: CORE_CLOCK_HZ,
            tick: TickConfig::from_frequency(CORE_CLOCK_HZ, TickClockSource::AhbDiv8, TICK_HZ),
            init_poll_limit: INIT_POLL_LIMIT,
            rx_irq_priority: RX_IRQ_PRIORITY,
            tick_priority: TICK_PRIORITY,
        }
    }
}

//==================================================================================NODE_CONFIG_BUILDER
/// Fluent builder for [`NodeConfig`], seeded with the defaults above.
#[derive(Clone, Copy, Debug)]
pub struct NodeConfigBuilder {
    timing: BusTimingBuilder,
    filter: AcceptanceFilter,
    heartbeat_id: Id,
    heartbeat_pattern: [u8; MAX_DATA_LEN - 1],
    heartbeat_period: u16,
    core_clock_hz: u32,
    tick_source: TickClockSource,
    tick_hz: u32,
    init_poll_limit: u32,
    rx_irq_priority: u8,
    tick_priority: u8,
}

impl NodeConfigBuilder {
    pub const fn new() -> Self {
        Self {
            timing: BusTimingBuilder::new(),
            filter: AcceptanceFilter::accept_all(0, Fifo::Fifo0),
            heartbeat_id: Id::Standard(HEARTBEAT_ID),
            heartbeat_pattern: HEARTBEAT_PATTERN,
            heartbeat_period: HEARTBEAT_PERIOD_TICKS,
            core_clock_hz: CORE_CLOCK_HZ,
            tick_source: TickClockSource::AhbDiv8,
            tick_hz: TICK_HZ,
            init_poll_limit: INIT_POLL_LIMIT,
            rx_irq_priority: RX_IRQ_PRIORITY,
            tick_priority: TICK_PRIORITY,
        }
    }

    /// Bus timing, validated on [`build`](Self::build).
    pub const fn timing(mut self, timing: BusTimingBuilder) -> Self {
        self.timing = timing;
        self
    }

    pub const fn filter(mut self, filter: AcceptanceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn heartbeat_id(mut self, id: impl Into<Id>) -> Self {
        self.heartbeat_id = id.into();
        self
    }

    /// Payload bytes 1 to 7 of every heartbeat.
    pub const fn heartbeat_pattern(mut self, pattern: [u8; MAX_DATA_LEN - 1]) -> Self {
        self.heartbeat_pattern = pattern;
        self
    }

    pub const fn heartbeat_period(mut self, ticks: u16) -> Self {
        self.heartbeat_period = ticks;
        self
    }

    pub const fn core_clock_hz(mut self, hz: u32) -> Self {
        self.core_clock_hz = hz;
        self
    }

    pub const fn tick_source(mut self, source: TickClockSource) -> Self {
        self.tick_source = source;
        self
    }

    pub const fn tick_hz(mut self, hz: u32) -> Self {
        self.tick_hz = hz;
        self
    }

    /// MSR polls allowed per mode transition (zero is raised to one).
    pub const fn init_poll_limit(mut self, polls: u32) -> Self {
        self.init_poll_limit = polls;
        self
    }

    pub const fn rx_irq_priority(mut self, priority: u8) -> Self {
        self.rx_irq_priority = priority;
        self
    }

    /// Must stay less urgent than the receive interrupt.
    pub const fn tick_priority(mut self, priority: u8) -> Self {
        self.tick_priority = priority;
        self
    }

    /// Validate every field and freeze the configuration.
    pub fn build(self) -> Result<NodeConfig, ConfigError> {
        let timing = self.timing.build()?;

        if self.filter.bank >= FILTER_BANKS {
            return Err(ConfigError::FilterBank {
                bank: self.filter.bank,
            });
        }
        if self.heartbeat_period == 0 {
            return Err(ConfigError::HeartbeatPeriod);
        }
        if self.tick_priority <= self.rx_irq_priority {
            return Err(ConfigError::PriorityInversion {
                rx: self.rx_irq_priority,
                tick: self.tick_priority,
            });
        }
        if self.tick_hz == 0 {
            return Err(ConfigError::TickReload { reload: 0 });
        }
        let tick = TickConfig::from_frequency(self.core_clock_hz, self.tick_source, self.tick_hz);
        if tick.reload == 0 || tick.reload > TickConfig::MAX_RELOAD {
            return Err(ConfigError::TickReload {
                reload: tick.reload,
            });
        }

        Ok(NodeConfig {
            timing,
            filter: self.filter,
            heartbeat_id: self.heartbeat_id,
            heartbeat_pattern: self.heartbeat_pattern,
            heartbeat_period: self.heartbeat_period,
            core_clock_hz: self.core_clock_hz,
            tick,
            init_poll_limit: self.init_poll_limit.max(1),
            rx_irq_priority: self.rx_irq_priority,
            tick_priority: self.tick_priority,
        })
    }
}

impl Default for NodeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimingError;

    #[test]
    /// The default builder reproduces `NodeConfig::default()`.
    fn test_default_builder_matches_default() {
        let config = NodeConfig::builder().build().unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.tick().reload, 9000);
        assert_eq!(config.tick().source, TickClockSource::AhbDiv8);
        assert_eq!(config.heartbeat_period(), 1000);
        assert_eq!(config.heartbeat_id(), Id::Standard(StandardId::ZERO));
        assert_eq!(config.init_poll_limit(), 0xFFFF);
        assert_eq!(config.rx_irq_priority(), 1);
        assert_eq!(config.tick_priority(), 2);
    }

    #[test]
    /// The tick may never preempt the receive interrupt.
    fn test_tick_priority_below_receive() {
        assert_eq!(
            NodeConfig::builder().rx_irq_priority(3).build(),
            Err(ConfigError::PriorityInversion { rx: 3, tick: 2 })
        );
        assert_eq!(
            NodeConfig::builder().tick_priority(1).build(),
            Err(ConfigError::PriorityInversion { rx: 1, tick: 1 })
        );
        let config = NodeConfig::builder()
            .rx_irq_priority(3)
            .tick_priority(4)
            .build()
            .unwrap();
        assert!(config.tick_priority() > config.rx_irq_priority());
    }

    #[test]
    /// Timing errors surface through the configuration error.
    fn test_invalid_timing() {
        let result = NodeConfig::builder()
            .timing(BusTiming::builder().time_segment_2(0))
            .build();
        assert_eq!(
            result,
            Err(ConfigError::Timing(TimingError::TimeSegment2 { value: 0 }))
        );
    }

    #[test]
    /// Filter bank 14 does not exist.
    fn test_invalid_filter_bank() {
        let result = NodeConfig::builder()
            .filter(AcceptanceFilter::accept_all(14, Fifo::Fifo0))
            .build();
        assert_eq!(result, Err(ConfigError::FilterBank { bank: 14 }));
    }

    #[test]
    /// Zero-tick heartbeat period is rejected.
    fn test_zero_heartbeat_period() {
        let result = NodeConfig::builder().heartbeat_period(0).build();
        assert_eq!(result, Err(ConfigError::HeartbeatPeriod));
    }

    #[test]
    /// A 1 Hz tick from the undivided 72 MHz clock overflows the 24-bit counter.
    fn test_tick_reload_out_of_range() {
        let result = NodeConfig::builder()
            .tick_source(TickClockSource::Ahb)
            .tick_hz(1)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::TickReload {
                reload: 72_000_000
            })
        );
        assert_eq!(
            NodeConfig::builder().tick_hz(0).build(),
            Err(ConfigError::TickReload { reload: 0 })
        );
    }

    #[test]
    /// The tick period follows the reload.
    fn test_tick_period() {
        let config = NodeConfig::default();
        assert_eq!(
            config.tick().period(config.core_clock_hz()),
            embassy_time::Duration::from_millis(1)
        );
    }
}
