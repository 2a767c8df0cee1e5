//! Bus timing and operating mode of the controller.
//!
//! A bit is split into time quanta: one synchronization quantum, then time
//! segment 1 and time segment 2, the sample point sitting between them. The
//! prescaler divides the peripheral clock down to the quantum frequency:
//!
//! ```text
//! bit rate = f_clk / (prescaler * (1 + ts1 + ts2))
//! ```
//!
//! The numbers are configuration: nothing here checks them against a target
//! bit rate, [`BusTiming::bit_rate`] only reports the result.
use crate::error::TimingError;

/// Default synchronization jump width (1 tq).
pub const DEFAULT_SJW: u8 = 1;
/// Default time segment 1 (3 tq).
pub const DEFAULT_TS1: u8 = 3;
/// Default time segment 2 (4 tq).
pub const DEFAULT_TS2: u8 = 4;
/// Default baud rate prescaler.
pub const DEFAULT_PRESCALER: u16 = 12;
/// Default mode: automatic bus-off management only.
pub const DEFAULT_MODE_FLAGS: ModeFlags = ModeFlags {
    time_triggered: false,
    auto_bus_off: true,
    auto_wakeup: false,
    no_auto_retransmit: false,
    receive_fifo_locked: false,
    transmit_fifo_priority: false,
};

//==================================================================================MODE_FLAGS
/// Operating mode bits written to MCR during initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeFlags {
    /// TTCM: time triggered communication.
    pub time_triggered: bool,
    /// ABOM: leave bus-off automatically after 128 × 11 recessive bits.
    pub auto_bus_off: bool,
    /// AWUM: wake up on bus activity.
    pub auto_wakeup: bool,
    /// NART: send each frame once, regardless of the outcome.
    pub no_auto_retransmit: bool,
    /// RFLM: a full FIFO discards new frames instead of overwriting the last one.
    pub receive_fifo_locked: bool,
    /// TXFP: mailbox priority follows request order instead of identifier.
    pub transmit_fifo_priority: bool,
}

impl ModeFlags {
    const TTCM: u32 = 1 << 7;
    const ABOM: u32 = 1 << 6;
    const AWUM: u32 = 1 << 5;
    const NART: u32 = 1 << 4;
    const RFLM: u32 = 1 << 3;
    const TXFP: u32 = 1 << 2;

    /// Every MCR bit this type controls.
    pub const MCR_MASK: u32 =
        Self::TTCM | Self::ABOM | Self::AWUM | Self::NART | Self::RFLM | Self::TXFP;

    /// MCR bits encoding these flags.
    pub const fn mcr_bits(&self) -> u32 {
        let mut bits = 0;
        if self.time_triggered {
            bits |= Self::TTCM;
        }
        if self.auto_bus_off {
            bits |= Self::ABOM;
        }
        if self.auto_wakeup {
            bits |= Self::AWUM;
        }
        if self.no_auto_retransmit {
            bits |= Self::NART;
        }
        if self.receive_fifo_locked {
            bits |= Self::RFLM;
        }
        if self.transmit_fifo_priority {
            bits |= Self::TXFP;
        }
        bits
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        DEFAULT_MODE_FLAGS
    }
}

//==================================================================================BUS_TIMING
/// Validated bit timing plus mode flags. Fixed once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    sjw: u8,
    ts1: u8,
    ts2: u8,
    prescaler: u16,
    flags: ModeFlags,
}

impl BusTiming {
    /// Create a builder seeded with the default timing.
    pub const fn builder() -> BusTimingBuilder {
        BusTimingBuilder::new()
    }

    pub const fn sjw(&self) -> u8 {
        self.sjw
    }

    pub const fn ts1(&self) -> u8 {
        self.ts1
    }

    pub const fn ts2(&self) -> u8 {
        self.ts2
    }

    pub const fn prescaler(&self) -> u16 {
        self.prescaler
    }

    pub const fn flags(&self) -> ModeFlags {
        self.flags
    }

    /// Time quanta per bit (sync segment included).
    pub const fn quanta_per_bit(&self) -> u32 {
        1 + self.ts1 as u32 + self.ts2 as u32
    }

    /// Resulting bit rate for a peripheral clock of `clock_hz`.
    pub const fn bit_rate(&self, clock_hz: u32) -> u32 {
        clock_hz / (self.prescaler as u32 * self.quanta_per_bit())
    }

    /// BTR value: SJW[25:24], TS2[22:20], TS1[19:16], BRP[9:0], each stored minus one.
    pub const fn btr(&self) -> u32 {
        ((self.sjw as u32 - 1) << 24)
            | ((self.ts2 as u32 - 1) << 20)
            | ((self.ts1 as u32 - 1) << 16)
            | (self.prescaler as u32 - 1)
    }
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            sjw: DEFAULT_SJW,
            ts1: DEFAULT_TS1,
            ts2: DEFAULT_TS2,
            prescaler: DEFAULT_PRESCALER,
            flags: DEFAULT_MODE_FLAGS,
        }
    }
}

//==================================================================================BUS_TIMING_BUILDER
/// Fluent builder validating every field on [`build`](Self::build).
#[derive(Clone, Copy, Debug)]
pub struct BusTimingBuilder {
    sjw: u8,
    ts1: u8,
    ts2: u8,
    prescaler: u16,
    flags: ModeFlags,
}

impl BusTimingBuilder {
    /// Start from SJW 1, TS1 3, TS2 4, prescaler 12 and automatic bus-off management.
    pub const fn new() -> Self {
        Self {
            sjw: DEFAULT_SJW,
            ts1: DEFAULT_TS1,
            ts2: DEFAULT_TS2,
            prescaler: DEFAULT_PRESCALER,
            flags: DEFAULT_MODE_FLAGS,
        }
    }

    pub const fn sync_jump_width(mut self, tq: u8) -> Self {
        self.sjw = tq;
        self
    }

    pub const fn time_segment_1(mut self, tq: u8) -> Self {
        self.ts1 = tq;
        self
    }

    pub const fn time_segment_2(mut self, tq: u8) -> Self {
        self.ts2 = tq;
        self
    }

    /// Baud rate prescaler as the actual divider (the register stores it minus one).
    pub const fn prescaler(mut self, prescaler: u16) -> Self {
        self.prescaler = prescaler;
        self
    }

    /// Replace all mode flags at once.
    pub const fn mode_flags(mut self, flags: ModeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn time_triggered(mut self, enabled: bool) -> Self {
        self.flags.time_triggered = enabled;
        self
    }

    pub const fn auto_bus_off(mut self, enabled: bool) -> Self {
        self.flags.auto_bus_off = enabled;
        self
    }

    pub const fn auto_wakeup(mut self, enabled: bool) -> Self {
        self.flags.auto_wakeup = enabled;
        self
    }

    pub const fn no_auto_retransmit(mut self, enabled: bool) -> Self {
        self.flags.no_auto_retransmit = enabled;
        self
    }

    pub const fn receive_fifo_locked(mut self, enabled: bool) -> Self {
        self.flags.receive_fifo_locked = enabled;
        self
    }

    pub const fn transmit_fifo_priority(mut self, enabled: bool) -> Self {
        self.flags.transmit_fifo_priority = enabled;
        self
    }

    /// Check ranges and freeze the timing.
    pub fn build(self) -> Result<BusTiming, TimingError> {
        if !(1..=4).contains(&self.sjw) {
            return Err(TimingError::SyncJumpWidth { value: self.sjw });
        }
        if !(1..=16).contains(&self.ts1) {
            return Err(TimingError::TimeSegment1 { value: self.ts1 });
        }
        if !(1..=8).contains(&self.ts2) {
            return Err(TimingError::TimeSegment2 { value: self.ts2 });
        }
        if !(1..=1024).contains(&self.prescaler) {
            return Err(TimingError::Prescaler {
                value: self.prescaler,
            });
        }
        Ok(BusTiming {
            sjw: self.sjw,
            ts1: self.ts1,
            ts2: self.ts2,
            prescaler: self.prescaler,
            flags: self.flags,
        })
    }
}

impl Default for BusTimingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
