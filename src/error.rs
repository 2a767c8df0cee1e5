//! Error definitions shared across library modules.
//! Each type models one failure scenario of the node: invalid bus timing,
//! a controller that never acknowledges a mode change, an exhausted transmit
//! mailbox bank, or a malformed frame.
use thiserror_no_std::Error;

//==================================================================================TIMING_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A bus timing field lies outside the range the bit timing register can encode.
pub enum TimingError {
    /// Synchronization jump width must be 1 to 4 time quanta.
    #[error("Sync jump width out of range (1..=4): {value}")]
    SyncJumpWidth { value: u8 },
    /// Time segment 1 must be 1 to 16 time quanta.
    #[error("Time segment 1 out of range (1..=16): {value}")]
    TimeSegment1 { value: u8 },
    /// Time segment 2 must be 1 to 8 time quanta.
    #[error("Time segment 2 out of range (1..=8): {value}")]
    TimeSegment2 { value: u8 },
    /// Baud rate prescaler must be 1 to 1024.
    #[error("Prescaler out of range (1..=1024): {value}")]
    Prescaler { value: u16 },
}

//==================================================================================INIT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The controller did not acknowledge a mode transition within the polling bound.
///
/// Both variants are fatal: the node cannot operate without a configured bus.
pub enum InitError {
    /// INAK never went high after requesting initialization mode.
    #[error("Controller did not enter initialization mode after {attempts} polls")]
    EnterInitTimeout { attempts: u32 },
    /// INAK never went low after leaving initialization mode.
    #[error("Controller did not leave initialization mode after {attempts} polls")]
    LeaveInitTimeout { attempts: u32 },
}

//==================================================================================TRANSMIT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised when submitting a frame for transmission.
pub enum TransmitError {
    /// All three hardware mailboxes still hold pending frames.
    #[error("No free transmit mailbox")]
    MailboxFull,
}

//==================================================================================FRAME_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building a classic CAN frame.
pub enum FrameError {
    /// Classic CAN carries at most eight payload bytes.
    #[error("Payload too long for a classic CAN frame: {len} bytes")]
    DataTooLong { len: usize },
    /// Data length code above eight.
    #[error("Invalid data length code: {dlc}")]
    InvalidDlc { dlc: usize },
}

//==================================================================================CONFIG_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors reported by [`NodeConfigBuilder::build`](crate::config::NodeConfigBuilder::build).
pub enum ConfigError {
    /// Bus timing parameters are not encodable.
    #[error(transparent)]
    Timing(#[from] TimingError),
    /// The controller only provides filter banks 0 to 13.
    #[error("Filter bank out of range: {bank}")]
    FilterBank { bank: u8 },
    /// The heartbeat period must be at least one tick.
    #[error("Heartbeat period must be at least one tick")]
    HeartbeatPeriod,
    /// The tick reload does not fit the 24-bit SysTick counter.
    #[error("Tick reload out of range: {reload}")]
    TickReload { reload: u32 },
    /// The tick interrupt would be as urgent as, or more urgent than, the
    /// receive interrupt.
    #[error("Tick priority {tick} must be less urgent than receive priority {rx}")]
    PriorityInversion { rx: u8, tick: u8 },
}

//==================================================================================HALT_REASON
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Why the node stopped permanently.
pub enum HaltReason {
    /// The CAN controller could not be brought into normal operation.
    #[error("CAN bus initialization failed: {0}")]
    BusInit(#[from] InitError),
}
