/// Test doubles emulating the bxCAN peripheral and the board collaborators
/// during integration tests.
use can_status_node::{
    can::frame::{CanFrame, IdReg},
    config::NodePins,
    infra::traits::{
        can_registers::{CanRegisters, Register},
        gpio_port::{GpioPort, PinDirection, PinMode},
        platform::{Irq, Peripheral, Platform},
        tick_source::{TickConfig, TickSource},
    },
    node::shared::SharedNode,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_can::Frame;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

const MCR_INRQ: u32 = 1 << 0;
const MCR_SLEEP: u32 = 1 << 1;
const MSR_INAK: u32 = 1 << 0;
const MSR_SLAK: u32 = 1 << 1;
const TSR_TME_SHIFT: u32 = 26;
const RFR_RFOM: u32 = 1 << 5;

//==================================================================================FAKE_CAN
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Mode transition the emulated controller refuses to acknowledge.
pub enum Stuck {
    /// INAK never rises.
    EnterInit,
    /// INAK never falls.
    LeaveInit,
}

#[derive(Default)]
/// Raw state behind a [`FakeCan`] handle.
pub struct CanState {
    regs: HashMap<Register, u32>,
    pub stuck: Option<Stuck>,
    /// Mailboxes still holding a frame the "bus" has not taken.
    pub pending: [bool; 3],
    /// When set, queued frames stay in their mailbox forever.
    pub bus_jammed: bool,
    pub sent: Vec<CanFrame>,
    rx: [VecDeque<[u32; 4]>; 2],
    pub releases: [usize; 2],
    /// Every register write, in order.
    pub writes: Vec<(Register, u32)>,
}

impl CanState {
    fn msr(&self) -> u32 {
        self.regs.get(&Register::Msr).copied().unwrap_or(MSR_SLAK)
    }

    fn update_msr(&mut self, mcr: u32) {
        let current = self.msr();
        let msr = match self.stuck {
            Some(Stuck::EnterInit) => current & !MSR_INAK,
            Some(Stuck::LeaveInit) if mcr & MCR_INRQ != 0 => MSR_INAK,
            Some(Stuck::LeaveInit) => current,
            None if mcr & MCR_INRQ != 0 => MSR_INAK,
            None if mcr & MCR_SLEEP != 0 => MSR_SLAK,
            None => 0,
        };
        self.regs.insert(Register::Msr, msr);
    }

    fn queue(&mut self, mailbox: u8, tir: u32) {
        let dlc = self.regs.get(&Register::Tdtr(mailbox)).copied().unwrap_or(0) as usize & 0x0F;
        let low = self.regs.get(&Register::Tdlr(mailbox)).copied().unwrap_or(0);
        let high = self.regs.get(&Register::Tdhr(mailbox)).copied().unwrap_or(0);
        let id = IdReg::from_register(tir);
        let frame = if id.is_remote() {
            CanFrame::new_remote(id.id(), dlc)
        } else {
            let mut data = [0u8; 8];
            data[..4].copy_from_slice(&low.to_le_bytes());
            data[4..].copy_from_slice(&high.to_le_bytes());
            CanFrame::new(id.id(), &data[..dlc.min(8)])
        };
        self.sent.push(frame.expect("mailbox holds a valid frame"));
        if self.bus_jammed {
            self.pending[mailbox as usize] = true;
        }
    }
}

#[derive(Clone, Default)]
/// Register-level bxCAN emulator. Clones share the same peripheral.
pub struct FakeCan {
    state: Arc<Mutex<CanState>>,
}

#[allow(dead_code)]
impl FakeCan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that never acknowledges `stuck`.
    pub fn stuck(stuck: Stuck) -> Self {
        let fake = Self::new();
        fake.state().stuck = Some(stuck);
        if stuck == Stuck::LeaveInit {
            fake.state().regs.insert(Register::Msr, MSR_INAK);
        }
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, CanState> {
        self.state.lock().expect("fake CAN poisoned")
    }

    /// Keep every queued frame in its mailbox.
    pub fn jam(&self) {
        self.state().bus_jammed = true;
    }

    /// Let the bus take every pending frame.
    pub fn unjam(&self) {
        let mut state = self.state();
        state.bus_jammed = false;
        state.pending = [false; 3];
    }

    /// Land `frame` in `fifo` as if filter `filter_index` accepted it.
    pub fn inject(&self, fifo: usize, frame: &CanFrame, filter_index: u8) {
        let data = frame.raw_data();
        let words = [
            frame.id_reg().0,
            frame.dlc() as u32 | (filter_index as u32) << 8,
            u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        ];
        self.state().rx[fifo].push_back(words);
    }

    pub fn sent(&self) -> Vec<CanFrame> {
        self.state().sent.clone()
    }

    pub fn releases(&self, fifo: usize) -> usize {
        self.state().releases[fifo]
    }

    pub fn register(&self, reg: Register) -> u32 {
        self.state().regs.get(&reg).copied().unwrap_or(0)
    }

    /// Whether any write touched `reg`.
    pub fn written(&self, reg: Register) -> bool {
        self.state().writes.iter().any(|(r, _)| *r == reg)
    }
}

impl CanRegisters for FakeCan {
    fn read(&self, reg: Register) -> u32 {
        let state = self.state();
        match reg {
            Register::Msr => state.msr(),
            Register::Tsr => state
                .pending
                .iter()
                .enumerate()
                .filter(|(_, pending)| !**pending)
                .fold(0, |tsr, (mb, _)| tsr | 1 << (TSR_TME_SHIFT + mb as u32)),
            Register::Rfr(fifo) => state.rx[fifo as usize].len().min(3) as u32,
            Register::Rir(fifo) => state.rx[fifo as usize].front().map_or(0, |w| w[0]),
            Register::Rdtr(fifo) => state.rx[fifo as usize].front().map_or(0, |w| w[1]),
            Register::Rdlr(fifo) => state.rx[fifo as usize].front().map_or(0, |w| w[2]),
            Register::Rdhr(fifo) => state.rx[fifo as usize].front().map_or(0, |w| w[3]),
            other => state.regs.get(&other).copied().unwrap_or(0),
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let mut state = self.state();
        state.writes.push((reg, value));
        match reg {
            Register::Mcr => {
                state.regs.insert(reg, value);
                state.update_msr(value);
            }
            Register::Rfr(fifo) if value & RFR_RFOM != 0 => {
                state.releases[fifo as usize] += 1;
                state.rx[fifo as usize].pop_front();
            }
            Register::Tir(mb) if value & IdReg::TXRQ != 0 => {
                state.regs.insert(reg, value);
                state.queue(mb, value);
            }
            _ => {
                state.regs.insert(reg, value);
            }
        }
    }
}

//==================================================================================GPIO
/// Pin on the emulated board: port letter and number.
pub type Pin = (char, u8);

/// LED0 PA6, LED1 PA7, LED2 PB0, LED3 PB1, CAN RX PA11, CAN TX PA12.
#[allow(dead_code)]
pub const PINS: NodePins<Pin> = NodePins {
    leds: [('A', 6), ('A', 7), ('B', 0), ('B', 1)],
    can_rx: ('A', 11),
    can_tx: ('A', 12),
};

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioOp {
    Set(Pin),
    Clear(Pin),
    Configure(Pin, PinDirection, PinMode),
}

#[derive(Default)]
pub struct GpioState {
    pub levels: HashMap<Pin, bool>,
    pub ops: Vec<GpioOp>,
}

#[derive(Clone, Default)]
/// GPIO double recording every operation. Clones share the same record.
pub struct RecordingGpio {
    state: Arc<Mutex<GpioState>>,
}

#[allow(dead_code)]
impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, GpioState> {
        self.state.lock().expect("fake GPIO poisoned")
    }

    /// Last level of `pin`, `None` if never written.
    pub fn level(&self, pin: Pin) -> Option<bool> {
        self.state().levels.get(&pin).copied()
    }

    /// Levels of the four LED lines, `true` meaning high (LED off).
    pub fn leds(&self) -> [Option<bool>; 4] {
        PINS.leds.map(|pin| self.level(pin))
    }

    pub fn ops(&self) -> Vec<GpioOp> {
        self.state().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state().ops.clear();
    }
}

impl GpioPort for RecordingGpio {
    type Pin = Pin;

    fn set(&mut self, pin: Pin) {
        let mut state = self.state();
        state.levels.insert(pin, true);
        state.ops.push(GpioOp::Set(pin));
    }

    fn clear(&mut self, pin: Pin) {
        let mut state = self.state();
        state.levels.insert(pin, false);
        state.ops.push(GpioOp::Clear(pin));
    }

    fn configure(&mut self, pin: Pin, direction: PinDirection, mode: PinMode) {
        self.state()
            .ops
            .push(GpioOp::Configure(pin, direction, mode));
    }

    fn port_clock(&self, pin: Pin) -> Peripheral {
        match pin.0 {
            'A' => Peripheral::GpioA,
            'B' => Peripheral::GpioB,
            _ => Peripheral::GpioC,
        }
    }
}

//==================================================================================PLATFORM
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    SystemClock,
    EnableClock(Peripheral),
    Reset(Peripheral),
    Priority(Irq, u8),
    EnableIrq(Irq),
}

#[derive(Default)]
/// Platform double recording every call in order.
pub struct RecordingPlatform {
    pub calls: Vec<PlatformCall>,
}

#[allow(dead_code)]
impl RecordingPlatform {
    pub fn position(&self, call: PlatformCall) -> Option<usize> {
        self.calls.iter().position(|c| *c == call)
    }
}

impl Platform for RecordingPlatform {
    fn configure_system_clock(&mut self) {
        self.calls.push(PlatformCall::SystemClock);
    }

    fn enable_clock(&mut self, peripheral: Peripheral) {
        self.calls.push(PlatformCall::EnableClock(peripheral));
    }

    fn reset_peripheral(&mut self, peripheral: Peripheral) {
        self.calls.push(PlatformCall::Reset(peripheral));
    }

    fn set_priority(&mut self, irq: Irq, priority: u8) {
        self.calls.push(PlatformCall::Priority(irq, priority));
    }

    fn enable_irq(&mut self, irq: Irq) {
        self.calls.push(PlatformCall::EnableIrq(irq));
    }
}

//==================================================================================TICK
#[derive(Default)]
/// Tick source double: remembers how it was started.
pub struct FakeTick {
    pub started: Option<TickConfig>,
    pub priority: Option<u8>,
}

impl TickSource for FakeTick {
    fn set_priority(&mut self, priority: u8) {
        self.priority = Some(priority);
    }

    fn start(&mut self, config: &TickConfig) {
        self.started = Some(*config);
    }
}

//==================================================================================SLOT
/// Node slot shared by the emulated interrupt handlers.
#[allow(dead_code)]
pub type Slot = SharedNode<CriticalSectionRawMutex, FakeCan, RecordingGpio>;
