//! Interrupt-safe home for the running node.
//!
//! The tick and receive handlers preempt the idle loop and may preempt each
//! other. Both reach the node through one blocking mutex, so each handler gets
//! exclusive access for its whole duration and the counters are never observed
//! half-updated. On hardware the mutex is a critical section.
//!
//! ```ignore
//! static NODE: SharedNode<CriticalSectionRawMutex, MmioRegisters, Board> = SharedNode::new();
//!
//! #[exception]
//! fn SysTick() {
//!     NODE.on_tick();
//! }
//! ```
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};

use crate::{
    can::frame::ReceivedFrame,
    infra::traits::{can_registers::CanRegisters, gpio_port::GpioPort},
    node::{heartbeat::HeartbeatEvent, Node},
};

/// Slot holding the node once bring-up succeeded.
pub struct SharedNode<M: RawMutex, R: CanRegisters, G: GpioPort> {
    inner: Mutex<M, RefCell<Option<Node<R, G>>>>,
}

impl<M: RawMutex, R: CanRegisters, G: GpioPort> SharedNode<M, R, G> {
    /// Empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Store `node`, returning the one previously installed.
    pub fn install(&self, node: Node<R, G>) -> Option<Node<R, G>> {
        self.inner.lock(|cell| cell.borrow_mut().replace(node))
    }

    /// Remove the node.
    pub fn take(&self) -> Option<Node<R, G>> {
        self.inner.lock(|cell| cell.borrow_mut().take())
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Run `f` with exclusive access to the node. `None` while the slot is empty.
    pub fn with<T>(&self, f: impl FnOnce(&mut Node<R, G>) -> T) -> Option<T> {
        self.inner.lock(|cell| cell.borrow_mut().as_mut().map(f))
    }

    /// Tick handler. Ticks arriving before installation are ignored.
    pub fn on_tick(&self) -> Option<HeartbeatEvent> {
        self.with(Node::on_tick)
    }

    /// Receive handler.
    pub fn on_rx_pending(&self) -> Option<ReceivedFrame> {
        self.with(Node::on_rx_pending).flatten()
    }
}

impl<M: RawMutex, R: CanRegisters, G: GpioPort> Default for SharedNode<M, R, G> {
    fn default() -> Self {
        Self::new()
    }
}
