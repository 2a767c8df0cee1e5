//! Abstraction traits the node is written against (CAN register file, GPIO,
//! clocks and interrupts, periodic tick).
pub mod can_registers;
pub mod gpio_port;
pub mod platform;
pub mod tick_source;
