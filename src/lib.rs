//! `can-status-node` library: a `no_std` CAN node that announces a heartbeat
//! once per second and mirrors the low nibble of every received frame onto
//! four status LEDs. The crate exposes the bxCAN driver, the node logic
//! (heartbeat, status reflection, bring-up) and the collaborator traits a
//! board implements to run it.
#![no_std]
//==================================================================================
/// Frames, bit timing, acceptance filtering and the bxCAN controller driver.
pub mod can;
/// Validated node configuration and its defaults.
pub mod config;
/// Error types (timing, initialization, transmission, configuration, halt).
pub mod error;
/// Collaborator traits (registers, GPIO, platform, tick) and the memory-mapped
/// register access.
pub mod infra;
/// Heartbeat, status reflector, LED bank, bring-up and interrupt sharing.
pub mod node;
//==================================================================================
