//! Robot Command Link Protocol
//!
//! This crate defines the serial protocol between an operator terminal
//! (wireless bridge, pendant or PC) and the robot controller.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary packet format:
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–32B       │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Every command is answered with exactly one reply: accept, reject with a
//! reason code, or a status report.

#![no_std]
#![deny(unsafe_code)]

pub mod messages;
pub mod packet;

pub use messages::{Command, RejectCode, Reply, StatusReport};
pub use packet::{Packet, PacketError, PacketParser, MAX_PAYLOAD_SIZE, PACKET_START};
