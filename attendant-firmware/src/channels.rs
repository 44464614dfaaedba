//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use attendant_core::mode::ModeKind;
use attendant_core::safety::RangeReading;
use attendant_core::sequence::RECORD_SIZE;
use attendant_core::{Rejection, Request};
use attendant_protocol::Reply;

/// Channel capacity for inbound requests
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for outbound replies
const REPLY_CHANNEL_SIZE: usize = 8;

/// Channel capacity for pending flash writes (one per routine)
const PERSIST_CHANNEL_SIZE: usize = 4;

/// A request from the link or the front panel
///
/// Link packets that could not be mapped to a request carry the rejection,
/// so their reply is sent in order with the others.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inbound {
    pub request: Result<Request, Rejection>,
    /// Send the result back over the link
    pub reply: bool,
}

/// A routine to write to flash
pub struct PersistRequest {
    pub kind: ModeKind,
    pub record: [u8; RECORD_SIZE],
}

/// Requests for the control task
pub static COMMANDS: Channel<CriticalSectionRawMutex, Inbound, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Replies for the link transmit task
pub static REPLIES: Channel<CriticalSectionRawMutex, Reply, REPLY_CHANNEL_SIZE> = Channel::new();

/// Latest distance reading (updated by the ranging task)
pub static RANGE: Signal<CriticalSectionRawMutex, RangeReading> = Signal::new();

/// Routines to persist (written by the storage task)
pub static PERSIST: Channel<CriticalSectionRawMutex, PersistRequest, PERSIST_CHANNEL_SIZE> =
    Channel::new();
