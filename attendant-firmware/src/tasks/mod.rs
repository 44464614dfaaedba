//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod buttons;
pub mod control;
pub mod link_rx;
pub mod link_tx;
pub mod ranging;
pub mod storage;

pub use buttons::{buttons_task, Buttons};
pub use control::{control_task, Hardware};
pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use ranging::ranging_task;
pub use storage::storage_task;
