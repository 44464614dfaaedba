//! Command link transmit task
//!
//! Sends accept/reject/status replies back to the host.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use attendant_protocol::packet::MAX_PACKET_SIZE;

use crate::channels::REPLIES;

/// Link TX task - encodes queued replies
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let reply = REPLIES.receive().await;

        let packet = match reply.to_packet() {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Failed to build reply {:?}: {:?}", reply, e);
                continue;
            }
        };

        let mut buf = [0u8; MAX_PACKET_SIZE];
        match packet.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("Failed to send reply: {:?}", e);
                } else {
                    trace!("Reply sent: {:?}", reply);
                }
            }
            Err(e) => warn!("Failed to encode reply: {:?}", e),
        }
    }
}
