//! Command link receive task
//!
//! Parses packets from the host and queues them for the control loop.
//! Packets that decode but carry an unknown verb or argument are queued as
//! rejections, so the control loop answers every packet in arrival order.
//! Corrupt packets are dropped so the host times out.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use attendant_core::Request;
use attendant_protocol::{Packet, PacketParser};

use crate::channels::{Inbound, COMMANDS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Link RX task - receives and parses packets from the host
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = PacketParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(packet)) => handle_packet(&packet).await,
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Packet error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Queue a packet for the control loop
///
/// Waits for room rather than dropping; the UART buffer holds further
/// bytes meanwhile.
async fn handle_packet(packet: &Packet) {
    let request = Request::from_packet(packet);
    match request {
        Ok(request) => debug!("Command: {:?}", request),
        Err(rejection) => warn!("Unusable command: {:?}", rejection),
    }

    COMMANDS.send(Inbound { request, reply: true }).await;
}
