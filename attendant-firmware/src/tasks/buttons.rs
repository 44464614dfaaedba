//! Front-panel button task
//!
//! Polls the four active-low buttons and queues a request per debounced
//! press. Button requests get no reply.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant, Ticker};

use attendant_core::mode::ModeKind;
use attendant_core::Request;
use attendant_drivers::button::Debouncer;

use crate::channels::{Inbound, COMMANDS};

/// Button poll period
const POLL_INTERVAL_MS: u64 = 10;

/// Front-panel inputs
pub struct Buttons {
    pub water: Input<'static>,
    pub medicine: Input<'static>,
    pub help: Input<'static>,
    pub cancel: Input<'static>,
}

/// Button task - debounces and forwards presses
#[embassy_executor::task]
pub async fn buttons_task(buttons: Buttons) {
    info!("Buttons task started");

    let inputs = [
        (&buttons.water, Request::Play(ModeKind::Water)),
        (&buttons.medicine, Request::Play(ModeKind::Medicine)),
        (&buttons.help, Request::Help),
        (&buttons.cancel, Request::Stop),
    ];
    let mut debouncers = [
        Debouncer::default(),
        Debouncer::default(),
        Debouncer::default(),
        Debouncer::default(),
    ];

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let start = Instant::now();

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis();

        for ((input, request), debouncer) in inputs.iter().zip(debouncers.iter_mut()) {
            if debouncer.update(now_ms, input.is_low()) {
                debug!("Button: {:?}", request);
                let inbound = Inbound {
                    request: Ok(*request),
                    reply: false,
                };
                if COMMANDS.try_send(inbound).is_err() {
                    warn!("Command channel full, dropping button press");
                }
            }
        }
    }
}
