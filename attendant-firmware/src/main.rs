//! Attendant - Service Robot Firmware
//!
//! Main firmware binary for the RP2040-based service robot: a six-joint
//! arm and a two-wheel base that replay hand-taught routines on a daily
//! timetable, with an ultrasonic obstacle interlock.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use attendant_core::RobotController;
use attendant_drivers::display::{lcd1602, Lcd1602};
use attendant_drivers::drive::{DifferentialDrive, HBridgeChannel};
use attendant_drivers::indicator::{Buzzer, StatusLeds};
use attendant_drivers::rtc::Ds3231;
use attendant_drivers::servo::{Pca9685, Pca9685Config};
use attendant_drivers::ActuatorFacade;
use attendant_hal_rp2040::flash::FlashStorage;

use crate::config::ConfigPersistence;
use crate::tasks::control::Bus;
use crate::tasks::{Buttons, Hardware};

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// I2C bus speed; the PCF8574 display backpack tops out at 100 kHz
const I2C_FREQUENCY_HZ: u32 = 100_000;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Attendant firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Configuration and taught routines from flash
    let flash = FlashStorage::new(p.FLASH, p.DMA_CH0);
    let mut persistence = ConfigPersistence::new(flash);
    let config = persistence.load().await;
    let store = persistence.load_sequences().await;
    let flash = persistence.into_storage();

    // Command link on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud
    let tx_buf = TX_BUF.init([0u8; 128]);
    let rx_buf = RX_BUF.init([0u8; 128]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized for command link");

    // Shared I2C bus (GPIO4 SDA, GPIO5 SCL)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let mut bus: Bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let servos = Pca9685::new(Pca9685Config::default());
    match servos.init(&mut bus, &mut Delay) {
        Ok(()) => info!("Servo expander initialized"),
        Err(e) => error!("Servo expander init failed: {:?}", Debug2Format(&e)),
    }

    let rtc = init_rtc(&mut bus);
    let lcd = init_display(&mut bus);

    // L298N: ENA/ENB on PWM slice 3 (GPIO6/7), IN1-IN4 on GPIO8-11
    let pwm = Pwm::new_output_ab(p.PWM_SLICE3, p.PIN_6, p.PIN_7, pwm::Config::default());
    let (Some(ena), Some(enb)) = pwm.split() else {
        defmt::panic!("PWM slice 3 has no A/B outputs");
    };
    let left = HBridgeChannel::new(
        ena,
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
    );
    let right = HBridgeChannel::new(
        enb,
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
    );
    let actuators = ActuatorFacade::new(servos, DifferentialDrive::new(left, right));
    info!("Drive and servo outputs initialized");

    // Indicator LEDs (GPIO16-18) and buzzer (GPIO19)
    let leds = StatusLeds::new(
        Output::new(p.PIN_16, Level::Low),
        Output::new(p.PIN_17, Level::Low),
        Output::new(p.PIN_18, Level::Low),
    );
    let buzzer = match Buzzer::new(Output::new(p.PIN_19, Level::Low), false) {
        Ok(buzzer) => buzzer,
        Err(e) => match e {},
    };

    // HC-SR04 (GPIO14 TRIG, GPIO15 ECHO)
    let trigger = Output::new(p.PIN_14, Level::Low);
    let echo = Input::new(p.PIN_15, Pull::None);

    // Front-panel buttons (GPIO20-23), active low
    let buttons = Buttons {
        water: Input::new(p.PIN_20, Pull::Up),
        medicine: Input::new(p.PIN_21, Pull::Up),
        help: Input::new(p.PIN_22, Pull::Up),
        cancel: Input::new(p.PIN_23, Pull::Up),
    };

    let mut controller = RobotController::new(config, store);
    if rtc.is_none() {
        warn!("No wall clock, scheduled routines disabled");
        controller.disable_schedule();
    }

    let hardware = Hardware {
        i2c: bus,
        actuators,
        rtc,
        lcd,
        leds,
        buzzer,
    };

    // Spawn tasks
    unwrap!(spawner.spawn(tasks::ranging_task(trigger, echo)));
    unwrap!(spawner.spawn(tasks::link_rx_task(rx)));
    unwrap!(spawner.spawn(tasks::link_tx_task(tx)));
    unwrap!(spawner.spawn(tasks::buttons_task(buttons)));
    unwrap!(spawner.spawn(tasks::storage_task(flash)));
    unwrap!(spawner.spawn(tasks::control_task(controller, hardware)));

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Probe the real-time clock
///
/// A missing clock only disables scheduling; teach and play still work.
fn init_rtc(bus: &mut Bus) -> Option<Ds3231> {
    let rtc = Ds3231::new();
    if let Err(e) = rtc.probe(bus) {
        warn!("RTC not found: {:?}", Debug2Format(&e));
        return None;
    }

    match rtc.lost_power(bus) {
        Ok(true) => warn!("RTC lost power, set the time over the link"),
        Ok(false) => {}
        Err(e) => warn!("RTC status read failed: {:?}", Debug2Format(&e)),
    }

    info!("RTC found");
    Some(rtc)
}

/// Bring up the status display, if one is fitted
fn init_display(bus: &mut Bus) -> Option<Lcd1602> {
    let mut lcd = Lcd1602::new(lcd1602::DEFAULT_ADDRESS);
    match lcd.init(bus, &mut Delay) {
        Ok(()) => {
            info!("Display initialized");
            Some(lcd)
        }
        Err(e) => {
            warn!("Display not found: {:?}", Debug2Format(&e));
            None
        }
    }
}
