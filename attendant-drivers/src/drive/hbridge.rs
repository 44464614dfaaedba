//! L298N dual H-bridge wheel driver
//!
//! Each side uses one PWM enable pin for speed and two direction inputs:
//!
//! | IN_A | IN_B | motor   |
//! |------|------|---------|
//! | H    | L    | forward |
//! | L    | H    | reverse |
//! | L    | L    | coast   |
//!
//! Speeds are signed, -255..=255, and map linearly to the PWM duty.

use core::cmp::Ordering;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use attendant_core::sequence::{DriveCommand, MAX_SPEED};

use super::WheelDrive;

/// H-bridge errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveError<P, D> {
    /// Enable PWM could not be set
    Pwm(P),
    /// Direction input could not be set
    Pin(D),
}

/// One side of the H-bridge
pub struct HBridgeChannel<PWM, IN> {
    enable: PWM,
    in_a: IN,
    in_b: IN,
    /// Motor mounted mirrored; swap directions
    reversed: bool,
    speed: i16,
}

impl<PWM: SetDutyCycle, IN: OutputPin> HBridgeChannel<PWM, IN> {
    pub fn new(enable: PWM, in_a: IN, in_b: IN) -> Self {
        Self {
            enable,
            in_a,
            in_b,
            reversed: false,
            speed: 0,
        }
    }

    /// Swap forward and reverse for a mirrored motor
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Last speed written
    pub fn speed(&self) -> i16 {
        self.speed
    }

    /// Set a signed speed
    ///
    /// Stopping drops the duty before the direction pins; starting sets
    /// direction first so the motor never spins the wrong way.
    pub fn set_speed(&mut self, speed: i16) -> Result<(), DriveError<PWM::Error, IN::Error>> {
        let speed = speed.clamp(-MAX_SPEED, MAX_SPEED);
        let signed = if self.reversed { -speed } else { speed };
        let magnitude = speed.unsigned_abs();

        match signed.cmp(&0) {
            Ordering::Equal => {
                self.enable
                    .set_duty_cycle_fully_off()
                    .map_err(DriveError::Pwm)?;
                self.in_a.set_low().map_err(DriveError::Pin)?;
                self.in_b.set_low().map_err(DriveError::Pin)?;
            }
            ordering => {
                let forward = ordering == Ordering::Greater;
                self.in_a
                    .set_state(forward.into())
                    .map_err(DriveError::Pin)?;
                self.in_b
                    .set_state((!forward).into())
                    .map_err(DriveError::Pin)?;
                self.enable
                    .set_duty_cycle_fraction(magnitude, MAX_SPEED as u16)
                    .map_err(DriveError::Pwm)?;
            }
        }

        self.speed = speed;
        Ok(())
    }
}

/// Left and right wheels on one L298N
pub struct DifferentialDrive<PWM, IN> {
    left: HBridgeChannel<PWM, IN>,
    right: HBridgeChannel<PWM, IN>,
}

impl<PWM: SetDutyCycle, IN: OutputPin> DifferentialDrive<PWM, IN> {
    pub fn new(left: HBridgeChannel<PWM, IN>, right: HBridgeChannel<PWM, IN>) -> Self {
        Self { left, right }
    }

    /// Last command written
    pub fn command(&self) -> DriveCommand {
        DriveCommand::new(self.left.speed(), self.right.speed())
    }
}

impl<PWM: SetDutyCycle, IN: OutputPin> WheelDrive for DifferentialDrive<PWM, IN> {
    type Error = DriveError<PWM::Error, IN::Error>;

    fn set_speeds(&mut self, command: DriveCommand) -> Result<(), Self::Error> {
        // Attempt both sides even if one fails
        let left = self.left.set_speed(command.left);
        let right = self.right.set_speed(command.right);
        left.and(right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakePin, FakePwm};

    fn channel() -> HBridgeChannel<FakePwm, FakePin> {
        HBridgeChannel::new(FakePwm::default(), FakePin::default(), FakePin::default())
    }

    #[test]
    fn test_forward() {
        let mut ch = channel();
        ch.set_speed(255).unwrap();
        assert!(ch.in_a.high);
        assert!(!ch.in_b.high);
        assert_eq!(ch.enable.duty, 1000);
    }

    #[test]
    fn test_reverse_partial() {
        let mut ch = channel();
        ch.set_speed(-51).unwrap();
        assert!(!ch.in_a.high);
        assert!(ch.in_b.high);
        assert_eq!(ch.enable.duty, 200);
    }

    #[test]
    fn test_stop_coasts() {
        let mut ch = channel();
        ch.set_speed(200).unwrap();
        ch.set_speed(0).unwrap();
        assert!(!ch.in_a.high);
        assert!(!ch.in_b.high);
        assert_eq!(ch.enable.duty, 0);
        assert_eq!(ch.speed(), 0);
    }

    #[test]
    fn test_speed_clamped() {
        let mut ch = channel();
        ch.set_speed(i16::MIN).unwrap();
        assert_eq!(ch.speed(), -255);
        assert_eq!(ch.enable.duty, 1000);
    }

    #[test]
    fn test_reversed_mounting() {
        let mut ch = channel().reversed();
        ch.set_speed(100).unwrap();
        assert!(!ch.in_a.high);
        assert!(ch.in_b.high);
        assert_eq!(ch.speed(), 100);
    }

    #[test]
    fn test_differential_turn() {
        let mut drive = DifferentialDrive::new(channel(), channel());
        drive.set_speeds(DriveCommand::new(-150, 150)).unwrap();

        assert_eq!(drive.command(), DriveCommand::new(-150, 150));
        assert!(drive.left.in_b.high);
        assert!(drive.right.in_a.high);
    }
}
