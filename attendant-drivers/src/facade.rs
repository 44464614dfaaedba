//! Actuator facade
//!
//! Turns commanded targets into hardware writes: arm joints and the wiper
//! through the servo expander, wheel speeds through the H-bridge. Only
//! channels whose value changed are written. Wheels are written before
//! the arm so a halt takes effect before any slower I2C traffic.

use embedded_hal::i2c::I2c;

use attendant_core::sequence::{ActuatorTargets, DriveCommand, AXIS_COUNT, WIPER_CHANNEL};

use crate::drive::WheelDrive;
use crate::servo::{Pca9685, ServoError};

/// Facade errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FacadeError<S, W> {
    Servo(ServoError<S>),
    Wheels(W),
}

/// Arm, wiper and wheels behind one interface
pub struct ActuatorFacade<W> {
    servos: Pca9685,
    wheels: W,
    written: Option<ActuatorTargets>,
    wiper: Option<u8>,
}

impl<W: WheelDrive> ActuatorFacade<W> {
    pub fn new(servos: Pca9685, wheels: W) -> Self {
        Self {
            servos,
            wheels,
            written: None,
            wiper: None,
        }
    }

    /// Targets as last written to hardware
    pub fn written(&self) -> Option<&ActuatorTargets> {
        self.written.as_ref()
    }

    /// Write the changed parts of `targets`
    ///
    /// Returns how many outputs were written. After a failure the next
    /// call rewrites everything.
    pub fn apply<I: I2c>(
        &mut self,
        i2c: &mut I,
        targets: &ActuatorTargets,
    ) -> Result<usize, FacadeError<I::Error, W::Error>> {
        let previous = self.written.take();
        let mut count = 0;

        if previous.map(|p| p.drive) != Some(targets.drive) {
            self.wheels
                .set_speeds(targets.drive)
                .map_err(FacadeError::Wheels)?;
            count += 1;
        }

        for channel in 0..AXIS_COUNT {
            let angle = targets.angles[channel];
            if previous.map(|p| p.angles[channel]) != Some(angle) {
                self.servos
                    .set_angle(i2c, channel as u8, angle)
                    .map_err(FacadeError::Servo)?;
                count += 1;
            }
        }

        self.written = Some(*targets);
        Ok(count)
    }

    /// Move the wiper servo
    pub fn set_wiper<I: I2c>(&mut self, i2c: &mut I, angle: u8) -> Result<(), ServoError<I::Error>> {
        if self.wiper == Some(angle) {
            return Ok(());
        }
        self.wiper = None;
        self.servos.set_angle(i2c, WIPER_CHANNEL, angle)?;
        self.wiper = Some(angle);
        Ok(())
    }

    /// Stop the wheels without touching the bus
    pub fn halt(&mut self) -> Result<(), W::Error> {
        if let Some(written) = self.written.as_mut() {
            written.drive = DriveCommand::STOP;
        }
        self.wheels.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeI2c;
    use crate::servo::Pca9685Config;

    #[derive(Default)]
    struct FakeWheels {
        last: Option<DriveCommand>,
        calls: u32,
        fail: bool,
    }

    impl WheelDrive for FakeWheels {
        type Error = ();

        fn set_speeds(&mut self, command: DriveCommand) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.last = Some(command);
            self.calls += 1;
            Ok(())
        }
    }

    fn facade() -> ActuatorFacade<FakeWheels> {
        ActuatorFacade::new(Pca9685::new(Pca9685Config::default()), FakeWheels::default())
    }

    #[test]
    fn test_first_apply_writes_everything() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();

        let n = facade
            .apply(&mut bus, &ActuatorTargets::at_pose([90; AXIS_COUNT]))
            .unwrap();

        assert_eq!(n, AXIS_COUNT + 1);
        assert_eq!(bus.writes.len(), AXIS_COUNT);
        assert_eq!(facade.wheels.last, Some(DriveCommand::STOP));
    }

    #[test]
    fn test_only_changes_written() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();
        let mut targets = ActuatorTargets::at_pose([90; AXIS_COUNT]);
        facade.apply(&mut bus, &targets).unwrap();
        bus.writes.clear();

        targets.angles[4] = 10;
        assert_eq!(facade.apply(&mut bus, &targets), Ok(1));
        assert_eq!(bus.writes.len(), 1);
        assert_eq!(bus.writes[0].1[0], 0x06 + 4 * 4);
        assert_eq!(facade.wheels.calls, 1);

        targets.drive = DriveCommand::new(200, 200);
        assert_eq!(facade.apply(&mut bus, &targets), Ok(1));
        assert_eq!(facade.wheels.calls, 2);

        assert_eq!(facade.apply(&mut bus, &targets), Ok(0));
    }

    #[test]
    fn test_failure_forces_full_rewrite() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();
        let targets = ActuatorTargets::at_pose([45; AXIS_COUNT]);
        facade.apply(&mut bus, &targets).unwrap();

        bus.fail = true;
        let mut moved = targets;
        moved.angles[0] = 50;
        assert!(matches!(
            facade.apply(&mut bus, &moved),
            Err(FacadeError::Servo(ServoError::Bus(_)))
        ));
        assert!(facade.written().is_none());

        bus.fail = false;
        assert_eq!(facade.apply(&mut bus, &moved), Ok(AXIS_COUNT + 1));
    }

    #[test]
    fn test_wheel_failure_reported() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();
        facade.wheels.fail = true;
        assert_eq!(
            facade.apply(&mut bus, &ActuatorTargets::at_pose([0; AXIS_COUNT])),
            Err(FacadeError::Wheels(()))
        );
    }

    #[test]
    fn test_wiper_on_its_own_channel() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();

        facade.set_wiper(&mut bus, 0).unwrap();
        facade.set_wiper(&mut bus, 0).unwrap();
        facade.set_wiper(&mut bus, 3).unwrap();

        assert_eq!(bus.writes.len(), 2);
        assert_eq!(bus.writes[1].1[0], 0x06 + 4 * WIPER_CHANNEL);
    }

    #[test]
    fn test_halt_stops_wheels() {
        let mut facade = facade();
        let mut bus = FakeI2c::default();
        let mut targets = ActuatorTargets::at_pose([90; AXIS_COUNT]);
        targets.drive = DriveCommand::new(150, -150);
        facade.apply(&mut bus, &targets).unwrap();

        facade.halt().unwrap();
        assert_eq!(facade.wheels.last, Some(DriveCommand::STOP));
        assert_eq!(facade.written().unwrap().drive, DriveCommand::STOP);
    }
}
