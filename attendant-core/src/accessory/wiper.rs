//! Front wiper sweep
//!
//! While cleaning, the wiper walks between its limits in fixed degree
//! steps, one step per interval, reversing at each limit.

use crate::config::WiperConfig;

/// Wiper sweep state
#[derive(Debug, Clone)]
pub struct WiperSweep {
    config: WiperConfig,
    angle: u8,
    rising: bool,
    last_step: Option<u64>,
}

impl WiperSweep {
    pub fn new(config: WiperConfig) -> Self {
        Self {
            angle: config.park_angle,
            config,
            rising: true,
            last_step: None,
        }
    }

    /// Current commanded angle
    pub fn angle(&self) -> u8 {
        self.angle
    }

    /// Check if the sweep is running
    pub fn is_running(&self) -> bool {
        self.last_step.is_some()
    }

    /// Begin sweeping from the current angle
    pub fn start(&mut self, now_ms: u64) {
        self.last_step = Some(now_ms);
    }

    /// Stop and return the parked angle
    pub fn park(&mut self) -> u8 {
        self.last_step = None;
        self.rising = true;
        self.angle = self.config.park_angle;
        self.angle
    }

    /// Advance the sweep; returns a new angle when a step was taken
    pub fn update(&mut self, now_ms: u64) -> Option<u8> {
        let last = self.last_step?;
        if now_ms.saturating_sub(last) < self.config.step_interval_ms as u64 {
            return None;
        }
        self.last_step = Some(now_ms);

        let min = self.config.min_angle;
        let max = self.config.max_angle;
        let step = self.config.step_deg;

        if self.rising {
            self.angle = self.angle.saturating_add(step);
            if self.angle >= max {
                self.angle = max;
                self.rising = false;
            }
        } else {
            self.angle = self.angle.saturating_sub(step);
            if self.angle <= min {
                self.angle = min;
                self.rising = true;
            }
        }

        Some(self.angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_started() {
        let mut wiper = WiperSweep::new(WiperConfig::default());
        assert_eq!(wiper.update(1000), None);
        assert!(!wiper.is_running());
    }

    #[test]
    fn test_steps_on_interval() {
        let mut wiper = WiperSweep::new(WiperConfig::default());
        wiper.start(0);
        assert_eq!(wiper.update(10), None);
        assert_eq!(wiper.update(33), Some(3));
        assert_eq!(wiper.update(40), None);
        assert_eq!(wiper.update(66), Some(6));
    }

    #[test]
    fn test_reverses_at_limits() {
        let config = WiperConfig {
            step_deg: 50,
            step_interval_ms: 1,
            min_angle: 0,
            max_angle: 120,
            park_angle: 0,
        };
        let mut wiper = WiperSweep::new(config);
        wiper.start(0);

        let angles: [Option<u8>; 6] = core::array::from_fn(|i| wiper.update(i as u64 + 1));
        assert_eq!(
            angles,
            [Some(50), Some(100), Some(120), Some(70), Some(20), Some(0)]
        );
        assert_eq!(wiper.update(7), Some(50));
    }

    #[test]
    fn test_park() {
        let mut wiper = WiperSweep::new(WiperConfig::default());
        wiper.start(0);
        wiper.update(100);
        assert_eq!(wiper.park(), 0);
        assert!(!wiper.is_running());
        assert_eq!(wiper.update(200), None);
    }
}
