//! Help alert beep pattern
//!
//! The buzzer state is a pure function of the time since the alert began:
//! each period is `on_ms` of tone followed by `off_ms` of silence, repeated
//! `beeps` times.

use crate::config::AlertConfig;

/// Buzzer output for one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertTone {
    /// Buzzer on
    On,
    /// Buzzer off, pattern still running
    Off,
    /// Pattern complete
    Finished,
}

/// Running help alert
#[derive(Debug, Clone)]
pub struct HelpAlert {
    config: AlertConfig,
    started_at: Option<u64>,
}

impl HelpAlert {
    pub const fn new(config: AlertConfig) -> Self {
        Self {
            config,
            started_at: None,
        }
    }

    /// Check if the pattern is running
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start (or restart) the pattern
    pub fn start(&mut self, now_ms: u64) {
        self.started_at = Some(now_ms);
    }

    /// Stop the pattern early
    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    /// Buzzer state at `now_ms`
    pub fn poll(&mut self, now_ms: u64) -> AlertTone {
        let Some(started) = self.started_at else {
            return AlertTone::Finished;
        };

        let period = (self.config.on_ms as u64 + self.config.off_ms as u64).max(1);
        let elapsed = now_ms.saturating_sub(started);

        if elapsed / period >= self.config.beeps as u64 {
            self.started_at = None;
            return AlertTone::Finished;
        }

        if elapsed % period < self.config.on_ms as u64 {
            AlertTone::On
        } else {
            AlertTone::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern() {
        let mut alert = HelpAlert::new(AlertConfig::default());
        alert.start(1000);

        assert_eq!(alert.poll(1000), AlertTone::On);
        assert_eq!(alert.poll(1149), AlertTone::On);
        assert_eq!(alert.poll(1150), AlertTone::Off);
        assert_eq!(alert.poll(1449), AlertTone::Off);
        assert_eq!(alert.poll(1450), AlertTone::On);

        // 10 beeps x 450ms
        assert_eq!(alert.poll(1000 + 4499), AlertTone::Off);
        assert_eq!(alert.poll(1000 + 4500), AlertTone::Finished);
        assert!(!alert.is_running());
    }

    #[test]
    fn test_count_beeps() {
        let config = AlertConfig {
            beeps: 3,
            on_ms: 10,
            off_ms: 10,
        };
        let mut alert = HelpAlert::new(config);
        alert.start(0);

        let mut rising = 0;
        let mut last = AlertTone::Off;
        for now in 0..200 {
            let tone = alert.poll(now);
            if tone == AlertTone::On && last != AlertTone::On {
                rising += 1;
            }
            last = tone;
        }
        assert_eq!(rising, 3);
    }

    #[test]
    fn test_cancel() {
        let mut alert = HelpAlert::new(AlertConfig::default());
        alert.start(0);
        alert.cancel();
        assert_eq!(alert.poll(10), AlertTone::Finished);
    }
}
