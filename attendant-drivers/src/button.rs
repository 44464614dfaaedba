//! Debounced push buttons
//!
//! Buttons are active-low with pull-ups. A press is reported once, after
//! the input has read pressed for the whole debounce window, and the
//! button must be released before it can fire again.

/// Default debounce window
pub const DEBOUNCE_MS: u64 = 30;

/// Press detector for one button
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    /// When the input first read pressed
    pressed_since: Option<u64>,
    /// Press already reported for this hold
    latched: bool,
}

impl Debouncer {
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pressed_since: None,
            latched: false,
        }
    }

    /// Feed the raw input; returns true once per debounced press
    pub fn update(&mut self, now_ms: u64, pressed: bool) -> bool {
        if !pressed {
            self.pressed_since = None;
            self.latched = false;
            return false;
        }

        let since = *self.pressed_since.get_or_insert(now_ms);
        if !self.latched && now_ms.saturating_sub(since) >= self.window_ms {
            self.latched = true;
            return true;
        }
        false
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_fires_once() {
        let mut button = Debouncer::default();
        let fired: u32 = (0..200u64)
            .map(|t| button.update(t, true) as u32)
            .sum();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_bounce_ignored() {
        let mut button = Debouncer::new(30);
        for t in 0..100u64 {
            // Contact chatter: never stable for 30ms
            assert!(!button.update(t, t % 20 < 10));
        }
    }

    #[test]
    fn test_release_rearms() {
        let mut button = Debouncer::new(10);
        assert!(!button.update(0, true));
        assert!(button.update(10, true));
        assert!(!button.update(20, false));
        assert!(!button.update(30, true));
        assert!(button.update(40, true));
    }
}
