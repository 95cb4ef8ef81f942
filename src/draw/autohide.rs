use std::time::{Duration, Instant};

pub const HIDE_DELAY: Duration = Duration::from_millis(3000);
pub const FADE_DURATION: Duration = Duration::from_millis(500);
pub const HIDDEN_OPACITY: f32 = 0.3;

const FADE_FRAME: Duration = Duration::from_millis(16);

/// Inactivity fade for the toolbar.
///
/// A single-shot timer is armed at construction and re-armed by every
/// [`touch`](AutoHide::touch). Opacity is derived from the elapsed time, so a
/// touch in the middle of a fade restores full opacity immediately.
#[derive(Debug, Clone, Copy)]
pub struct AutoHide {
    enabled: bool,
    last_touch: Instant,
}

impl AutoHide {
    pub fn new(enabled: bool, now: Instant) -> Self {
        Self {
            enabled,
            last_touch: now,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if self.enabled != enabled {
            tracing::debug!(from = self.enabled, to = enabled, "toolbar auto-hide updated");
        }
        self.enabled = enabled;
        self.last_touch = now;
    }

    /// Cancels any fade and restarts the hide timer.
    pub fn touch(&mut self, now: Instant) {
        self.last_touch = now;
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        let idle = now.saturating_duration_since(self.last_touch);
        let Some(fading) = idle.checked_sub(HIDE_DELAY) else {
            return 1.0;
        };
        if fading >= FADE_DURATION {
            return HIDDEN_OPACITY;
        }
        let t = fading.as_secs_f32() / FADE_DURATION.as_secs_f32();
        1.0 - (1.0 - HIDDEN_OPACITY) * t
    }

    /// How long the UI can sleep before the opacity changes again.
    pub fn next_change_in(&self, now: Instant) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let idle = now.saturating_duration_since(self.last_touch);
        if idle < HIDE_DELAY {
            Some(HIDE_DELAY - idle)
        } else if idle < HIDE_DELAY + FADE_DURATION {
            Some(FADE_FRAME)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_opaque_until_the_delay_expires() {
        let start = Instant::now();
        let hide = AutoHide::new(true, start);
        assert_eq!(hide.opacity(start), 1.0);
        assert_eq!(hide.opacity(start + Duration::from_millis(2999)), 1.0);
        assert_eq!(hide.next_change_in(start), Some(HIDE_DELAY));
    }

    #[test]
    fn fades_to_hidden_opacity() {
        let start = Instant::now();
        let hide = AutoHide::new(true, start);
        let mid = hide.opacity(start + HIDE_DELAY + Duration::from_millis(250));
        assert!((mid - 0.65).abs() < 1e-4, "mid fade opacity {mid}");
        assert_eq!(hide.opacity(start + HIDE_DELAY + FADE_DURATION), HIDDEN_OPACITY);
        assert_eq!(hide.opacity(start + Duration::from_secs(60)), HIDDEN_OPACITY);
        assert_eq!(hide.next_change_in(start + Duration::from_secs(60)), None);
    }

    #[test]
    fn touch_mid_fade_restores_full_opacity() {
        let start = Instant::now();
        let mut hide = AutoHide::new(true, start);
        let during_fade = start + HIDE_DELAY + Duration::from_millis(100);
        assert!(hide.opacity(during_fade) < 1.0);

        hide.touch(during_fade);
        assert_eq!(hide.opacity(during_fade), 1.0);
        assert_eq!(hide.opacity(during_fade + Duration::from_millis(2500)), 1.0);
    }

    #[test]
    fn disabled_auto_hide_keeps_toolbar_opaque() {
        let start = Instant::now();
        let hide = AutoHide::new(false, start);
        assert_eq!(hide.opacity(start + Duration::from_secs(10)), 1.0);
        assert_eq!(hide.next_change_in(start), None);
    }
}
