//! Manual double-click detection.
//!
//! Hosts that rebuild the header or cell elements between clicks can lose
//! native double-click delivery, so the grid detects double-clicks itself
//! from press timestamps and positions.

use crate::geometry::Point;
use crate::input::MouseButton;

#[derive(Debug, Clone, Copy)]
struct Click {
    position: Point,
    button: MouseButton,
    timestamp_ms: f64,
}

/// Detects double-clicks within a distance and time window.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    max_distance: f32,
    max_interval_ms: f64,
    last_press: Option<Click>,
    /// When the last manual double-click was detected.
    last_double_ms: Option<f64>,
}

impl ClickTracker {
    pub fn new(max_distance: f32, max_interval_ms: f64) -> Self {
        Self {
            max_distance,
            max_interval_ms,
            last_press: None,
            last_double_ms: None,
        }
    }

    /// Record a press. Returns `true` if it completes a double-click.
    pub fn press(&mut self, position: Point, button: MouseButton, timestamp_ms: f64) -> bool {
        let is_double = self.last_press.is_some_and(|last| {
            last.button == button
                && timestamp_ms - last.timestamp_ms <= self.max_interval_ms
                && last.position.distance_to(position) <= self.max_distance
        });

        if is_double {
            // A third press starts a new sequence.
            self.last_press = None;
            self.last_double_ms = Some(timestamp_ms);
        } else {
            self.last_press = Some(Click {
                position,
                button,
                timestamp_ms,
            });
        }
        is_double
    }

    /// Whether a host double-click at `timestamp_ms` duplicates one already
    /// detected. Consumes the detection.
    pub fn is_duplicate(&mut self, timestamp_ms: f64) -> bool {
        match self.last_double_ms {
            Some(detected) if timestamp_ms - detected <= self.max_interval_ms => {
                self.last_double_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Forget the pending press.
    pub fn reset(&mut self) {
        self.last_press = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ClickTracker {
        ClickTracker::new(10.0, 400.0)
    }

    #[test]
    fn test_double_click_detection() {
        let mut clicks = tracker();
        assert!(!clicks.press(Point::new(10.0, 10.0), MouseButton::Left, 0.0));
        assert!(clicks.press(Point::new(14.0, 12.0), MouseButton::Left, 250.0));
        // Triple press starts over.
        assert!(!clicks.press(Point::new(14.0, 12.0), MouseButton::Left, 300.0));
    }

    #[test]
    fn test_double_click_too_slow_or_far() {
        let mut clicks = tracker();
        clicks.press(Point::new(0.0, 0.0), MouseButton::Left, 0.0);
        assert!(!clicks.press(Point::new(0.0, 0.0), MouseButton::Left, 401.0));
        assert!(!clicks.press(Point::new(20.0, 0.0), MouseButton::Left, 500.0));
    }

    #[test]
    fn test_double_click_different_buttons() {
        let mut clicks = tracker();
        clicks.press(Point::ZERO, MouseButton::Left, 0.0);
        assert!(!clicks.press(Point::ZERO, MouseButton::Right, 100.0));
    }

    #[test]
    fn test_native_duplicate_is_ignored_once() {
        let mut clicks = tracker();
        clicks.press(Point::ZERO, MouseButton::Left, 0.0);
        clicks.press(Point::ZERO, MouseButton::Left, 100.0);
        assert!(clicks.is_duplicate(110.0));
        assert!(!clicks.is_duplicate(120.0));
    }
}
