//! Keyboard sampling and edge-triggered intent sending.

use std::f32::consts::FRAC_1_SQRT_2;

/// Turns the four held movement keys into a unit-or-zero direction.
/// Opposing keys cancel; diagonals are normalized so speed is uniform.
pub fn direction_from_keys(left: bool, right: bool, up: bool, down: bool) -> (f32, f32) {
    let mut dx = 0.0;
    let mut dy = 0.0;

    if left {
        dx -= 1.0;
    }
    if right {
        dx += 1.0;
    }
    if up {
        dy -= 1.0;
    }
    if down {
        dy += 1.0;
    }

    if dx != 0.0 && dy != 0.0 {
        dx *= FRAC_1_SQRT_2;
        dy *= FRAC_1_SQRT_2;
    }

    (dx, dy)
}

/// Remembers the last direction sent to the server so a held key produces
/// one packet, not one per frame. The server keeps applying the latest
/// direction until told otherwise.
#[derive(Debug)]
pub struct InputTracker {
    last: (f32, f32),
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTracker {
    /// Both sides assume a standstill before the first input packet.
    pub fn new() -> Self {
        Self { last: (0.0, 0.0) }
    }

    /// Returns the direction if it differs from the last one sent.
    pub fn track(&mut self, dir: (f32, f32)) -> Option<(f32, f32)> {
        if dir == self.last {
            None
        } else {
            self.last = dir;
            Some(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn cardinal_directions_are_unit_length() {
        assert_eq!(direction_from_keys(true, false, false, false), (-1.0, 0.0));
        assert_eq!(direction_from_keys(false, true, false, false), (1.0, 0.0));
        assert_eq!(direction_from_keys(false, false, true, false), (0.0, -1.0));
        assert_eq!(direction_from_keys(false, false, false, true), (0.0, 1.0));
    }

    #[test]
    fn diagonals_are_normalized() {
        let (dx, dy) = direction_from_keys(false, true, false, true);
        assert_approx_eq!((dx * dx + dy * dy).sqrt(), 1.0, 1e-6);
        assert_approx_eq!(dx, FRAC_1_SQRT_2, 1e-6);
        assert_approx_eq!(dy, FRAC_1_SQRT_2, 1e-6);
    }

    #[test]
    fn opposing_keys_cancel() {
        assert_eq!(direction_from_keys(true, true, false, false), (0.0, 0.0));
        assert_eq!(direction_from_keys(true, true, true, true), (0.0, 0.0));
    }

    #[test]
    fn tracker_fires_only_on_change() {
        let mut tracker = InputTracker::new();

        // Standstill is the implicit starting state, nothing to send.
        assert_eq!(tracker.track((0.0, 0.0)), None);

        assert_eq!(tracker.track((1.0, 0.0)), Some((1.0, 0.0)));
        assert_eq!(tracker.track((1.0, 0.0)), None);
        assert_eq!(tracker.track((1.0, 0.0)), None);

        assert_eq!(tracker.track((0.0, 0.0)), Some((0.0, 0.0)));
        assert_eq!(tracker.track((0.0, 0.0)), None);
    }
}
