/// Vertical camera offset for a level taller than the viewport.
///
/// Centers the viewport on `focus_y` (a world-space pixel row), then
/// clamps so the visible window never leaves the level. A level that
/// fits entirely on screen always yields zero.
pub fn scroll_offset(focus_y: f32, level_height: f32, viewport_height: f32) -> f32 {
    if level_height <= viewport_height {
        return 0.0;
    }
    let raw = focus_y - viewport_height / 2.0;
    raw.clamp(0.0, level_height - viewport_height)
}

/// Tracks the fractional remainder between the exact scroll position
/// and the whole-pixel offset actually applied, so repeated small
/// scrolls never accumulate drift beyond one pixel.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrollCarry {
    exact: f32,
    applied_px: i32,
}

impl ScrollCarry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current whole-pixel scroll offset.
    pub fn applied_px(&self) -> i32 {
        self.applied_px
    }

    /// Move the exact position to `target` and return the whole-pixel
    /// delta to apply this frame.
    pub fn advance(&mut self, target: f32) -> i32 {
        self.exact = target;
        let wanted = self.exact.floor() as i32;
        let delta = wanted - self.applied_px;
        self.applied_px = wanted;
        delta
    }

    /// Absolute difference between exact and applied positions.
    pub fn drift(&self) -> f32 {
        (self.exact - self.applied_px as f32).abs()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_that_fits_never_scrolls() {
        assert_eq!(scroll_offset(500.0, 240.0, 240.0), 0.0);
        assert_eq!(scroll_offset(-50.0, 100.0, 240.0), 0.0);
    }

    #[test]
    fn offset_clamps_at_top_and_bottom() {
        assert_eq!(scroll_offset(0.0, 1000.0, 240.0), 0.0);
        assert_eq!(scroll_offset(1000.0, 1000.0, 240.0), 760.0);
    }

    #[test]
    fn offset_centers_focus_in_midrange() {
        assert_eq!(scroll_offset(500.0, 1000.0, 240.0), 380.0);
    }

    #[test]
    fn carry_drift_stays_under_one_pixel() {
        let mut carry = ScrollCarry::new();
        let mut target = 0.0f32;
        for _ in 0..1000 {
            target += 0.3;
            carry.advance(target);
            assert!(carry.drift() < 1.0, "drift {} at target {}", carry.drift(), target);
        }
    }

    #[test]
    fn carry_deltas_sum_to_applied_offset() {
        let mut carry = ScrollCarry::new();
        let mut total = 0;
        for step in 1..=50 {
            total += carry.advance(step as f32 * 1.7);
        }
        assert_eq!(total, carry.applied_px());
        assert_eq!(carry.applied_px(), (50.0f32 * 1.7).floor() as i32);
    }

    #[test]
    fn carry_handles_reverse_scroll() {
        let mut carry = ScrollCarry::new();
        carry.advance(10.6);
        let delta = carry.advance(3.2);
        assert_eq!(delta, 3 - 10);
        assert_eq!(carry.applied_px(), 3);
    }
}
