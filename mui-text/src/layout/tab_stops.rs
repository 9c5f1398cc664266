//! Tab stop positions.

/// Default distance between tab stops, in pixels.
pub const TAB_INCREMENT: f32 = 20.0;

/// Explicit tab stops followed by evenly spaced default stops.
#[derive(Clone, Debug, PartialEq)]
pub struct TabStops {
    stops: Vec<f32>,
    increment: f32,
}

impl Default for TabStops {
    fn default() -> Self {
        Self::new(TAB_INCREMENT, [])
    }
}

impl TabStops {
    pub fn new(increment: f32, stops: impl IntoIterator<Item = f32>) -> Self {
        let mut stops: Vec<f32> = stops.into_iter().filter(|s| s.is_finite()).collect();
        stops.sort_by(f32::total_cmp);
        Self { stops, increment }
    }

    /// Position of the first stop strictly after `h`.
    pub fn next_tab(&self, h: f32) -> f32 {
        self.stops
            .iter()
            .copied()
            .find(|&stop| stop > h)
            .unwrap_or_else(|| Self::next_default_stop(h, self.increment))
    }

    /// First multiple of `increment` strictly after `h`.
    pub fn next_default_stop(h: f32, increment: f32) -> f32 {
        ((h + increment) / increment).trunc() * increment
    }
}

// ===================================================================
// Tests
// ===================================================================
