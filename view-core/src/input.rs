//! Drag gesture bookkeeping for the input relay.

/// Tracks the last sampled pointer position of an active drag and
/// yields the pixel delta accumulated since that sample. The deltas go
/// straight to the module's drag interpreter; no other state is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragTracker {
    anchor: Option<(f64, f64)>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, x: f64, y: f64) {
        self.anchor = Some((x, y));
    }

    /// Delta since the previous sample, or None when no drag is active.
    pub fn sample(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (ax, ay) = self.anchor?;
        self.anchor = Some((x, y));
        Some((x - ax, y - ay))
    }

    pub fn end(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_accumulate_between_samples() {
        let mut drag = DragTracker::new();
        assert_eq!(drag.sample(10.0, 10.0), None);

        drag.begin(100.0, 50.0);
        assert_eq!(drag.sample(110.0, 45.0), Some((10.0, -5.0)));
        assert_eq!(drag.sample(110.0, 45.0), Some((0.0, 0.0)));
        assert_eq!(drag.sample(90.0, 60.0), Some((-20.0, 15.0)));

        drag.end();
        assert_eq!(drag.sample(0.0, 0.0), None);
    }
}
