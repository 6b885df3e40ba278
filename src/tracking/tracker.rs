use crate::geo::haversine_km;
use crate::models::fix::DriverFix;

/// Threshold gate over incoming position fixes. A fix is emitted only when
/// it moved at least `min_distance_m` or at least `min_interval_secs` have
/// passed since the last emitted fix, bounding update frequency.
#[derive(Debug)]
pub struct LocationTracker {
    min_distance_m: f64,
    min_interval_secs: i64,
    last_emitted: Option<DriverFix>,
    stopped: bool,
}

impl LocationTracker {
    pub fn new(min_distance_m: f64, min_interval_secs: i64) -> Self {
        Self {
            min_distance_m,
            min_interval_secs,
            last_emitted: None,
            stopped: false,
        }
    }

    pub fn offer(&mut self, fix: DriverFix) -> Option<DriverFix> {
        if self.stopped || !fix.coordinate.is_finite() {
            return None;
        }

        if let Some(previous) = &self.last_emitted {
            // One-shot and watch fixes race on startup; captured_at decides.
            if fix.captured_at <= previous.captured_at {
                return None;
            }

            let moved_m = haversine_km(&previous.coordinate, &fix.coordinate) * 1000.0;
            let elapsed_secs = (fix.captured_at - previous.captured_at).num_seconds();

            if moved_m < self.min_distance_m && elapsed_secs < self.min_interval_secs {
                return None;
            }
        }

        self.last_emitted = Some(fix);
        Some(fix)
    }

    pub fn last_known(&self) -> Option<DriverFix> {
        self.last_emitted
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::LocationTracker;
    use crate::models::coordinate::Coordinate;
    use crate::models::fix::{DriverFix, FixSource};

    fn fix_at(latitude: f64, longitude: f64, offset_secs: i64) -> DriverFix {
        DriverFix {
            coordinate: Coordinate::new(latitude, longitude),
            captured_at: Utc::now() + Duration::seconds(offset_secs),
            source: FixSource::Watch,
        }
    }

    fn tracker() -> LocationTracker {
        LocationTracker::new(50.0, 30)
    }

    #[test]
    fn first_fix_is_always_emitted() {
        let mut tracker = tracker();
        assert!(tracker.offer(fix_at(25.2, 55.3, 0)).is_some());
        assert!(tracker.last_known().is_some());
    }

    #[test]
    fn fix_below_both_thresholds_is_throttled() {
        let mut tracker = tracker();
        tracker.offer(fix_at(25.2, 55.3, 0));

        // ~1 m away, 5 s later.
        assert!(tracker.offer(fix_at(25.20001, 55.3, 5)).is_none());
    }

    #[test]
    fn crossing_distance_threshold_emits() {
        let mut tracker = tracker();
        tracker.offer(fix_at(25.2, 55.3, 0));

        // ~111 m north, well inside the time threshold.
        assert!(tracker.offer(fix_at(25.201, 55.3, 5)).is_some());
    }

    #[test]
    fn crossing_time_threshold_emits() {
        let mut tracker = tracker();
        tracker.offer(fix_at(25.2, 55.3, 0));

        // Stationary, but 30 s elapsed.
        assert!(tracker.offer(fix_at(25.2, 55.3, 30)).is_some());
    }

    #[test]
    fn out_of_order_fix_is_rejected() {
        let mut tracker = tracker();
        tracker.offer(fix_at(25.2, 55.3, 0));

        assert!(tracker.offer(fix_at(25.3, 55.4, -10)).is_none());
    }

    #[test]
    fn stop_is_idempotent_and_silences_fixes() {
        let mut tracker = tracker();
        tracker.offer(fix_at(25.2, 55.3, 0));

        tracker.stop();
        tracker.stop();

        assert!(tracker.is_stopped());
        assert!(tracker.offer(fix_at(25.3, 55.4, 60)).is_none());
        // Last known stays readable after stop.
        assert!(tracker.last_known().is_some());
    }
}
