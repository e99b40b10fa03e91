use std::time::{Duration, Instant};

/// Rate limiter for unknown-person alerts.
///
/// One throttle guards all unknown detections: a granted alert arms the
/// timer and later requests are suppressed until strictly more than
/// `gap` has elapsed. The caller owns it mutably, so the elapsed check
/// and the re-arm are a single inseparable operation.
pub struct AlertThrottle {
    gap: Duration,
    last_alert: Option<Instant>,
}

impl AlertThrottle {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            last_alert: None,
        }
    }

    /// Returns true iff an alert should fire now. The first request
    /// always fires. Saturating elapsed math, so a `now` earlier than
    /// the last grant suppresses rather than panics.
    pub fn maybe_alert(&mut self, now: Instant) -> bool {
        let fire = match self.last_alert {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.gap,
        };
        if fire {
            self.last_alert = Some(now);
        }
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn test_first_request_fires() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));
        assert!(throttle.maybe_alert(Instant::now()));
    }

    #[test]
    fn test_requests_within_gap_suppressed() {
        let base = Instant::now();
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));

        assert!(throttle.maybe_alert(at(base, 0)));
        assert!(!throttle.maybe_alert(at(base, 1_000)));
        assert!(!throttle.maybe_alert(at(base, 4_999)));
    }

    #[test]
    fn test_exactly_gap_elapsed_still_suppressed() {
        let base = Instant::now();
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));

        assert!(throttle.maybe_alert(at(base, 0)));
        assert!(!throttle.maybe_alert(at(base, 5_000)));
    }

    #[test]
    fn test_fires_once_strictly_past_gap() {
        let base = Instant::now();
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));

        // Requests at 0.0s, 1.0s, 5.1s, 5.2s: only 0.0s and 5.1s fire.
        assert!(throttle.maybe_alert(at(base, 0)));
        assert!(!throttle.maybe_alert(at(base, 1_000)));
        assert!(throttle.maybe_alert(at(base, 5_100)));
        assert!(!throttle.maybe_alert(at(base, 5_200)));
    }

    #[test]
    fn test_grant_rearms_the_timer() {
        let base = Instant::now();
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));

        assert!(throttle.maybe_alert(at(base, 0)));
        assert!(throttle.maybe_alert(at(base, 5_100)));
        // 4.9s after the second grant: suppressed.
        assert!(!throttle.maybe_alert(at(base, 10_000)));
        assert!(throttle.maybe_alert(at(base, 10_201)));
    }

    #[test]
    fn test_out_of_order_now_suppresses() {
        let base = Instant::now();
        let mut throttle = AlertThrottle::new(Duration::from_secs(5));

        assert!(throttle.maybe_alert(at(base, 1_000)));
        assert!(!throttle.maybe_alert(at(base, 0)));
    }
}
