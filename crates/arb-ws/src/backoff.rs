use std::time::Duration;

/// Exponential reconnect backoff, 0.5s -> 15s cap (spec.md §4.3.1).
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    floor: Duration,
    cap: Duration,
    current: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(15))
    }
}

impl ReconnectBackoff {
    pub fn new(floor: Duration, cap: Duration) -> Self {
        Self {
            floor,
            cap,
            current: floor,
        }
    }

    /// Duration to sleep before the next reconnect attempt, then doubles.
    pub fn next(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.cap);
        delay
    }

    /// Reset to the floor after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let mut backoff = ReconnectBackoff::new(Duration::from_millis(500), Duration::from_secs(15));
        assert_eq!(backoff.next(), Duration::from_millis(500));
        assert_eq!(backoff.next(), Duration::from_millis(1000));
        assert_eq!(backoff.next(), Duration::from_millis(2000));
        for _ in 0..10 {
            backoff.next();
        }
        assert_eq!(backoff.next(), Duration::from_secs(15));
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut backoff = ReconnectBackoff::default();
        backoff.next();
        backoff.next();
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_millis(500));
    }
}
