use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open { tripped_at: Instant },
    HalfOpen,
}

/// Stops calling a backend that keeps failing, then probes it after a cooldown
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u8,
    last_failure_time: Option<Instant>,
    trip_threshold: u8,
    trip_window: Duration,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_limits(3, Duration::from_secs(300), Duration::from_secs(60))
    }

    pub fn with_limits(trip_threshold: u8, trip_window: Duration, cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            trip_threshold: trip_threshold.max(1),
            trip_window,
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Moves an expired open breaker to half-open so one probe can go through
    pub fn is_request_allowed(&mut self) -> bool {
        if let CircuitState::Open { tripped_at } = self.state {
            if tripped_at.elapsed() < self.cooldown {
                return false;
            }
            tracing::info!("Circuit breaker half-open, probing backend");
            self.state = CircuitState::HalfOpen;
        }
        true
    }

    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            tracing::info!("Circuit breaker closed after successful probe");
        }
        self.failure_count = 0;
        self.last_failure_time = None;
        self.state = CircuitState::Closed;
    }

    pub fn record_failure(&mut self) {
        let now = Instant::now();
        let within_window = self
            .last_failure_time
            .is_some_and(|last| now.duration_since(last) <= self.trip_window);

        self.failure_count = match self.state {
            CircuitState::HalfOpen => self.trip_threshold,
            _ if within_window => self.failure_count.saturating_add(1),
            _ => 1,
        };
        self.last_failure_time = Some(now);

        if self.failure_count >= self.trip_threshold {
            self.state = CircuitState::Open { tripped_at: now };
            tracing::warn!(
                "Circuit breaker open for {:?}, failure_count={}",
                self.cooldown,
                self.failure_count
            );
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
