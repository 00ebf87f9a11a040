use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(8);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed { call_number: u64 },
    NoSelection,
    InFlight,
    CoolingDown { wait_secs: u64 },
}

/// Single-flight guard with a cooldown between completed generations.
#[derive(Debug, Clone)]
pub struct GenerationGate {
    cooldown: Duration,
    in_flight: bool,
    last_completed_at: Option<Instant>,
    call_count: u64,
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl GenerationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_flight: false,
            last_completed_at: None,
            call_count: 0,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn last_completed_at(&self) -> Option<Instant> {
        self.last_completed_at
    }

    /// Rejections leave the gate untouched; `Proceed` marks a call in flight.
    pub fn try_begin(&mut self, selection_present: bool, now: Instant) -> GateDecision {
        if !selection_present {
            return GateDecision::NoSelection;
        }

        if self.in_flight {
            return GateDecision::InFlight;
        }

        if let Some(last) = self.last_completed_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return GateDecision::CoolingDown {
                    wait_secs: (self.cooldown - elapsed).as_secs(),
                };
            }
        }

        self.in_flight = true;
        self.call_count += 1;

        GateDecision::Proceed {
            call_number: self.call_count,
        }
    }

    pub fn complete_success(&mut self, now: Instant) {
        self.in_flight = false;
        self.last_completed_at = Some(now);
    }

    /// Failures do not start a cooldown.
    pub fn complete_failure(&mut self) {
        self.in_flight = false;
    }
}
