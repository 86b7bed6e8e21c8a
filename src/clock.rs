// Time sources used by the session registry

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use tokio::time::Instant;

/// Source of "now" for the registry.
///
/// `now` is the wall-clock time reported to clients and audit. `instant` is
/// monotonic and is the only reading liveness is computed from, so stepping
/// the system time neither revives nor extends a session.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn instant(&self) -> Instant;
}

/// System wall clock plus the runtime's monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct ManualReading {
    wall: DateTime<Utc>,
    mono: Instant,
}

/// Clock that only moves when told to. Used to simulate TTL expiry and
/// wall-clock steps.
#[derive(Debug)]
pub struct ManualClock {
    reading: Mutex<ManualReading>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            reading: Mutex::new(ManualReading {
                wall: start,
                mono: Instant::now(),
            }),
        }
    }

    /// Let time pass. Both clocks move forward; a negative step only moves
    /// the wall clock.
    pub fn advance(&self, by: Duration) {
        let mut reading = self.reading.lock().unwrap_or_else(|e| e.into_inner());
        reading.wall += by;
        if let Ok(elapsed) = by.to_std() {
            reading.mono += elapsed;
        }
    }

    /// Step the wall clock to `to`, as an NTP correction would.
    /// Monotonic time is unaffected.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut reading = self.reading.lock().unwrap_or_else(|e| e.into_inner());
        reading.wall = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.reading.lock().unwrap_or_else(|e| e.into_inner()).wall
    }

    fn instant(&self) -> Instant {
        self.reading.lock().unwrap_or_else(|e| e.into_inner()).mono
    }
}
