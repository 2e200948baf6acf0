//! Emission timestamps
//!
//! Every metric gets a timestamp strictly greater than the previous one, even
//! when the clock does not advance between calls. Sinks that key on
//! (measurement, tags, timestamp) therefore never see two syslog metrics
//! overwrite each other.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// Time source
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out strictly increasing timestamps
pub struct TimestampSequencer {
    clock: Arc<dyn Clock>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl TimestampSequencer {
    /// Sequencer over the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Sequencer over a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    /// Next emission timestamp
    pub fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let now = self.clock.now();
        let next = match *last {
            Some(prev) if now <= prev => prev + TimeDelta::nanoseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

impl Default for TimestampSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimestampSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampSequencer")
            .field("last", &*self.last.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::TimeZone;

    use super::*;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct ScriptedClock(Mutex<Vec<DateTime<Utc>>>);

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.lock().remove(0)
        }
    }

    fn epoch(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_constant_clock_strictly_increasing() {
        let sequencer = TimestampSequencer::with_clock(Arc::new(FixedClock(epoch(1_000))));

        let stamps: Vec<_> = (0..100).map(|_| sequencer.next()).collect();
        assert_eq!(stamps[0], epoch(1_000));
        for pair in stamps.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_eq!(pair[1] - pair[0], TimeDelta::nanoseconds(1));
        }
    }

    #[test]
    fn test_clock_going_backwards() {
        let clock = ScriptedClock(Mutex::new(vec![epoch(10), epoch(5), epoch(20)]));
        let sequencer = TimestampSequencer::with_clock(Arc::new(clock));

        assert_eq!(sequencer.next(), epoch(10));
        assert_eq!(sequencer.next(), epoch(10) + TimeDelta::nanoseconds(1));
        assert_eq!(sequencer.next(), epoch(20));
    }

    #[test]
    fn test_distinct_across_threads() {
        let sequencer = Arc::new(TimestampSequencer::with_clock(Arc::new(FixedClock(
            epoch(0),
        ))));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sequencer = Arc::clone(&sequencer);
                std::thread::spawn(move || (0..250).map(|_| sequencer.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for stamp in handle.join().unwrap() {
                assert!(seen.insert(stamp), "duplicate timestamp {stamp}");
            }
        }
        assert_eq!(seen.len(), 1_000);
    }
}
