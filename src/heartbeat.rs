use crate::jiggle::Triggers;
use std::time::{Duration, Instant};

pub const SLOW_PERIOD: Duration = Duration::from_millis(1000);
pub const FAST_PERIOD: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick { Slow, Fast }

#[derive(Clone, Copy, Debug)]
struct Trigger {
    period: Duration,
    due: Option<Instant>,
}

impl Trigger {
    fn stopped(period: Duration) -> Self { Self { period, due: None } }
    fn start(&mut self, now: Instant) { self.due = Some(now + self.period); }
    fn stop(&mut self) { self.due = None; }
}

/// Slow and fast periodic triggers, polled from the ticker thread.
///
/// A trigger that fell behind fires once and is rescheduled a full period
/// from the poll time; missed periods are not replayed.
#[derive(Debug)]
pub struct Heartbeat {
    slow: Trigger,
    fast: Trigger,
    now: Instant,
}

impl Heartbeat {
    /// Starts with the slow trigger running and the fast trigger stopped.
    pub fn start(now: Instant) -> Self {
        let mut slow = Trigger::stopped(SLOW_PERIOD);
        slow.start(now);
        tracing::debug!(period = ?SLOW_PERIOD, "heartbeat started");
        Self { slow, fast: Trigger::stopped(FAST_PERIOD), now }
    }

    /// Returns the earliest trigger due at `now`, if any. Call until `None`.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        self.now = self.now.max(now);
        let now = self.now;
        let (tick, trigger) = match (self.slow.due, self.fast.due) {
            (Some(s), Some(f)) if f < s => (Tick::Fast, &mut self.fast),
            (Some(_), _) => (Tick::Slow, &mut self.slow),
            (None, Some(_)) => (Tick::Fast, &mut self.fast),
            (None, None) => return None,
        };
        match trigger.due {
            Some(due) if due <= now => {
                trigger.start(now);
                tracing::trace!(?tick, "tick");
                Some(tick)
            }
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.slow.due, self.fast.due) {
            (Some(s), Some(f)) => Some(s.min(f)),
            (s, f) => s.or(f),
        }
    }

    #[cfg(test)]
    pub fn fast_running(&self) -> bool { self.fast.due.is_some() }
    #[cfg(test)]
    pub fn slow_running(&self) -> bool { self.slow.due.is_some() }
}

impl Triggers for Heartbeat {
    fn start_fast(&mut self) {
        self.fast.start(self.now);
        tracing::debug!("fast trigger started");
    }

    fn stop_fast(&mut self) {
        self.fast.stop();
        tracing::debug!("fast trigger stopped");
    }

    fn stop_slow(&mut self) {
        self.slow.stop();
        tracing::debug!("slow trigger stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(hb: &mut Heartbeat, now: Instant) -> Vec<Tick> {
        std::iter::from_fn(|| hb.poll(now)).collect()
    }

    #[test]
    fn test_slow_fires_each_second() {
        let t0 = Instant::now();
        let mut hb = Heartbeat::start(t0);
        assert!(drain(&mut hb, t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(drain(&mut hb, t0 + SLOW_PERIOD), vec![Tick::Slow]);
        assert_eq!(hb.next_deadline(), Some(t0 + SLOW_PERIOD * 2));
    }

    #[test]
    fn test_late_poll_coalesces() {
        let t0 = Instant::now();
        let mut hb = Heartbeat::start(t0);
        assert_eq!(drain(&mut hb, t0 + Duration::from_secs(5)), vec![Tick::Slow]);
    }

    #[test]
    fn test_fast_runs_from_last_poll() {
        let t0 = Instant::now();
        let mut hb = Heartbeat::start(t0);
        let t1 = t0 + SLOW_PERIOD;
        assert_eq!(hb.poll(t1), Some(Tick::Slow));
        hb.start_fast();
        assert!(hb.fast_running());
        assert_eq!(hb.next_deadline(), Some(t1 + FAST_PERIOD));
        assert_eq!(drain(&mut hb, t1 + FAST_PERIOD), vec![Tick::Fast]);

        hb.stop_fast();
        assert!(!hb.fast_running());
        assert_eq!(hb.next_deadline(), Some(t1 + SLOW_PERIOD));
    }

    #[test]
    fn test_earliest_trigger_first() {
        let t0 = Instant::now();
        let mut hb = Heartbeat::start(t0);
        hb.start_fast();
        // Both overdue: fast was due at 50ms, slow at 1000ms.
        let late = t0 + Duration::from_millis(1200);
        assert_eq!(drain(&mut hb, late), vec![Tick::Fast, Tick::Slow]);
    }

    #[test]
    fn test_stopped_heartbeat_is_silent() {
        let t0 = Instant::now();
        let mut hb = Heartbeat::start(t0);
        hb.start_fast();
        hb.stop_fast();
        hb.stop_slow();
        assert!(!hb.slow_running());
        assert_eq!(hb.next_deadline(), None);
        assert!(drain(&mut hb, t0 + Duration::from_secs(10)).is_empty());
    }
}
