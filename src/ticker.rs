use crate::{
    heartbeat::{Heartbeat, Tick, FAST_PERIOD},
    jiggle::{InputSink, JiggleController, Status},
};
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Controller plus its tick source. Shared between the ticker thread and the
/// UI behind one lock, so ticks and toggles are handled one at a time.
#[derive(Debug)]
pub struct Engine {
    controller: JiggleController,
    heartbeat: Heartbeat,
}

impl Engine {
    pub fn new(now: Instant) -> Self {
        Self { controller: JiggleController::create(), heartbeat: Heartbeat::start(now) }
    }

    pub fn status(&self) -> Status { self.controller.status() }

    #[cfg(test)]
    pub fn heartbeat(&self) -> &Heartbeat { &self.heartbeat }

    pub fn next_deadline(&self) -> Option<Instant> { self.heartbeat.next_deadline() }

    /// Delivers every tick due at `now`, earliest first. Returns true if any
    /// tick was delivered.
    pub fn pump(&mut self, now: Instant, sink: &mut impl InputSink) -> bool {
        let mut delivered = false;
        while let Some(tick) = self.heartbeat.poll(now) {
            delivered = true;
            match tick {
                Tick::Slow => {
                    let was_active = self.controller.status().state.is_active();
                    self.controller.on_slow_tick(&mut self.heartbeat);
                    let status = self.controller.status();
                    if !was_active && status.state.is_active() {
                        tracing::debug!(jiggles = status.statistics, "cycle armed");
                    }
                }
                Tick::Fast => self.controller.on_fast_tick(sink, &mut self.heartbeat),
            }
        }
        delivered
    }

    pub fn toggle_pause(&mut self) {
        self.controller.toggle_pause();
        tracing::debug!(paused = self.controller.status().paused, "pause toggled");
    }

    pub fn destroy(&mut self) {
        self.controller.destroy(&mut self.heartbeat);
    }
}

/// Longest sleep between checks of the running flag.
const SLICE: Duration = FAST_PERIOD;

/// Background thread feeding heartbeat ticks into the shared engine.
///
/// The synthetic input sink is built on the thread and never leaves it.
pub struct TickerJob {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickerJob {
    pub fn spawn<S, F, N>(engine: Arc<Mutex<Engine>>, make_sink: F, notify: N) -> Self
    where
        S: InputSink,
        F: FnOnce() -> S + Send + 'static,
        N: Fn() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = thread::spawn(move || {
            let mut sink = make_sink();
            tracing::debug!("ticker started");
            while running_clone.load(Ordering::Relaxed) {
                let now = Instant::now();
                let (delivered, deadline) = {
                    let mut engine = engine.lock();
                    (engine.pump(now, &mut sink), engine.next_deadline())
                };
                if delivered { notify(); }

                let wait = deadline.map_or(SLICE, |d| d.saturating_duration_since(Instant::now()));
                thread::sleep(wait.min(SLICE));
            }
            tracing::debug!("ticker stopped");
        });

        Self { running, handle: Some(handle) }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the thread and waits for it, so no tick runs after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("ticker thread panicked");
            }
        }
    }
}

impl Drop for TickerJob {
    fn drop(&mut self) { self.stop(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jiggle::SyntheticEvent;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<SyntheticEvent>>>);

    impl InputSink for SharedSink {
        fn submit(&mut self, event: SyntheticEvent) { self.0.lock().push(event); }
    }

    #[test]
    fn test_ticker_job_runs_a_cycle_and_stops() {
        let engine = Arc::new(Mutex::new(Engine::new(Instant::now())));
        let sink = SharedSink::default();
        let sink_clone = sink.clone();

        let mut job = TickerJob::spawn(Arc::clone(&engine), move || sink_clone, || {});
        assert!(job.is_running());

        // First cycle arms after one second and takes ~350ms.
        let give_up = Instant::now() + Duration::from_secs(5);
        while sink.0.lock().len() < 6 && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(20));
        }
        job.stop();
        assert!(!job.is_running());
        assert!(engine.lock().status().statistics >= 1);

        let seen = sink.0.lock().len();
        assert!(seen >= 6);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(sink.0.lock().len(), seen);
    }

    #[test]
    fn test_stop_twice() {
        let engine = Arc::new(Mutex::new(Engine::new(Instant::now())));
        let mut job = TickerJob::spawn(engine, SharedSink::default, || {});
        job.stop();
        job.stop();
        assert!(!job.is_running());
    }
}
