use crate::{
    jiggle::{InputSink, Status},
    log_file::LogFile,
    ticker::{Engine, TickerJob},
};
use eframe::egui::{self, FontId, RichText};
use parking_lot::Mutex;
use std::{sync::Arc, time::Instant};

/// The window. Ticks run on the ticker thread; the UI only renders and
/// forwards pause toggles.
pub struct KisegerApp {
    engine: Arc<Mutex<Engine>>,
    ticker: Option<TickerJob>,
    log: Option<LogFile>,
    torn_down: bool,
}

impl KisegerApp {
    pub fn new<S, F>(ctx: egui::Context, make_sink: F, log: Option<LogFile>) -> Self
    where
        S: InputSink,
        F: FnOnce() -> S + Send + 'static,
    {
        let engine = Arc::new(Mutex::new(Engine::new(Instant::now())));
        let ticker = TickerJob::spawn(Arc::clone(&engine), make_sink, move || ctx.request_repaint());
        Self { engine, ticker: Some(ticker), log, torn_down: false }
    }

    pub fn status(&self) -> Status { self.engine.lock().status() }

    pub fn toggle_pause(&mut self) { self.engine.lock().toggle_pause(); }

    /// Stops the ticker thread and both triggers, then closes the log file.
    pub fn teardown(&mut self) {
        if self.torn_down { return; }
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        let jiggles = {
            let mut engine = self.engine.lock();
            engine.destroy();
            engine.status().statistics
        };
        tracing::debug!(jiggles, "shutting down");
        if let Some(log) = self.log.take() {
            log.finish();
        }
        self.torn_down = true;
    }
}

/// Primary-button release or any key release.
fn toggle_requested(ctx: &egui::Context) -> bool {
    ctx.input(|i| {
        i.pointer.button_released(egui::PointerButton::Primary)
            || i.events.iter().any(|e| matches!(e, egui::Event::Key { pressed: false, .. }))
    })
}

impl eframe::App for KisegerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if toggle_requested(ctx) {
            self.toggle_pause();
        }

        let text = self.status().to_string();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(text).font(FontId::monospace(24.0)).strong());
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.teardown();
    }
}

impl Drop for KisegerApp {
    fn drop(&mut self) { self.teardown(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn released(button: egui::PointerButton) -> bool {
        let ctx = egui::Context::default();
        let pos = egui::pos2(10.0, 10.0);
        let modifiers = egui::Modifiers::default();
        let raw = egui::RawInput {
            events: vec![
                egui::Event::PointerMoved(pos),
                egui::Event::PointerButton { pos, button, pressed: true, modifiers },
                egui::Event::PointerButton { pos, button, pressed: false, modifiers },
            ],
            ..Default::default()
        };
        let mut toggled = false;
        let _ = ctx.run(raw, |ctx| toggled = toggle_requested(ctx));
        toggled
    }

    #[test]
    fn test_primary_release_toggles() {
        assert!(released(egui::PointerButton::Primary));
    }

    #[test]
    fn test_other_buttons_do_not_toggle() {
        assert!(!released(egui::PointerButton::Secondary));
        assert!(!released(egui::PointerButton::Middle));
    }

    #[test]
    fn test_no_input_no_toggle() {
        let ctx = egui::Context::default();
        let mut toggled = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| toggled = toggle_requested(ctx));
        assert!(!toggled);
    }
}
