use crate::jiggle::{InputSink, KeyCode, SyntheticEvent};
use enigo::{Key, KeyboardControllable, MouseControllable};

/// Submits synthetic input to the OS through `enigo`.
///
/// The platform may drop events (secure desktop, UIPI, missing X server);
/// enigo gives no feedback in that case and neither does this sink.
pub struct EnigoSink {
    enigo: enigo::Enigo,
}

impl Default for EnigoSink {
    fn default() -> Self { Self::new() }
}

impl EnigoSink {
    pub fn new() -> Self {
        Self { enigo: enigo::Enigo::new() }
    }
}

fn key_for(code: KeyCode) -> Key {
    match code {
        KeyCode::LeftControl => Key::LControl,
    }
}

impl InputSink for EnigoSink {
    fn submit(&mut self, event: SyntheticEvent) {
        tracing::trace!(?event, "submitting synthetic input");
        match event {
            SyntheticEvent::MouseMove { dx, dy } => self.enigo.mouse_move_relative(dx, dy),
            SyntheticEvent::Key { code, down: true } => self.enigo.key_down(key_for(code)),
            SyntheticEvent::Key { code, down: false } => self.enigo.key_up(key_for(code)),
        }
    }
}
