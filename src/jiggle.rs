use std::fmt;

/// Pixels travelled along each axis by one move step.
pub const STEP_PX: i32 = 10;

// -------------- Events --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCode { LeftControl }

/// A simulated input submitted on behalf of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// Relative pointer motion in pixels.
    MouseMove { dx: i32, dy: i32 },
    Key { code: KeyCode, down: bool },
}

/// The four legs of the square, in walking order. Their deltas sum to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner { NorthEast, SouthEast, SouthWest, NorthWest }

impl Corner {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Corner::NorthEast => (STEP_PX, STEP_PX),
            Corner::SouthEast => (STEP_PX, -STEP_PX),
            Corner::SouthWest => (-STEP_PX, -STEP_PX),
            Corner::NorthWest => (-STEP_PX, STEP_PX),
        }
    }

    fn next(self) -> SequenceState {
        match self {
            Corner::NorthEast => SequenceState::Move(Corner::SouthEast),
            Corner::SouthEast => SequenceState::Move(Corner::SouthWest),
            Corner::SouthWest => SequenceState::Move(Corner::NorthWest),
            Corner::NorthWest => SequenceState::KeyDown,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Corner::NorthEast => "NE",
            Corner::SouthEast => "SE",
            Corner::SouthWest => "SW",
            Corner::NorthWest => "NW",
        }
    }
}

// -------------- Sequence --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceState {
    /// Ready to start a new cycle on the next unpaused slow tick.
    Idle,
    Waiting,
    Move(Corner),
    KeyDown,
    KeyUp,
    /// Past the last step; the next fast tick disarms.
    Done,
}

impl SequenceState {
    pub fn is_active(self) -> bool {
        matches!(self, SequenceState::Move(_) | SequenceState::KeyDown | SequenceState::KeyUp | SequenceState::Done)
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceState::Idle => f.write_str("idle"),
            SequenceState::Waiting => f.write_str("waiting"),
            SequenceState::Move(c) => write!(f, "move {}", c.label()),
            SequenceState::KeyDown => f.write_str("ctrl down"),
            SequenceState::KeyUp => f.write_str("ctrl up"),
            SequenceState::Done => f.write_str("done"),
        }
    }
}

/// Fast-tick transition. Anything outside the emitting steps resets to `Idle`
/// without an event; the caller disarms when it sees that.
pub fn step(state: SequenceState) -> (SequenceState, Option<SyntheticEvent>) {
    match state {
        SequenceState::Move(corner) => {
            let (dx, dy) = corner.delta();
            (corner.next(), Some(SyntheticEvent::MouseMove { dx, dy }))
        }
        SequenceState::KeyDown => (
            SequenceState::KeyUp,
            Some(SyntheticEvent::Key { code: KeyCode::LeftControl, down: true }),
        ),
        SequenceState::KeyUp => (
            SequenceState::Done,
            Some(SyntheticEvent::Key { code: KeyCode::LeftControl, down: false }),
        ),
        SequenceState::Idle | SequenceState::Waiting | SequenceState::Done => (SequenceState::Idle, None),
    }
}

// -------------- Collaborators --------------
/// Best-effort destination for synthetic input. Failures are not reported.
pub trait InputSink {
    fn submit(&mut self, event: SyntheticEvent);
}

/// The periodic triggers driving the controller.
pub trait Triggers {
    fn start_fast(&mut self);
    fn stop_fast(&mut self);
    fn stop_slow(&mut self);
}

// -------------- Controller --------------
/// Read-only snapshot for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub state: SequenceState,
    pub paused: bool,
    pub statistics: u64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paused { f.write_str("PAUSED ")?; }
        write!(f, "state: {} jiggles: {}", self.state, self.statistics)
    }
}

#[derive(Debug)]
pub struct JiggleController {
    state: SequenceState,
    paused: bool,
    statistics: u64,
    armed: bool,
    destroyed: bool,
}

impl Default for JiggleController {
    fn default() -> Self { Self::create() }
}

impl JiggleController {
    pub fn create() -> Self {
        Self { state: SequenceState::Idle, paused: false, statistics: 0, armed: false, destroyed: false }
    }

    pub fn status(&self) -> Status {
        Status { state: self.state, paused: self.paused, statistics: self.statistics }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool { self.armed }

    pub fn toggle_pause(&mut self) { self.paused = !self.paused; }

    /// Pause gates only this path; an armed cycle keeps running on fast ticks.
    pub fn on_slow_tick(&mut self, triggers: &mut impl Triggers) {
        if self.destroyed || self.paused { return; }
        if self.state == SequenceState::Idle {
            self.state = SequenceState::Waiting;
        }
        if self.state == SequenceState::Waiting {
            self.statistics += 1;
            self.state = SequenceState::Move(Corner::NorthEast);
            self.arm(triggers);
        }
    }

    pub fn on_fast_tick(&mut self, sink: &mut impl InputSink, triggers: &mut impl Triggers) {
        if self.destroyed { return; }
        let (next, event) = step(self.state);
        self.state = next;
        match event {
            Some(event) => sink.submit(event),
            None => self.disarm(triggers),
        }
    }

    /// Stops every trigger. Safe to call more than once.
    pub fn destroy(&mut self, triggers: &mut impl Triggers) {
        if self.destroyed { return; }
        self.disarm(triggers);
        triggers.stop_slow();
        self.destroyed = true;
    }

    fn arm(&mut self, triggers: &mut impl Triggers) {
        debug_assert!(!self.armed, "fast trigger armed twice");
        if self.armed { return; }
        triggers.start_fast();
        self.armed = true;
    }

    fn disarm(&mut self, triggers: &mut impl Triggers) {
        if !self.armed { return; }
        triggers.stop_fast();
        self.armed = false;
    }
}
