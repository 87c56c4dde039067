/// Default number of seconds before expiry at which the warning fires.
pub const DEFAULT_WARNING_THRESHOLD: u32 = 10;

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Ready,
    Running,
    Paused,
    Finished,
}

/// What a `tick` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerTick {
    /// The warning threshold was crossed during this tick. Fires at most
    /// once per countdown.
    pub warning: bool,
    /// The countdown reached zero during this tick.
    pub finished: bool,
}

/// Pure countdown state machine for timed task cards.
///
/// The timer holds no clock; the caller decides what drives `tick` (a
/// one-second interval in the app, explicit calls in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTimer {
    initial: u32,
    remaining: u32,
    phase: TimerPhase,
    warning_threshold: u32,
    warning_fired: bool,
}

impl TaskTimer {
    #[must_use]
    pub fn new(seconds: u32) -> Self {
        Self {
            initial: seconds,
            remaining: seconds,
            phase: TimerPhase::Ready,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            warning_fired: false,
        }
    }

    #[must_use]
    pub fn with_warning_threshold(mut self, seconds: u32) -> Self {
        self.warning_threshold = seconds;
        self
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Elapsed seconds since the countdown began.
    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.initial - self.remaining
    }

    /// Start the countdown. No-op when already finished or out of time.
    pub fn start(&mut self) {
        if self.remaining > 0 && self.phase != TimerPhase::Finished {
            self.phase = TimerPhase::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == TimerPhase::Paused {
            self.phase = TimerPhase::Running;
        }
    }

    /// Back to the full countdown, clearing the warning latch.
    pub fn reset(&mut self) {
        self.remaining = self.initial;
        self.phase = TimerPhase::Ready;
        self.warning_fired = false;
    }

    /// Advance the countdown by `seconds`. Only a running timer ticks.
    pub fn tick(&mut self, seconds: u32) -> TimerTick {
        let mut observed = TimerTick::default();
        if self.phase != TimerPhase::Running {
            return observed;
        }

        self.remaining = self.remaining.saturating_sub(seconds);

        if self.remaining == 0 {
            self.phase = TimerPhase::Finished;
            observed.finished = true;
        } else if self.remaining <= self.warning_threshold && !self.warning_fired {
            self.warning_fired = true;
            observed.warning = true;
        }

        observed
    }
}
