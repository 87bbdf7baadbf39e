//! Countdown timer used for rest periods.
//!
//! The timer does not own a clock. Its owner calls [`CountdownTimer::tick`]
//! once per second while the timer should be counting, and reacts to the
//! returned [`TimerEvent`]. Starting a new countdown always supersedes the
//! previous one, so there is never more than one active countdown per timer.

/// Notification produced by the timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed; carries the new remaining time (always > 0)
    Tick(u32),
    /// Countdown reached zero, naturally or via [`CountdownTimer::skip`]
    Completed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountdownTimer {
    total_time: u32,
    time_remaining: u32,
    running: bool,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `duration_seconds`, cancelling any countdown in flight
    pub fn start(&mut self, duration_seconds: u32) {
        if self.running {
            tracing::debug!(
                "Superseding countdown with {}s remaining",
                self.time_remaining
            );
        }
        self.total_time = duration_seconds;
        self.time_remaining = duration_seconds;
        self.running = true;
    }

    /// Advance one second
    ///
    /// Returns `None` when the timer is not running.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            Some(TimerEvent::Tick(self.time_remaining))
        } else {
            self.running = false;
            Some(TimerEvent::Completed)
        }
    }

    /// Stop counting without touching the remaining time
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continue from the current remaining time
    ///
    /// Returns whether the timer is now running.
    pub fn resume(&mut self) -> bool {
        if self.time_remaining > 0 && !self.running {
            self.running = true;
        }
        self.running
    }

    /// Stop and restore the remaining time to the last started total
    pub fn reset(&mut self) {
        self.running = false;
        self.time_remaining = self.total_time;
    }

    /// Force completion now, as if the time had run out
    pub fn skip(&mut self) -> TimerEvent {
        self.running = false;
        self.time_remaining = 0;
        TimerEvent::Completed
    }

    /// Abandon the countdown without completing it
    pub fn cancel(&mut self) {
        self.running = false;
        self.time_remaining = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn total_time(&self) -> u32 {
        self.total_time
    }

    /// Fraction of the countdown already elapsed, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        f64::from(self.total_time - self.time_remaining) / f64::from(self.total_time)
    }
}
