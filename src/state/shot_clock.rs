use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

/// Length of one countdown step.
pub const TICK: Duration = Duration::from_secs(1);

/// Operating mode of the attack timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    /// Counting down; `next_tick` is the logical time of the next decrement.
    Running { next_tick: Duration },
    Paused,
}

/// Observable state of the shot clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShotClockState {
    pub seconds_remaining: u32,
    pub running: bool,
    pub paused: bool,
}

/// Notifications produced while time elapses on a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotClockEvent {
    /// One second elapsed; `remaining` is the value after the decrement.
    Tick { remaining: u32 },
    /// The countdown reached zero. Emitted once per run.
    Expired,
}

/// Whole-second countdown with explicit pause/resume.
///
/// The clock never reads time on its own: callers pass the current logical
/// time and call [`ShotClock::advance`] whenever [`ShotClock::next_deadline`]
/// has passed. Leaving the running mode drops the deadline, which is how a
/// pending tick gets cancelled.
#[derive(Debug, Clone)]
pub struct ShotClock {
    remaining: u32,
    mode: Mode,
}

impl ShotClock {
    /// Build an idle clock loaded with `duration` seconds.
    pub fn new(duration: u32) -> Self {
        Self {
            remaining: duration,
            mode: Mode::Idle,
        }
    }

    /// Restart the countdown from `duration`, cancelling any run in progress.
    pub fn start(&mut self, duration: u32, now: Duration) {
        self.remaining = duration;
        self.mode = if duration == 0 {
            Mode::Idle
        } else {
            Mode::Running {
                next_tick: now + TICK,
            }
        };
    }

    /// Stop ticking while keeping the remaining time. No-op unless running.
    pub fn pause(&mut self) {
        if matches!(self.mode, Mode::Running { .. }) {
            self.mode = Mode::Paused;
        }
    }

    /// Continue a paused countdown. The next tick lands one full second later.
    pub fn resume(&mut self, now: Duration) {
        if self.mode == Mode::Paused && self.remaining > 0 {
            self.mode = Mode::Running {
                next_tick: now + TICK,
            };
        }
    }

    /// Cancel ticking and reload `duration`; the clock stays idle until started.
    pub fn reset(&mut self, duration: u32) {
        self.remaining = duration;
        self.mode = Mode::Idle;
    }

    /// Apply every tick that elapsed up to `now`.
    pub fn advance(&mut self, now: Duration) -> Vec<ShotClockEvent> {
        let mut events = Vec::new();

        while let Mode::Running { next_tick } = self.mode {
            if next_tick > now {
                break;
            }

            self.remaining = self.remaining.saturating_sub(1);
            events.push(ShotClockEvent::Tick {
                remaining: self.remaining,
            });

            if self.remaining == 0 {
                self.mode = Mode::Idle;
                events.push(ShotClockEvent::Expired);
            } else {
                self.mode = Mode::Running {
                    next_tick: next_tick + TICK,
                };
            }
        }

        events
    }

    /// Logical time at which the next tick is due, if the clock is running.
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.mode {
            Mode::Running { next_tick } => Some(next_tick),
            _ => None,
        }
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        matches!(self.mode, Mode::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        self.mode == Mode::Paused
    }

    pub fn state(&self) -> ShotClockState {
        ShotClockState {
            seconds_remaining: self.remaining,
            running: self.is_running(),
            paused: self.is_paused(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn new_clock_is_idle_with_full_duration() {
        let clock = ShotClock::new(24);
        assert_eq!(
            clock.state(),
            ShotClockState {
                seconds_remaining: 24,
                running: false,
                paused: false,
            }
        );
        assert_eq!(clock.next_deadline(), None);
    }

    #[test]
    fn ticks_once_per_elapsed_second() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));

        assert!(clock.advance(Duration::from_millis(999)).is_empty());
        assert_eq!(
            clock.advance(secs(1)),
            vec![ShotClockEvent::Tick { remaining: 23 }]
        );
        assert_eq!(
            clock.advance(secs(3)),
            vec![
                ShotClockEvent::Tick { remaining: 22 },
                ShotClockEvent::Tick { remaining: 21 },
            ]
        );
        assert_eq!(clock.next_deadline(), Some(secs(4)));
    }

    #[test]
    fn expiry_fires_once_and_stops_at_zero() {
        let mut clock = ShotClock::new(3);
        clock.start(3, secs(0));

        let events = clock.advance(secs(10));
        assert_eq!(
            events,
            vec![
                ShotClockEvent::Tick { remaining: 2 },
                ShotClockEvent::Tick { remaining: 1 },
                ShotClockEvent::Tick { remaining: 0 },
                ShotClockEvent::Expired,
            ]
        );
        assert!(!clock.is_running());
        assert_eq!(clock.seconds_remaining(), 0);
        assert!(clock.advance(secs(20)).is_empty());
    }

    #[test]
    fn pause_twice_equals_pause_once() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));
        clock.advance(secs(2));

        clock.pause();
        let once = clock.state();
        clock.pause();
        assert_eq!(clock.state(), once);
        assert!(once.paused);
        assert!(!once.running);
        assert_eq!(once.seconds_remaining, 22);
    }

    #[test]
    fn paused_clock_does_not_tick() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));
        clock.pause();
        assert_eq!(clock.next_deadline(), None);
        assert!(clock.advance(secs(30)).is_empty());
        assert_eq!(clock.seconds_remaining(), 24);
    }

    #[test]
    fn resume_waits_a_full_second() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));
        clock.advance(secs(1));
        clock.pause();

        clock.resume(Duration::from_millis(1700));
        assert!(clock.advance(Duration::from_millis(2600)).is_empty());
        assert_eq!(
            clock.advance(Duration::from_millis(2700)),
            vec![ShotClockEvent::Tick { remaining: 22 }]
        );
    }

    #[test]
    fn resume_without_remaining_time_is_noop() {
        let mut clock = ShotClock::new(1);
        clock.start(1, secs(0));
        clock.advance(secs(1));
        assert_eq!(clock.seconds_remaining(), 0);

        clock.resume(secs(2));
        assert!(!clock.is_running());
        assert!(!clock.is_paused());
    }

    #[test]
    fn resume_when_not_paused_is_noop() {
        let mut clock = ShotClock::new(24);
        clock.resume(secs(0));
        assert!(!clock.is_running());

        clock.start(24, secs(0));
        clock.resume(Duration::from_millis(500));
        assert_eq!(clock.next_deadline(), Some(secs(1)));
    }

    #[test]
    fn pause_while_idle_is_noop() {
        let mut clock = ShotClock::new(24);
        clock.pause();
        assert!(!clock.is_paused());
    }

    #[test]
    fn reset_cancels_pending_tick() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));
        clock.advance(secs(5));
        clock.reset(24);

        assert_eq!(clock.next_deadline(), None);
        assert!(clock.advance(secs(60)).is_empty());
        assert_eq!(clock.state().seconds_remaining, 24);
        assert!(!clock.state().paused);
    }

    #[test]
    fn start_restarts_a_running_countdown() {
        let mut clock = ShotClock::new(24);
        clock.start(24, secs(0));
        clock.advance(secs(10));
        clock.start(24, secs(10));
        assert_eq!(clock.seconds_remaining(), 24);
        assert_eq!(clock.next_deadline(), Some(secs(11)));
    }
}
