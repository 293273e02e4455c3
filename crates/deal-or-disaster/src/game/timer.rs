use serde::Serialize;

use super::evaluator::Decision;

pub const DEFAULT_CASE_SECONDS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Running,
    Expired,
    /// A decision arrived before the budget ran out.
    Stopped,
}

/// Decision synthesized when the clock runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedDecision {
    pub decision: Decision,
    pub time_taken: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Running { remaining: u32 },
    Expired(ForcedDecision),
    Idle,
}

/// Per-case countdown, advanced one second per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    budget: u32,
    remaining: u32,
    state: TimerState,
}

impl SessionTimer {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: budget,
            state: TimerState::Running,
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.budget - self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Expiry fires exactly once; ticks after that, or after `stop`, are idle.
    pub fn tick(&mut self) -> TimerTick {
        if self.state != TimerState::Running {
            return TimerTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire()
        } else {
            TimerTick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Apply several seconds at once, stopping at expiry.
    pub fn advance(&mut self, seconds: u32) -> TimerTick {
        let mut last = TimerTick::Idle;
        for _ in 0..seconds {
            last = self.tick();
            if !matches!(last, TimerTick::Running { .. }) {
                break;
            }
        }
        last
    }

    /// Run the clock out immediately.
    pub fn force_expire(&mut self) -> TimerTick {
        if self.state != TimerState::Running {
            return TimerTick::Idle;
        }
        self.expire()
    }

    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
    }

    fn expire(&mut self) -> TimerTick {
        self.remaining = 0;
        self.state = TimerState::Expired;
        TimerTick::Expired(ForcedDecision {
            decision: Decision::WalkAway,
            time_taken: self.budget,
        })
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(DEFAULT_CASE_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once_with_full_budget() {
        let mut timer = SessionTimer::default();
        let mut forced = Vec::new();

        for _ in 0..400 {
            if let TimerTick::Expired(decision) = timer.tick() {
                forced.push(decision);
            }
        }

        assert_eq!(
            forced,
            vec![ForcedDecision {
                decision: Decision::WalkAway,
                time_taken: 300,
            }]
        );
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn stop_cancels_countdown() {
        let mut timer = SessionTimer::new(10);
        timer.tick();
        timer.stop();
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert_eq!(timer.remaining(), 9);
        assert_eq!(timer.elapsed(), 1);
        assert_eq!(timer.force_expire(), TimerTick::Idle);
    }

    #[test]
    fn advance_stops_at_expiry() {
        let mut timer = SessionTimer::new(5);
        assert_eq!(timer.advance(3), TimerTick::Running { remaining: 2 });
        assert!(matches!(timer.advance(10), TimerTick::Expired(_)));
        assert_eq!(timer.advance(10), TimerTick::Idle);
    }
}
