// src/clock.rs - Fixed-period round countdown
use crate::config::GameConfig;

/// Whether the current round has been scored yet. Flips once per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingScore,
    Scored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    pub tick: u32,
    pub phase: RoundPhase,
}

impl RoundState {
    fn fresh() -> Self {
        Self {
            tick: 0,
            phase: RoundPhase::AwaitingScore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    ScoreDue,
    RoundComplete,
}

#[derive(Debug, Clone)]
pub struct RoundClock {
    state: RoundState,
    tick_period_ms: u64,
    ticks_per_round: u32,
    scoring_tick: u32,
    cycle_ms: u64,
    cap_ms: u64,
}

impl RoundClock {
    pub fn new(config: &GameConfig) -> Self {
        let round_ms = config.tick_period_ms * u64::from(config.ticks_per_round);
        Self {
            state: RoundState::fresh(),
            tick_period_ms: config.tick_period_ms,
            ticks_per_round: config.ticks_per_round,
            scoring_tick: config.scoring_tick,
            cycle_ms: config.tick_period_ms * u64::from(config.countdown_cycle_ticks),
            cap_ms: round_ms.saturating_sub(config.tick_period_ms),
        }
    }

    /// Advance one period. At most one signal is produced per tick.
    pub fn tick(&mut self) -> Option<ClockSignal> {
        self.state.tick += 1;

        if self.state.tick >= self.ticks_per_round {
            self.state = RoundState::fresh();
            return Some(ClockSignal::RoundComplete);
        }

        if self.state.tick == self.scoring_tick && self.state.phase == RoundPhase::AwaitingScore {
            self.state.phase = RoundPhase::Scored;
            return Some(ClockSignal::ScoreDue);
        }

        None
    }

    pub fn reset(&mut self) {
        self.state = RoundState::fresh();
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Seconds left in the round, rounded to one decimal place.
    pub fn seconds_remaining(&self) -> f64 {
        let elapsed = (u64::from(self.state.tick) * self.tick_period_ms) % self.cycle_ms.max(1);
        let remaining_ms = self.cap_ms.saturating_sub(elapsed);
        let seconds = (remaining_ms as f64 / 1000.0 * 10.0).round() / 10.0;
        // Avoid rendering "-0.0"
        if seconds == 0.0 { 0.0 } else { seconds }
    }

    pub fn countdown_label(&self) -> String {
        format!("{:.1}", self.seconds_remaining())
    }
}
