// src/ledger.rs - Per-round score deltas and streak bonuses
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    Positive,
    Negative,
    Neutral,
    /// Positive round following a positive round; the delta counts twice.
    Bonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub kind: OutcomeKind,
    pub delta: i32,
    /// Points added to the total this round (delta, or twice delta on a bonus)
    pub awarded: i32,
}

#[derive(Debug, Clone)]
pub struct ScoreLedger {
    history: Vec<i32>,
    total: i32,
    match_threshold: i32,
}

impl ScoreLedger {
    // Previous rounds that must be on record before a streak can pay out
    const STREAK_WINDOW: usize = 2;

    pub fn new(match_threshold: i32) -> Self {
        Self {
            history: vec![0],
            total: 0,
            match_threshold,
        }
    }

    pub fn record_round(&mut self, match_count: usize) -> RoundOutcome {
        let matches = i32::try_from(match_count).unwrap_or(i32::MAX);
        let delta = matches.saturating_sub(self.match_threshold);

        // Streak eligibility is judged on what was on record before this round
        let eligible = self.history.len() > Self::STREAK_WINDOW;

        self.history.push(delta);
        self.total += delta;

        let kind = if delta > 0 {
            if eligible && self.streak_is_positive() {
                self.total += delta;
                OutcomeKind::Bonus
            } else {
                OutcomeKind::Positive
            }
        } else if delta < 0 {
            OutcomeKind::Negative
        } else {
            OutcomeKind::Neutral
        };

        let awarded = if kind == OutcomeKind::Bonus { delta * 2 } else { delta };
        RoundOutcome { kind, delta, awarded }
    }

    fn streak_is_positive(&self) -> bool {
        self.history
            .iter()
            .rev()
            .take(Self::STREAK_WINDOW)
            .all(|&d| d > 0)
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    /// Seed 0 followed by one delta per scored round.
    pub fn history(&self) -> &[i32] {
        &self.history
    }

    pub fn rounds_scored(&self) -> usize {
        self.history.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_against_threshold() {
        let mut ledger = ScoreLedger::new(4);
        assert_eq!(ledger.record_round(6).kind, OutcomeKind::Positive);
        assert_eq!(ledger.record_round(4).kind, OutcomeKind::Neutral);
        let outcome = ledger.record_round(1);
        assert_eq!(outcome.kind, OutcomeKind::Negative);
        assert_eq!(outcome.delta, -3);
        assert_eq!(ledger.total(), 2 + 0 - 3);
    }

    #[test]
    fn test_history_grows_by_one_per_round() {
        let mut ledger = ScoreLedger::new(4);
        assert_eq!(ledger.history(), &[0]);
        for n in 1..=5 {
            ledger.record_round(n);
            assert_eq!(ledger.history().len(), n + 1);
            assert_eq!(ledger.rounds_scored(), n);
        }
    }

    #[test]
    fn test_streak_bonus_on_third_round() {
        let mut ledger = ScoreLedger::new(4);
        let outcomes: Vec<_> = [6, 5, 6].iter().map(|&m| ledger.record_round(m)).collect();

        assert_eq!(outcomes.iter().map(|o| o.delta).collect::<Vec<_>>(), vec![2, 1, 2]);
        assert_eq!(outcomes[0].kind, OutcomeKind::Positive);
        assert_eq!(outcomes[1].kind, OutcomeKind::Positive);
        assert_eq!(outcomes[2].kind, OutcomeKind::Bonus);
        assert_eq!(outcomes[2].awarded, 4);
        assert_eq!(ledger.total(), 7);
    }

    #[test]
    fn test_streak_broken_by_non_positive_round() {
        let mut ledger = ScoreLedger::new(4);
        ledger.record_round(8);
        ledger.record_round(8);
        ledger.record_round(4);
        let outcome = ledger.record_round(6);
        assert_eq!(outcome.kind, OutcomeKind::Positive);

        let outcome = ledger.record_round(6);
        assert_eq!(outcome.kind, OutcomeKind::Bonus);
    }

    #[test]
    fn test_negative_round_never_earns_bonus() {
        let mut ledger = ScoreLedger::new(4);
        ledger.record_round(8);
        ledger.record_round(8);
        let outcome = ledger.record_round(0);
        assert_eq!(outcome.kind, OutcomeKind::Negative);
        assert_eq!(outcome.awarded, -4);
    }
}
