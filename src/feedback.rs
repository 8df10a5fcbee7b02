// src/feedback.rs - Flavor text for round feedback and the session summary
use crate::ledger::OutcomeKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const GOOD_MOVE_MESSAGES: &[&str] = &[
    "Great Move!",
    "Admirable!", "Amazing!", "Arresting!", "Astonishing!", "Astounding!", "Awesome!",
    "Awe-inspiring!", "Beautiful!", "Breathtaking!", "Brilliant!", "Capital!", "Captivating!",
    "Clever!", "Commendable!", "Delightful!", "Distinguished!", "Distinctive!", "Engaging!",
    "Enjoyable!", "Estimable!", "Excellent!", "Exceptional!", "Exemplary!", "Exquisite!",
    "Extraordinary!", "Fabulous!", "Fantastic!", "Fascinating!", "Finest!", "First-rate!",
    "Flawless!", "Four-star!", "Glorious!", "Grand!", "Impressive!", "Incomparable!",
    "Incredible!", "Inestimable!", "Invaluable!", "Laudable!", "Lovely!", "Magnificent!",
    "Marvelous!", "Masterful!", "Mind-blowing!", "Mind-boggling!", "Miraculous!", "Monumental!",
    "Notable!", "Out of sight!", "Out of this world!", "Outstanding!", "Overwhelming!",
    "Peerless!", "Perfect!", "Phenomenal!", "Praiseworthy!", "Priceless!", "Rapturous!",
    "Rare!", "Refreshing!", "Remarkable!", "Sensational!", "Singular!", "Skillful!",
    "Smashing!", "Solid!", "Special!", "Spectacular!", "Splendid!", "Splendiferous!",
    "Splendorous!", "Staggering!", "Sterling!", "Striking!", "Stunning!", "Stupendous!",
    "Super!", "Superb!", "Super-duper!", "Superior!", "Superlative!", "Supreme!",
    "Surprising!", "Terrific!", "Thumbs up!", "Thrilling!", "Tiptop!", "Top-notch!",
    "Transcendent!", "Tremendous!", "Unbelievable!", "Uncommon!", "Unique!", "Unparalleled!",
    "Unprecedented!", "Wonderful!", "Wondrous!", "World-class!",
];

pub const BAD_MOVE_MESSAGES: &[&str] = &[
    "Ouch!!",
    "Mmmmm!",
    "Haven't seen that before!",
    "Brave choice of move!",
];

pub const AVERAGE_MESSAGE: &str = "Pretty average";
pub const BONUS_MESSAGE: &str = "!!!!BONUS BOOST!!!!";

pub fn summary_message(final_score: i32) -> &'static str {
    if final_score < 0 {
        "Room for improvement :-("
    } else {
        "Noice! :-)"
    }
}

/// Picks round messages uniformly at random. Not part of scoring.
#[derive(Debug, Clone)]
pub struct FeedbackMessages {
    rng: StdRng,
}

impl FeedbackMessages {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn message_for(&mut self, kind: OutcomeKind) -> String {
        match kind {
            OutcomeKind::Positive => self.pick(GOOD_MOVE_MESSAGES).to_string(),
            OutcomeKind::Bonus => format!("{}\n{}", self.pick(GOOD_MOVE_MESSAGES), BONUS_MESSAGE),
            OutcomeKind::Negative => self.pick(BAD_MOVE_MESSAGES).to_string(),
            OutcomeKind::Neutral => AVERAGE_MESSAGE.to_string(),
        }
    }

    fn pick(&mut self, table: &'static [&'static str]) -> &'static str {
        table[self.rng.random_range(0..table.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_come_from_matching_table() {
        let mut feedback = FeedbackMessages::new(Some(7));
        for _ in 0..20 {
            assert!(GOOD_MOVE_MESSAGES.contains(&feedback.message_for(OutcomeKind::Positive).as_str()));
            assert!(BAD_MOVE_MESSAGES.contains(&feedback.message_for(OutcomeKind::Negative).as_str()));
        }
        assert_eq!(feedback.message_for(OutcomeKind::Neutral), AVERAGE_MESSAGE);
        assert!(feedback.message_for(OutcomeKind::Bonus).ends_with(BONUS_MESSAGE));
    }

    #[test]
    fn test_good_move_table_is_complete() {
        assert_eq!(GOOD_MOVE_MESSAGES.len(), 100);
        assert!(GOOD_MOVE_MESSAGES.contains(&"Fantastic!"));
        assert!(GOOD_MOVE_MESSAGES.iter().all(|m| m.ends_with('!')));
    }

    #[test]
    fn test_seeded_selection_is_repeatable() {
        let mut a = FeedbackMessages::new(Some(42));
        let mut b = FeedbackMessages::new(Some(42));
        for _ in 0..10 {
            assert_eq!(a.message_for(OutcomeKind::Positive), b.message_for(OutcomeKind::Positive));
        }
    }

    #[test]
    fn test_summary_message_by_sign() {
        assert_eq!(summary_message(-1), "Room for improvement :-(");
        assert_eq!(summary_message(0), "Noice! :-)");
        assert_eq!(summary_message(12), "Noice! :-)");
    }
}
