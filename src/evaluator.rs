// src/evaluator.rs - Round-scoped wrapper around the point matcher
use crate::geometry::PointMatcher;
use crate::pose::{LiveKeypoints, Pose};

pub struct MatchEvaluator {
    matcher: Box<dyn PointMatcher>,
    last_scored_round: Option<u64>,
}

impl MatchEvaluator {
    pub fn new(matcher: Box<dyn PointMatcher>) -> Self {
        Self {
            matcher,
            last_scored_round: None,
        }
    }

    /// Current match count. Free to call every frame, never scores anything.
    pub fn count(&self, target: &Pose, live: &LiveKeypoints) -> usize {
        self.matcher.point_matches(target, live)
    }

    /// Match count for scoring `round`. Returns `None` if the round was already evaluated.
    pub fn evaluate(&mut self, round: u64, target: &Pose, live: &LiveKeypoints) -> Option<usize> {
        if self.last_scored_round == Some(round) {
            return None;
        }
        self.last_scored_round = Some(round);
        Some(self.matcher.point_matches(target, live))
    }
}

impl std::fmt::Debug for MatchEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEvaluator")
            .field("last_scored_round", &self.last_scored_round)
            .finish()
    }
}
