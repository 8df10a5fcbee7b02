// src/engine.rs - Challenge engine: round lifecycle across the render loop and countdown timer
use crate::calibration::{CalibrationCoordinator, CalibrationPhase, CalibrationStep};
use crate::clock::{ClockSignal, RoundClock};
use crate::config::GameConfig;
use crate::evaluator::MatchEvaluator;
use crate::feedback::{summary_message, FeedbackMessages};
use crate::geometry::{CalibrationGeometry, PointMatcher, ShoulderFrameGeometry, ToleranceMatcher};
use crate::ledger::{OutcomeKind, ScoreLedger};
use crate::pose::{LiveKeypoints, Pose, Skeleton};
use crate::sequencer::{Advance, DanceSequencer, Playlist};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalibrationStatus {
    /// Session started, waiting out the setup delay
    Starting,
    /// Setup delay elapsed but no shoulder pair seen yet
    Searching,
    Calibrated,
}

/// Events for the rendering side. Colors and layout are its business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    ScoreFeedback {
        outcome: OutcomeKind,
        delta: i32,
        message: String,
    },
    CountdownTick {
        seconds_remaining: String,
    },
    SessionComplete {
        final_score: i32,
        message: String,
    },
    CalibrationStatus {
        phase: CalibrationStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    /// Target loaded, setup delay running. Frames are tracked, the countdown is not.
    Setup,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub round: u64,
    pub match_count: usize,
    pub delta: i32,
    pub awarded: i32,
    pub outcome: OutcomeKind,
    pub total: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub final_score: i32,
    pub history: Vec<i32>,
    pub rounds: Vec<RoundRecord>,
    /// False when the session was cancelled before the playlist ran out
    pub completed: bool,
}

/// The round target. A malformed move leaves the previous pose on screen as `Stale`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TargetSlot {
    #[default]
    Empty,
    /// Loaded for the current round and scored at the scoring tick
    Active(Pose),
    /// Kept for display only; the round is not scored
    Stale(Pose),
}

impl TargetSlot {
    pub fn pose(&self) -> Option<&Pose> {
        match self {
            TargetSlot::Active(pose) | TargetSlot::Stale(pose) => Some(pose),
            TargetSlot::Empty => None,
        }
    }

    fn pose_mut(&mut self) -> Option<&mut Pose> {
        match self {
            TargetSlot::Active(pose) | TargetSlot::Stale(pose) => Some(pose),
            TargetSlot::Empty => None,
        }
    }

    fn scorable(&self) -> Option<&Pose> {
        match self {
            TargetSlot::Active(pose) => Some(pose),
            _ => None,
        }
    }

    fn stall(&mut self) {
        *self = match std::mem::take(self) {
            TargetSlot::Active(pose) | TargetSlot::Stale(pose) => TargetSlot::Stale(pose),
            TargetSlot::Empty => TargetSlot::Empty,
        };
    }
}

pub struct ChallengeEngine {
    config: GameConfig,
    status: SessionStatus,
    sequencer: DanceSequencer,
    clock: RoundClock,
    ledger: ScoreLedger,
    evaluator: MatchEvaluator,
    calibration: CalibrationCoordinator,
    geometry: Box<dyn CalibrationGeometry>,
    feedback: FeedbackMessages,
    target: TargetSlot,
    // Magnetized copy of the target for the current frame only
    frame_target: Option<Pose>,
    live_pose: Option<Pose>,
    live_keypoints: LiveKeypoints,
    round: u64,
    rounds: Vec<RoundRecord>,
}

impl ChallengeEngine {
    pub fn new(config: GameConfig, playlist: Playlist) -> Self {
        let matcher = ToleranceMatcher::new(config.match_tolerance, config.confidence_threshold);
        Self::with_collaborators(config, playlist, Box::new(matcher), Box::new(ShoulderFrameGeometry))
    }

    pub fn with_collaborators(
        config: GameConfig,
        playlist: Playlist,
        matcher: Box<dyn PointMatcher>,
        geometry: Box<dyn CalibrationGeometry>,
    ) -> Self {
        Self {
            status: SessionStatus::Idle,
            sequencer: DanceSequencer::new(playlist),
            clock: RoundClock::new(&config),
            ledger: ScoreLedger::new(config.match_threshold),
            evaluator: MatchEvaluator::new(matcher),
            calibration: CalibrationCoordinator::new(config.near_success_matches),
            geometry,
            feedback: FeedbackMessages::new(config.feedback_seed),
            target: TargetSlot::Empty,
            frame_target: None,
            live_pose: None,
            live_keypoints: LiveKeypoints::new(),
            round: 0,
            rounds: Vec::new(),
            config,
        }
    }

    /// Loads the first move and enters the setup phase.
    pub fn start(&mut self) -> Vec<EngineEvent> {
        if self.status != SessionStatus::Idle {
            warn!("Session already started ({:?}), ignoring start", self.status);
            return Vec::new();
        }

        info!("Starting session with {} dance moves", self.sequencer.playlist().len());
        self.status = SessionStatus::Setup;

        let mut events = vec![EngineEvent::CalibrationStatus {
            phase: CalibrationStatus::Starting,
        }];
        let advance = self.sequencer.advance();
        events.extend(self.apply_advance(advance));
        events
    }

    /// Setup delay elapsed: start the countdown and run the one-shot calibration.
    pub fn on_setup_elapsed(&mut self) -> Vec<EngineEvent> {
        if self.status != SessionStatus::Setup {
            return Vec::new();
        }

        self.status = SessionStatus::Playing;
        self.clock.reset();

        match self.run_calibration() {
            Some(CalibrationStep::Calibrated) => vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Calibrated,
            }],
            Some(CalibrationStep::Missed) | None => vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Searching,
            }],
            Some(CalibrationStep::Anchored { .. }) => Vec::new(),
        }
    }

    /// Render-rate entry point. Only the first live pose is used.
    pub fn on_frame(&mut self, live_poses: &[Pose]) -> Vec<EngineEvent> {
        if matches!(self.status, SessionStatus::Idle | SessionStatus::Finished) {
            return Vec::new();
        }

        self.live_pose = live_poses.first().cloned();
        self.live_keypoints = self
            .live_pose
            .as_ref()
            .map(|pose| pose.tracked_keypoints(self.config.confidence_threshold))
            .unwrap_or_default();

        // Calibration is armed once the setup delay has elapsed
        if self.status != SessionStatus::Playing {
            return Vec::new();
        }

        match self.run_calibration() {
            Some(CalibrationStep::Calibrated) => vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Calibrated,
            }],
            _ => Vec::new(),
        }
    }

    /// Countdown entry point, once per tick period.
    pub fn on_timer_tick(&mut self) -> Vec<EngineEvent> {
        if self.status != SessionStatus::Playing {
            return Vec::new();
        }

        let mut events = vec![EngineEvent::CountdownTick {
            seconds_remaining: self.clock.countdown_label(),
        }];

        match self.clock.tick() {
            Some(ClockSignal::ScoreDue) => events.extend(self.score_round()),
            Some(ClockSignal::RoundComplete) => {
                self.round += 1;
                let advance = self.sequencer.advance();
                events.extend(self.apply_advance(advance));
            }
            None => {}
        }

        events
    }

    fn run_calibration(&mut self) -> Option<CalibrationStep> {
        let target = self.target.pose_mut()?;
        let skeleton = self
            .live_pose
            .as_ref()
            .map(|pose| pose.skeleton(self.config.skeleton_confidence))
            .unwrap_or_else(Skeleton::default);

        let evaluator = &self.evaluator;
        let live = &self.live_keypoints;
        let step = self.calibration.maybe_calibrate(
            target,
            &skeleton,
            self.geometry.as_ref(),
            |anchored| evaluator.count(anchored, live),
        );

        self.frame_target = match &step {
            CalibrationStep::Anchored { magnetized } => magnetized.clone(),
            _ => None,
        };
        Some(step)
    }

    fn score_round(&mut self) -> Option<EngineEvent> {
        let Some(target) = self.target.scorable() else {
            debug!("Round {} has no target, skipping score", self.round);
            return None;
        };
        let match_count = self.evaluator.evaluate(self.round, target, &self.live_keypoints)?;

        let outcome = self.ledger.record_round(match_count);
        let message = self.feedback.message_for(outcome.kind);
        info!(
            "Round {}: {} matches, delta {:+}, {:?}, total {}",
            self.round,
            match_count,
            outcome.delta,
            outcome.kind,
            self.ledger.total()
        );

        self.rounds.push(RoundRecord {
            round: self.round,
            match_count,
            delta: outcome.delta,
            awarded: outcome.awarded,
            outcome: outcome.kind,
            total: self.ledger.total(),
        });

        Some(EngineEvent::ScoreFeedback {
            outcome: outcome.kind,
            delta: outcome.delta,
            message,
        })
    }

    fn apply_advance(&mut self, advance: Advance) -> Option<EngineEvent> {
        match advance {
            Advance::NextMove(pose) => {
                debug!("Round {} target loaded", self.round);
                self.target = TargetSlot::Active(pose);
                self.frame_target = None;
                None
            }
            Advance::Malformed { index } => {
                warn!("Dance move {} has no usable target pose, keeping the previous target", index);
                self.target.stall();
                None
            }
            Advance::GameComplete => {
                let final_score = self.ledger.total();
                self.status = SessionStatus::Finished;
                self.target.stall();
                info!("Playlist finished, final score {}", final_score);
                Some(EngineEvent::SessionComplete {
                    final_score,
                    message: summary_message(final_score).to_string(),
                })
            }
        }
    }

    pub fn report(&self, completed: bool) -> SessionReport {
        SessionReport {
            final_score: self.ledger.total(),
            history: self.ledger.history().to_vec(),
            rounds: self.rounds.clone(),
            completed,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn score(&self) -> i32 {
        self.ledger.total()
    }

    pub fn history(&self) -> &[i32] {
        self.ledger.history()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn countdown_label(&self) -> String {
        self.clock.countdown_label()
    }

    pub fn calibration_phase(&self) -> CalibrationPhase {
        self.calibration.phase()
    }

    /// The pose used for scoring this round, or shown while a malformed move plays out.
    pub fn target(&self) -> Option<&Pose> {
        self.target.pose()
    }

    pub fn target_slot(&self) -> &TargetSlot {
        &self.target
    }

    /// The pose to draw this frame, magnetized toward the player when they are close.
    pub fn display_target(&self) -> Option<&Pose> {
        self.frame_target.as_ref().or(self.target.pose())
    }

    pub fn live_keypoints(&self) -> &LiveKeypoints {
        &self.live_keypoints
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::tests::standing_pose;
    use crate::pose::{BodyPart, Keypoint};
    use crate::sequencer::DanceMove;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Hands out scripted match counts, one per call.
    struct ScriptedMatcher {
        counts: Arc<Mutex<VecDeque<usize>>>,
    }

    impl PointMatcher for ScriptedMatcher {
        fn point_matches(&self, _target: &Pose, _live: &LiveKeypoints) -> usize {
            self.counts.lock().unwrap().pop_front().unwrap_or(0)
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            feedback_seed: Some(1),
            ..GameConfig::default()
        }
    }

    fn playlist(n: usize) -> Playlist {
        let moves = (0..n)
            .map(|_| DanceMove::from_pose(standing_pose(100.0, 200.0, 0.9)))
            .collect();
        Playlist::new(moves).unwrap()
    }

    fn scripted_engine(n: usize, counts: &[usize]) -> ChallengeEngine {
        let matcher = ScriptedMatcher {
            counts: Arc::new(Mutex::new(counts.iter().copied().collect())),
        };
        ChallengeEngine::with_collaborators(config(), playlist(n), Box::new(matcher), Box::new(ShoulderFrameGeometry))
    }

    fn started(engine: &mut ChallengeEngine) {
        engine.start();
        engine.on_setup_elapsed();
    }

    #[test]
    fn test_start_loads_first_target_and_waits_for_setup() {
        let mut engine = ChallengeEngine::new(config(), playlist(2));
        let events = engine.start();

        assert_eq!(engine.status(), SessionStatus::Setup);
        assert!(engine.target().unwrap().is_target);
        assert_eq!(
            events,
            vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Starting
            }]
        );
        // Countdown does not run during setup
        assert!(engine.on_timer_tick().is_empty());
        assert!(engine.start().is_empty());
    }

    #[test]
    fn test_one_shot_calibration_reports_search_without_player() {
        let mut engine = ChallengeEngine::new(config(), playlist(2));
        engine.start();

        let events = engine.on_setup_elapsed();
        assert_eq!(
            events,
            vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Searching
            }]
        );
        assert_eq!(engine.calibration_phase(), CalibrationPhase::Uncalibrated);

        // Retried every frame until the shoulders show up
        assert!(engine.on_frame(&[]).is_empty());
        let events = engine.on_frame(&[standing_pose(300.0, 400.0, 0.9)]);
        assert_eq!(
            events,
            vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Calibrated
            }]
        );
        assert!(engine.on_frame(&[standing_pose(300.0, 400.0, 0.9)]).is_empty());
    }

    #[test]
    fn test_scores_exactly_once_per_round_under_frame_interleaving() {
        let mut engine = scripted_engine(4, &[6, 6, 6, 6, 6, 6, 6, 6]);
        started(&mut engine);
        let live = [standing_pose(100.0, 200.0, 0.9)];

        let mut feedback = 0;
        for tick in 0..30 {
            // Uneven render bursts between timer ticks
            for _ in 0..(tick * 7 % 5) {
                engine.on_frame(&live);
            }
            for event in engine.on_timer_tick() {
                if matches!(event, EngineEvent::ScoreFeedback { .. }) {
                    feedback += 1;
                }
            }
        }

        assert_eq!(feedback, 3);
        assert_eq!(engine.rounds().len(), 3);
        assert_eq!(engine.history().len(), 4);
    }

    #[test]
    fn test_streak_scenario_and_session_summary() {
        let mut engine = scripted_engine(3, &[6, 5, 6]);
        started(&mut engine);

        let mut events = Vec::new();
        for _ in 0..30 {
            events.extend(engine.on_timer_tick());
        }

        let outcomes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::ScoreFeedback { outcome, delta, .. } => Some((*outcome, *delta)),
                _ => None,
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                (OutcomeKind::Positive, 2),
                (OutcomeKind::Positive, 1),
                (OutcomeKind::Bonus, 2)
            ]
        );

        assert_eq!(engine.status(), SessionStatus::Finished);
        assert!(events.contains(&EngineEvent::SessionComplete {
            final_score: 7,
            message: "Noice! :-)".to_string()
        }));

        // Nothing is driven after the session ends
        assert!(engine.on_timer_tick().is_empty());
        assert!(engine.on_frame(&[standing_pose(1.0, 2.0, 0.9)]).is_empty());
    }

    #[test]
    fn test_negative_final_score_message() {
        let mut engine = scripted_engine(1, &[0]);
        started(&mut engine);

        let events: Vec<_> = (0..10).flat_map(|_| engine.on_timer_tick()).collect();
        assert_eq!(
            events.last(),
            Some(&EngineEvent::SessionComplete {
                final_score: -4,
                message: "Room for improvement :-(".to_string()
            })
        );
    }

    #[test]
    fn test_countdown_events_within_round() {
        let mut engine = scripted_engine(2, &[]);
        started(&mut engine);

        let labels: Vec<_> = (0..10)
            .flat_map(|_| engine.on_timer_tick())
            .filter_map(|e| match e {
                EngineEvent::CountdownTick { seconds_remaining } => Some(seconds_remaining),
                _ => None,
            })
            .collect();
        assert_eq!(labels.first().map(String::as_str), Some("0.9"));
        assert_eq!(labels.last().map(String::as_str), Some("0.0"));
        assert_eq!(labels.len(), 10);
    }

    #[test]
    fn test_malformed_move_skips_scoring_and_keeps_target() {
        let json = r#"[
            {"poses": [{"pose": {"keypoints": [
                {"part": "rightShoulder", "score": 0.9, "position": {"x": 1.0, "y": 2.0}},
                {"part": "leftShoulder", "score": 0.9, "position": {"x": 5.0, "y": 2.0}}
            ]}}]},
            {"poses": [null]},
            {"poses": [{"pose": {"keypoints": [
                {"part": "rightShoulder", "score": 0.9, "position": {"x": 9.0, "y": 2.0}}
            ]}}]}
        ]"#;
        let matcher = ScriptedMatcher {
            counts: Arc::new(Mutex::new(VecDeque::from(vec![5, 5, 5]))),
        };
        let mut engine = ChallengeEngine::with_collaborators(
            config(),
            Playlist::from_json(json).unwrap(),
            Box::new(matcher),
            Box::new(ShoulderFrameGeometry),
        );
        started(&mut engine);

        for _ in 0..10 {
            engine.on_timer_tick();
        }
        assert_eq!(engine.rounds().len(), 1);
        let kept = engine.target().unwrap().keypoint(BodyPart::RightShoulder).unwrap().position.x;
        assert_eq!(kept, 1.0);

        // Malformed round: no score, target unchanged
        engine.on_timer_tick();
        assert!(matches!(engine.target_slot(), TargetSlot::Stale(_)));
        for _ in 0..9 {
            engine.on_timer_tick();
        }
        assert_eq!(engine.rounds().len(), 1);

        for _ in 0..9 {
            engine.on_timer_tick();
        }
        assert_eq!(engine.rounds().len(), 2);
        let next = engine.target().unwrap().keypoint(BodyPart::RightShoulder).unwrap().position.x;
        assert_eq!(next, 9.0);
    }

    #[test]
    fn test_glitched_shoulders_before_setup_do_not_ruin_session() {
        let mut engine = ChallengeEngine::new(config(), playlist(3));
        engine.start();

        engine.on_frame(&[standing_pose(150.0, 150.0, 0.9)]);
        let events = engine.on_setup_elapsed();
        assert_eq!(
            events,
            vec![EngineEvent::CalibrationStatus {
                phase: CalibrationStatus::Searching
            }]
        );

        let player = [standing_pose(100.0, 200.0, 0.9)];
        for _ in 0..30 {
            engine.on_frame(&player);
            engine.on_timer_tick();
        }

        let deltas: Vec<i32> = engine.rounds().iter().map(|r| r.delta).collect();
        assert_eq!(deltas, vec![4, 4, 4]);
        assert_eq!(engine.score(), 16);
    }

    #[test]
    fn test_scoring_uses_most_recent_frame() {
        let mut engine = ChallengeEngine::new(config(), playlist(2));
        started(&mut engine);

        // Calibrate onto a player standing exactly on the target
        let on_target = standing_pose(100.0, 200.0, 0.9);
        engine.on_frame(&[on_target.clone()]);
        for _ in 0..8 {
            engine.on_timer_tick();
        }

        // Last frame before scoring has the arms far off
        let mut off = on_target.clone();
        for part in [BodyPart::LeftWrist, BodyPart::RightWrist, BodyPart::LeftElbow, BodyPart::RightElbow] {
            let kp = off.keypoints.get_mut(&part).unwrap();
            *kp = Keypoint::new(kp.position.x, kp.position.y + 400.0, 0.9);
        }
        engine.on_frame(&[on_target.clone()]);
        engine.on_frame(&[off]);

        let events = engine.on_timer_tick();
        assert!(events.contains(&EngineEvent::ScoreFeedback {
            outcome: OutcomeKind::Neutral,
            delta: 0,
            message: "Pretty average".to_string()
        }));
    }
}
