// src/calibration.rs - One-shot and continuous calibration of the target pose
use crate::geometry::CalibrationGeometry;
use crate::pose::{Pose, ShoulderPair, Skeleton};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationPhase {
    Uncalibrated,
    /// Terminal for the session. The reference pair never changes once stored.
    Calibrated { reference: ShoulderPair },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationStep {
    /// No shoulder pair in the live skeleton; retried on the next invocation.
    Missed,
    /// The one-shot transition happened on this invocation.
    Calibrated,
    /// Continuous re-anchoring to the stored reference. `magnetized` carries a
    /// frame-only copy pulled onto the live shoulders when the player is close.
    Anchored { magnetized: Option<Pose> },
}

#[derive(Debug, Clone)]
pub struct CalibrationCoordinator {
    phase: CalibrationPhase,
    near_success_matches: usize,
}

impl CalibrationCoordinator {
    pub fn new(near_success_matches: usize) -> Self {
        Self {
            phase: CalibrationPhase::Uncalibrated,
            near_success_matches,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.phase, CalibrationPhase::Calibrated { .. })
    }

    /// Safe to call every frame. `count_matches` is only consulted in the
    /// calibrated phase, after re-anchoring to the reference.
    pub fn maybe_calibrate(
        &mut self,
        target: &mut Pose,
        live_skeleton: &Skeleton,
        geometry: &dyn CalibrationGeometry,
        count_matches: impl FnOnce(&Pose) -> usize,
    ) -> CalibrationStep {
        match self.phase {
            CalibrationPhase::Uncalibrated => {
                let Some(pair) = live_skeleton.shoulder_pair() else {
                    debug!("Shoulder pair not visible, calibration retried next frame");
                    return CalibrationStep::Missed;
                };
                if pair.is_degenerate() {
                    debug!(
                        "Shoulders coincide at ({:.1}, {:.1}), calibration retried next frame",
                        pair.midpoint().x,
                        pair.midpoint().y
                    );
                    return CalibrationStep::Missed;
                }

                geometry.calibrate(target, &pair);
                self.phase = CalibrationPhase::Calibrated { reference: pair };
                info!(
                    "Calibrated target to shoulders at ({:.1}, {:.1}) width {:.1}",
                    pair.midpoint().x,
                    pair.midpoint().y,
                    pair.width()
                );
                CalibrationStep::Calibrated
            }
            CalibrationPhase::Calibrated { reference } => {
                geometry.scale_and_shift(target, &reference);

                let matches = count_matches(&*target);
                if matches <= self.near_success_matches {
                    return CalibrationStep::Anchored { magnetized: None };
                }

                let magnetized = live_skeleton
                    .shoulder_pair()
                    .filter(|live_pair| !live_pair.is_degenerate())
                    .map(|live_pair| {
                        let mut pulled = target.clone();
                        geometry.scale_and_shift(&mut pulled, &live_pair);
                        pulled
                    });
                CalibrationStep::Anchored { magnetized }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ShoulderFrameGeometry;
    use crate::pose::tests::standing_pose;
    use crate::pose::BodyPart;
    use std::cell::Cell;

    #[test]
    fn test_missing_shoulders_leave_target_untouched() {
        let mut coordinator = CalibrationCoordinator::new(4);
        let mut target = standing_pose(100.0, 200.0, 0.9);
        let before = target.clone();

        let mut live = standing_pose(300.0, 420.0, 0.9);
        live.keypoints.remove(&BodyPart::LeftShoulder);
        let skeleton = live.skeleton(0.5);

        for _ in 0..5 {
            let step = coordinator.maybe_calibrate(&mut target, &skeleton, &ShoulderFrameGeometry, |_| 0);
            assert_eq!(step, CalibrationStep::Missed);
        }
        assert_eq!(coordinator.phase(), CalibrationPhase::Uncalibrated);
        assert_eq!(target, before);
    }

    #[test]
    fn test_single_transition_then_continuous_branch() {
        let mut coordinator = CalibrationCoordinator::new(4);
        let mut target = standing_pose(100.0, 200.0, 0.9);
        let skeleton = standing_pose(300.0, 420.0, 0.9).skeleton(0.5);
        let counted = Cell::new(0);

        let step = coordinator.maybe_calibrate(&mut target, &skeleton, &ShoulderFrameGeometry, |_| {
            counted.set(counted.get() + 1);
            0
        });
        assert_eq!(step, CalibrationStep::Calibrated);
        assert_eq!(counted.get(), 0);
        assert!(coordinator.is_calibrated());

        for _ in 0..3 {
            let step = coordinator.maybe_calibrate(&mut target, &skeleton, &ShoulderFrameGeometry, |_| {
                counted.set(counted.get() + 1);
                2
            });
            assert_eq!(step, CalibrationStep::Anchored { magnetized: None });
        }
        assert_eq!(counted.get(), 3);

        let shoulders = target.shoulder_pair().unwrap();
        assert!((shoulders.right.position.x - 300.0).abs() < 1e-9);
        assert!((shoulders.left.position.x - 420.0).abs() < 1e-9);
    }

    #[test]
    fn test_magnetism_does_not_move_reference() {
        let mut coordinator = CalibrationCoordinator::new(4);
        let mut target = standing_pose(100.0, 200.0, 0.9);
        let first = standing_pose(300.0, 420.0, 0.9).skeleton(0.5);
        coordinator.maybe_calibrate(&mut target, &first, &ShoulderFrameGeometry, |_| 0);
        let reference = coordinator.phase();

        // Player drifted right and is close to the pose
        let drifted = standing_pose(340.0, 460.0, 0.9).skeleton(0.5);
        let step = coordinator.maybe_calibrate(&mut target, &drifted, &ShoulderFrameGeometry, |_| 6);

        let CalibrationStep::Anchored { magnetized: Some(pulled) } = &step else {
            panic!("expected a magnetized frame, got {step:?}");
        };
        let pulled_shoulders = pulled.shoulder_pair().unwrap();
        assert!((pulled_shoulders.right.position.x - 340.0).abs() < 1e-9);

        // The stored target and reference stay on the calibrated frame
        assert_eq!(coordinator.phase(), reference);
        let shoulders = target.shoulder_pair().unwrap();
        assert!((shoulders.right.position.x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_shoulders_do_not_calibrate() {
        let mut coordinator = CalibrationCoordinator::new(4);
        let mut target = standing_pose(100.0, 200.0, 0.9);
        let before = target.clone();

        // Detector glitch: both shoulders on one point
        let glitch = standing_pose(150.0, 150.0, 0.9).skeleton(0.5);
        let step = coordinator.maybe_calibrate(&mut target, &glitch, &ShoulderFrameGeometry, |_| 0);
        assert_eq!(step, CalibrationStep::Missed);
        assert_eq!(coordinator.phase(), CalibrationPhase::Uncalibrated);
        assert_eq!(target, before);

        // The next good frame calibrates normally
        let good = standing_pose(300.0, 420.0, 0.9).skeleton(0.5);
        let step = coordinator.maybe_calibrate(&mut target, &good, &ShoulderFrameGeometry, |_| 0);
        assert_eq!(step, CalibrationStep::Calibrated);
        assert!((target.shoulder_pair().unwrap().width() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_live_pair_is_not_magnetized() {
        let mut coordinator = CalibrationCoordinator::new(4);
        let mut target = standing_pose(100.0, 200.0, 0.9);
        let first = standing_pose(300.0, 420.0, 0.9).skeleton(0.5);
        coordinator.maybe_calibrate(&mut target, &first, &ShoulderFrameGeometry, |_| 0);

        let glitch = standing_pose(150.0, 150.0, 0.9).skeleton(0.5);
        let step = coordinator.maybe_calibrate(&mut target, &glitch, &ShoulderFrameGeometry, |_| 8);
        assert_eq!(step, CalibrationStep::Anchored { magnetized: None });
        assert!((target.shoulder_pair().unwrap().width() - 120.0).abs() < 1e-9);
    }
}
