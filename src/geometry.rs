// src/geometry.rs - Point matching and shoulder-frame calibration collaborators
use crate::pose::{BodyPart, LiveKeypoints, Pose, ShoulderPair};
use nalgebra::{Point2, Vector2};

/// Counts how many tracked parts of the live body sit on the target pose.
pub trait PointMatcher: Send {
    fn point_matches(&self, target: &Pose, live: &LiveKeypoints) -> usize;
}

/// Reprojects a target pose onto the player's body.
pub trait CalibrationGeometry: Send {
    /// One-shot reprojection, including reflection when the target faces the other way.
    fn calibrate(&self, target: &mut Pose, reference: &ShoulderPair);

    /// Continuous re-anchoring: scale to the pair's width and move onto its midpoint.
    fn scale_and_shift(&self, target: &mut Pose, pair: &ShoulderPair);
}

#[derive(Debug, Clone)]
pub struct ToleranceMatcher {
    pub tolerance: f64,
    pub min_confidence: f64,
}

impl ToleranceMatcher {
    pub fn new(tolerance: f64, min_confidence: f64) -> Self {
        Self { tolerance, min_confidence }
    }
}

impl PointMatcher for ToleranceMatcher {
    fn point_matches(&self, target: &Pose, live: &LiveKeypoints) -> usize {
        BodyPart::TRACKED
            .iter()
            .filter(|part| {
                match (target.keypoint(**part), live.get(*part)) {
                    (Some(goal), Some(actual)) => {
                        actual.is_confident(self.min_confidence)
                            && goal.distance_to(actual) <= self.tolerance
                    }
                    _ => false,
                }
            })
            .count()
    }
}

/// Uses the shoulder line as the frame of reference for scale and position.
#[derive(Debug, Clone, Default)]
pub struct ShoulderFrameGeometry;

impl ShoulderFrameGeometry {
    fn mirror_if_reversed(target: &mut Pose, reference: &ShoulderPair) {
        let Some(own) = target.shoulder_pair() else {
            return;
        };

        let own_dir = own.left.position.x - own.right.position.x;
        let ref_dir = reference.left.position.x - reference.right.position.x;
        if own_dir * ref_dir >= 0.0 {
            return;
        }

        let axis = own.midpoint().x;
        target.map_positions(|p| Point2::new(2.0 * axis - p.x, p.y));
    }
}

impl CalibrationGeometry for ShoulderFrameGeometry {
    fn calibrate(&self, target: &mut Pose, reference: &ShoulderPair) {
        Self::mirror_if_reversed(target, reference);
        self.scale_and_shift(target, reference);
    }

    fn scale_and_shift(&self, target: &mut Pose, pair: &ShoulderPair) {
        let Some(own) = target.shoulder_pair() else {
            return;
        };

        if own.is_degenerate() || pair.is_degenerate() {
            return;
        }

        let scale = pair.width() / own.width();
        let from: Vector2<f64> = own.midpoint().coords;
        let to: Vector2<f64> = pair.midpoint().coords;
        target.map_positions(|p| Point2::from(to + (p.coords - from) * scale));
    }
}
