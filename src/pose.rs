// src/pose.rs - Keypoints, poses and derived skeletons in the PoseNet layout
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyPart {
    pub const COUNT: usize = 17;

    pub const ALL: [BodyPart; Self::COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    /// Upper-body parts that are tracked and scored (PoseNet indices 5..=12).
    pub const TRACKED: [BodyPart; 8] = [
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_tracked(self) -> bool {
        Self::TRACKED.contains(&self)
    }
}

/// PoseNet's anatomically adjacent part pairs.
pub const ADJACENT_PARTS: [(BodyPart, BodyPart); 12] = [
    (BodyPart::LeftHip, BodyPart::LeftShoulder),
    (BodyPart::LeftElbow, BodyPart::LeftShoulder),
    (BodyPart::LeftElbow, BodyPart::LeftWrist),
    (BodyPart::LeftHip, BodyPart::LeftKnee),
    (BodyPart::LeftKnee, BodyPart::LeftAnkle),
    (BodyPart::RightHip, BodyPart::RightShoulder),
    (BodyPart::RightElbow, BodyPart::RightShoulder),
    (BodyPart::RightElbow, BodyPart::RightWrist),
    (BodyPart::RightHip, BodyPart::RightKnee),
    (BodyPart::RightKnee, BodyPart::RightAnkle),
    (BodyPart::LeftShoulder, BodyPart::RightShoulder),
    (BodyPart::LeftHip, BodyPart::RightHip),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Point2<f64>,
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }

    pub fn distance_to(&self, other: &Keypoint) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}

/// Live keypoints keyed by body part, refreshed by the render loop.
pub type LiveKeypoints = BTreeMap<BodyPart, Keypoint>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    pub a: (BodyPart, Keypoint),
    pub b: (BodyPart, Keypoint),
}

impl Bone {
    pub fn connects(&self, first: BodyPart, second: BodyPart) -> bool {
        (self.a.0 == first && self.b.0 == second) || (self.a.0 == second && self.b.0 == first)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    /// Index of the bone joining the two named parts, in either order.
    pub fn find_bone_pair(&self, first: BodyPart, second: BodyPart) -> Option<usize> {
        self.bones.iter().position(|bone| bone.connects(first, second))
    }

    pub fn shoulder_pair(&self) -> Option<ShoulderPair> {
        let index = self.find_bone_pair(BodyPart::RightShoulder, BodyPart::LeftShoulder)?;
        ShoulderPair::from_bone(&self.bones[index])
    }
}

/// The two shoulder keypoints used as the reference frame for calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoulderPair {
    pub right: Keypoint,
    pub left: Keypoint,
}

impl ShoulderPair {
    /// Below this width the shoulders are treated as coincident
    pub const MIN_WIDTH: f64 = 1e-6;

    pub fn from_bone(bone: &Bone) -> Option<Self> {
        match (bone.a.0, bone.b.0) {
            (BodyPart::RightShoulder, BodyPart::LeftShoulder) => Some(Self { right: bone.a.1, left: bone.b.1 }),
            (BodyPart::LeftShoulder, BodyPart::RightShoulder) => Some(Self { right: bone.b.1, left: bone.a.1 }),
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.right.distance_to(&self.left)
    }

    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.right.position, &self.left.position)
    }

    /// A coincident pair carries no scale and cannot anchor a pose.
    pub fn is_degenerate(&self) -> bool {
        let width = self.width();
        width.is_nan() || width < Self::MIN_WIDTH
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PoseRecord", into = "PoseRecord")]
pub struct Pose {
    pub keypoints: BTreeMap<BodyPart, Keypoint>,
    pub is_target: bool,
}

impl Pose {
    pub fn new(keypoints: impl IntoIterator<Item = (BodyPart, Keypoint)>) -> Self {
        Self {
            keypoints: keypoints.into_iter().collect(),
            is_target: false,
        }
    }

    pub fn keypoint(&self, part: BodyPart) -> Option<&Keypoint> {
        self.keypoints.get(&part)
    }

    /// Bones between adjacent parts whose keypoints both clear `min_confidence`.
    pub fn skeleton(&self, min_confidence: f64) -> Skeleton {
        let bones = ADJACENT_PARTS
            .iter()
            .filter_map(|&(first, second)| {
                let a = self.keypoints.get(&first)?;
                let b = self.keypoints.get(&second)?;
                if a.confidence >= min_confidence && b.confidence >= min_confidence {
                    Some(Bone { a: (first, *a), b: (second, *b) })
                } else {
                    None
                }
            })
            .collect();
        Skeleton { bones }
    }

    /// Tracked keypoints above the live confidence threshold.
    pub fn tracked_keypoints(&self, threshold: f64) -> LiveKeypoints {
        BodyPart::TRACKED
            .iter()
            .filter_map(|part| {
                self.keypoints
                    .get(part)
                    .filter(|kp| kp.is_confident(threshold))
                    .map(|kp| (*part, *kp))
            })
            .collect()
    }

    pub fn shoulder_pair(&self) -> Option<ShoulderPair> {
        Some(ShoulderPair {
            right: *self.keypoints.get(&BodyPart::RightShoulder)?,
            left: *self.keypoints.get(&BodyPart::LeftShoulder)?,
        })
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Point2<f64>) -> Point2<f64>) {
        for keypoint in self.keypoints.values_mut() {
            keypoint.position = f(keypoint.position);
        }
    }
}

// PoseNet / ml5 wire shape, used for playlists and recordings.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeypointRecord {
    pub part: BodyPart,
    pub score: f64,
    pub position: PositionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseBody {
    pub keypoints: Vec<KeypointRecord>,
    #[serde(default)]
    pub target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseRecord {
    pub pose: PoseBody,
    #[serde(default, skip_deserializing)]
    pub skeleton: Vec<[KeypointRecord; 2]>,
}

impl TryFrom<PoseRecord> for Pose {
    type Error = String;

    fn try_from(record: PoseRecord) -> Result<Self, Self::Error> {
        if record.pose.keypoints.is_empty() {
            return Err("pose has no keypoints".to_string());
        }

        let mut pose = Pose::new(record.pose.keypoints.into_iter().map(|kp| {
            (kp.part, Keypoint::new(kp.position.x, kp.position.y, kp.score))
        }));
        pose.is_target = record.pose.target;
        Ok(pose)
    }
}

fn keypoint_record(part: BodyPart, keypoint: &Keypoint) -> KeypointRecord {
    KeypointRecord {
        part,
        score: keypoint.confidence,
        position: PositionRecord {
            x: keypoint.position.x,
            y: keypoint.position.y,
        },
    }
}

impl From<Pose> for PoseRecord {
    fn from(pose: Pose) -> Self {
        let skeleton = pose
            .skeleton(0.0)
            .bones
            .iter()
            .map(|bone| [keypoint_record(bone.a.0, &bone.a.1), keypoint_record(bone.b.0, &bone.b.1)])
            .collect();

        PoseRecord {
            pose: PoseBody {
                keypoints: pose
                    .keypoints
                    .iter()
                    .map(|(part, kp)| keypoint_record(*part, kp))
                    .collect(),
                target: pose.is_target,
            },
            skeleton,
        }
    }
}
