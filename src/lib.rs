// src/lib.rs
pub mod calibration;
pub mod clock;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod feedback;
pub mod geometry;
pub mod ledger;
pub mod pose;
pub mod recorder;
pub mod sequencer;
pub mod session;

pub use config::GameConfig;
pub use data::ScoreExporter;
pub use engine::{ChallengeEngine, EngineEvent, RoundRecord, SessionReport, SessionStatus};
pub use error::{ChallengeError, PlaylistError};
pub use pose::{BodyPart, Keypoint, Pose};
pub use sequencer::{DanceMove, Playlist, PlaylistSource};
pub use session::{start_session, PoseSource, ReplayPoseSource, SessionHandle, SessionTiming};
