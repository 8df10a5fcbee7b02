// src/sequencer.rs - Playlists of dance moves and the target pose sequencer
use crate::config::GameConfig;
use crate::error::PlaylistError;
use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One dance move. Only the first pose is used as the round target; a
/// `None` slot is a pose that failed to parse.
#[derive(Debug, Clone, Default)]
pub struct DanceMove {
    pub poses: Vec<Option<Pose>>,
}

impl DanceMove {
    pub fn from_pose(pose: Pose) -> Self {
        Self { poses: vec![Some(pose)] }
    }

    pub fn target_pose(&self) -> Option<&Pose> {
        self.poses.first().and_then(Option::as_ref)
    }
}

#[derive(Deserialize)]
struct RawDanceMove {
    #[serde(default)]
    poses: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct DanceMoveRecord<'a> {
    // Unreadable poses are written back as null
    poses: Vec<Option<&'a Pose>>,
}

/// Non-empty ordered list of dance moves.
#[derive(Debug, Clone)]
pub struct Playlist {
    moves: Vec<DanceMove>,
}

impl Playlist {
    pub fn new(moves: Vec<DanceMove>) -> Result<Self, PlaylistError> {
        if moves.is_empty() {
            return Err(PlaylistError::Empty);
        }
        Ok(Self { moves })
    }

    pub fn from_json(json: &str) -> Result<Self, PlaylistError> {
        let raw: Vec<RawDanceMove> = serde_json::from_str(json)?;
        let moves = raw
            .into_iter()
            .enumerate()
            .map(|(index, raw_move)| DanceMove {
                poses: raw_move
                    .poses
                    .into_iter()
                    .map(|value| match serde_json::from_value::<Pose>(value) {
                        Ok(pose) => Some(pose),
                        Err(e) => {
                            warn!("Dance move {} has an unreadable pose: {}", index, e);
                            None
                        }
                    })
                    .collect(),
            })
            .collect();
        Self::new(moves)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlaylistError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let playlist = Self::from_json(&content)?;
        info!("Loaded {} dance moves from {}", playlist.len(), path.as_ref().display());
        Ok(playlist)
    }

    pub fn to_json(&self) -> Result<String, PlaylistError> {
        let records: Vec<DanceMoveRecord> = self
            .moves
            .iter()
            .map(|m| DanceMoveRecord {
                poses: m.poses.iter().map(Option::as_ref).collect(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlaylistError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[DanceMove] {
        &self.moves
    }
}

/// Where a playlist comes from: a named catalog entry or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    Catalog(String),
    File(PathBuf),
}

impl PlaylistSource {
    /// Treats an existing path or a `.json` argument as a file, anything else as a catalog name.
    pub fn from_arg(arg: &str) -> Self {
        let path = PathBuf::from(arg);
        if path.exists() || path.extension().is_some_and(|ext| ext == "json") {
            PlaylistSource::File(path)
        } else {
            PlaylistSource::Catalog(arg.to_string())
        }
    }

    pub fn load(&self, config: &GameConfig) -> Result<Playlist, PlaylistError> {
        match self {
            PlaylistSource::File(path) => Playlist::load(path),
            PlaylistSource::Catalog(name) => {
                let path = config.catalog_dir.join(format!("{name}.json"));
                if !path.exists() {
                    return Err(PlaylistError::UnknownCatalogEntry(name.clone()));
                }
                Playlist::load(path)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The next move's first pose, marked as the target.
    NextMove(Pose),
    /// The move at `index` has no usable first pose; the current target stays.
    Malformed { index: usize },
    /// Stepped past the last move. The index is back at 0.
    GameComplete,
}

#[derive(Debug, Clone)]
pub struct DanceSequencer {
    playlist: Playlist,
    index: Option<usize>,
}

impl DanceSequencer {
    pub fn new(playlist: Playlist) -> Self {
        Self { playlist, index: None }
    }

    /// `None` until playback has started.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn advance(&mut self) -> Advance {
        let next = self.index.map_or(0, |i| i + 1);
        if next >= self.playlist.len() {
            self.index = Some(0);
            return Advance::GameComplete;
        }
        self.index = Some(next);

        match self.playlist.moves[next].target_pose() {
            Some(pose) => {
                let mut target = pose.clone();
                target.is_target = true;
                Advance::NextMove(target)
            }
            None => Advance::Malformed { index: next },
        }
    }
}
