// src/config.rs - Game timing, scoring and file locations
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Countdown timer period in milliseconds
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    #[serde(default = "default_ticks_per_round")]
    pub ticks_per_round: u32,
    /// Tick on which the round is scored
    #[serde(default = "default_scoring_tick")]
    pub scoring_tick: u32,
    /// Countdown display wraps after this many ticks
    #[serde(default = "default_countdown_cycle_ticks")]
    pub countdown_cycle_ticks: u32,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: i32,
    /// Match count above which the target is pulled onto the live shoulders
    #[serde(default = "default_near_success_matches")]
    pub near_success_matches: usize,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_skeleton_confidence")]
    pub skeleton_confidence: f64,
    /// Pixel distance within which a live keypoint matches the target
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance: f64,
    #[serde(default = "default_setup_delay_secs")]
    pub setup_delay_secs: f64,
    /// Render loop period in milliseconds
    #[serde(default = "default_frame_period_ms")]
    pub frame_period_ms: u64,
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub feedback_seed: Option<u64>,
}

fn default_tick_period_ms() -> u64 { 100 }
fn default_ticks_per_round() -> u32 { 10 }
fn default_scoring_tick() -> u32 { 9 }
fn default_countdown_cycle_ticks() -> u32 { 60 }
fn default_match_threshold() -> i32 { 4 }
fn default_near_success_matches() -> usize { 4 }
fn default_confidence_threshold() -> f64 { 0.2 }
fn default_skeleton_confidence() -> f64 { 0.5 }
fn default_match_tolerance() -> f64 { 50.0 }
fn default_setup_delay_secs() -> f64 { 5.0 }
fn default_frame_period_ms() -> u64 { 16 }

fn default_catalog_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "posechallenge", "PoseChallenge")
        .map(|dirs| dirs.data_dir().join("catalog"))
        .unwrap_or_else(|| PathBuf::from("./catalog"))
}

fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("PoseChallenge")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            ticks_per_round: default_ticks_per_round(),
            scoring_tick: default_scoring_tick(),
            countdown_cycle_ticks: default_countdown_cycle_ticks(),
            match_threshold: default_match_threshold(),
            near_success_matches: default_near_success_matches(),
            confidence_threshold: default_confidence_threshold(),
            skeleton_confidence: default_skeleton_confidence(),
            match_tolerance: default_match_tolerance(),
            setup_delay_secs: default_setup_delay_secs(),
            frame_period_ms: default_frame_period_ms(),
            catalog_dir: default_catalog_dir(),
            output_dir: default_output_dir(),
            feedback_seed: None,
        }
    }
}

impl GameConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 || self.frame_period_ms == 0 {
            bail!("tick and frame periods must be non-zero");
        }
        if self.ticks_per_round < 2 {
            bail!("a round needs at least two ticks, got {}", self.ticks_per_round);
        }
        if self.scoring_tick == 0 || self.scoring_tick >= self.ticks_per_round {
            bail!(
                "scoring tick {} must fall inside the round (1..{})",
                self.scoring_tick,
                self.ticks_per_round
            );
        }
        if self.countdown_cycle_ticks < self.ticks_per_round {
            bail!("countdown cycle must cover at least one round");
        }
        if self.setup_delay_secs < 0.0 || !self.setup_delay_secs.is_finite() {
            bail!("setup delay must be a non-negative number of seconds");
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }

    pub fn setup_delay(&self) -> Duration {
        Duration::from_secs_f64(self.setup_delay_secs)
    }
}
