// src/session.rs - Session harness: drives the engine from the frame loop and the countdown timer
use crate::config::GameConfig;
use crate::engine::{ChallengeEngine, EngineEvent, SessionReport, SessionStatus};
use crate::error::{ChallengeError, Result};
use crate::pose::Pose;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Produces live poses for the render loop. `acquire` may block until the
/// stream is ready and is called once, off the async runtime.
pub trait PoseSource: Send + 'static {
    fn acquire(&mut self) -> Result<()>;

    /// Poses detected in the latest frame, possibly none.
    fn poll(&mut self) -> Vec<Pose>;
}

/// Replays recorded frames in a loop. Each poll yields the next frame.
#[derive(Debug, Clone, Default)]
pub struct ReplayPoseSource {
    path: Option<PathBuf>,
    frames: Vec<Vec<Pose>>,
    cursor: usize,
}

impl ReplayPoseSource {
    /// Frames are read from a JSON array of frames on `acquire`.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    pub fn from_frames(frames: Vec<Vec<Pose>>) -> Self {
        Self {
            path: None,
            frames,
            cursor: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ReplayPoseSource {
    fn acquire(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ChallengeError::Acquisition(format!("{}: {}", path.display(), e)))?;
            self.frames = serde_json::from_str(&content)
                .map_err(|e| ChallengeError::Acquisition(format!("{}: {}", path.display(), e)))?;
            info!("Loaded {} recorded frames from {}", self.frames.len(), path.display());
        }

        if self.frames.is_empty() {
            return Err(ChallengeError::Acquisition("recording contains no frames".to_string()));
        }
        self.cursor = 0;
        Ok(())
    }

    fn poll(&mut self) -> Vec<Pose> {
        if self.frames.is_empty() {
            return Vec::new();
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub frame_period: Duration,
    pub tick_period: Duration,
    pub setup_delay: Duration,
}

impl SessionTiming {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            frame_period: config.frame_period(),
            tick_period: config.tick_period(),
            setup_delay: config.setup_delay(),
        }
    }
}

/// A running session. Dropping the handle cancels the session.
#[derive(Debug)]
pub struct SessionHandle {
    events: mpsc::UnboundedReceiver<EngineEvent>,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    /// Next engine event, or `None` once the session task has ended.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the playlist to run out.
    pub async fn wait(self) -> Result<SessionReport> {
        let SessionHandle { cancel, task, .. } = self;
        let report = task.await?;
        drop(cancel);
        Ok(report)
    }

    /// Cancels the timers and returns the report so far.
    pub async fn stop(self) -> Result<SessionReport> {
        let SessionHandle { cancel, task, .. } = self;
        // The task may already be gone
        let _ = cancel.send(());
        Ok(task.await?)
    }

    /// Stops this session and starts a fresh one in its place.
    pub async fn restart(
        self,
        engine: ChallengeEngine,
        source: impl PoseSource,
        timing: SessionTiming,
    ) -> Result<SessionHandle> {
        let previous = self.stop().await?;
        debug!("Replaced session at score {}", previous.final_score);
        start_session(engine, source, timing).await
    }
}

/// Acquires the pose source and spawns the session task. Acquisition failure
/// is returned before any timer starts.
pub async fn start_session(
    engine: ChallengeEngine,
    mut source: impl PoseSource,
    timing: SessionTiming,
) -> Result<SessionHandle> {
    let source = tokio::task::spawn_blocking(move || source.acquire().map(|()| source)).await??;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(run_session(engine, source, timing, event_tx, cancel_rx));

    Ok(SessionHandle {
        events: event_rx,
        cancel: cancel_tx,
        task,
    })
}

async fn run_session(
    mut engine: ChallengeEngine,
    mut source: impl PoseSource,
    timing: SessionTiming,
    events: mpsc::UnboundedSender<EngineEvent>,
    mut cancel: oneshot::Receiver<()>,
) -> SessionReport {
    let started = Instant::now();
    publish(&events, engine.start());

    let setup = time::sleep(timing.setup_delay);
    tokio::pin!(setup);
    let mut setup_pending = true;

    let mut frames = time::interval(timing.frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut countdown = time::interval_at(started + timing.setup_delay + timing.tick_period, timing.tick_period);
    countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let completed = loop {
        tokio::select! {
            biased;

            // Explicit cancel or a dropped handle
            _ = &mut cancel => {
                info!("Session cancelled at score {}", engine.score());
                break false;
            }
            _ = &mut setup, if setup_pending => {
                setup_pending = false;
                publish(&events, engine.on_setup_elapsed());
            }
            _ = countdown.tick() => {
                publish(&events, engine.on_timer_tick());
            }
            _ = frames.tick() => {
                let poses = source.poll();
                publish(&events, engine.on_frame(&poses));
            }
        }

        if engine.status() == SessionStatus::Finished {
            break true;
        }
    };

    engine.report(completed)
}

fn publish(events: &mpsc::UnboundedSender<EngineEvent>, batch: Vec<EngineEvent>) {
    for event in batch {
        // Nobody listening is fine, the session keeps running
        let _ = events.send(event);
    }
}
