// src/data.rs - Score export: per-round CSV and session summary JSON
use crate::engine::{RoundRecord, SessionReport};
use crate::feedback::summary_message;
use anyhow::Result;
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct SessionSummary<'a> {
    session: &'a str,
    exported_at: String,
    final_score: i32,
    rounds_scored: usize,
    completed: bool,
    message: &'static str,
    history: &'a [i32],
}

pub struct ScoreExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl ScoreExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export_csv(&self, rounds: &[RoundRecord]) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("rounds.csv");
        std::fs::create_dir_all(self.session_dir())?;

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for round in rounds {
            writer.serialize(round)?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    pub fn write_summary(&self, report: &SessionReport) -> Result<PathBuf> {
        let summary_path = self.session_dir().join("summary.json");
        std::fs::create_dir_all(self.session_dir())?;

        let summary = SessionSummary {
            session: &self.session_name,
            exported_at: Local::now().to_rfc3339(),
            final_score: report.final_score,
            rounds_scored: report.rounds.len(),
            completed: report.completed,
            message: summary_message(report.final_score),
            history: &report.history,
        };
        std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
        Ok(summary_path)
    }

    /// Writes both files, returning (csv, summary) paths.
    pub fn export(&self, report: &SessionReport) -> Result<(PathBuf, PathBuf)> {
        let csv_path = self.export_csv(&report.rounds)?;
        let summary_path = self.write_summary(report)?;
        Ok((csv_path, summary_path))
    }
}
