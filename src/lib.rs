//! Subgen - A Rust CLI tool for turning audio files into subtitle files
//!
//! This library drives a local whisper.cpp engine as a subprocess, tracks each
//! transcription job through a small state machine, converts the engine's SRT
//! output into ASS when requested, and keeps a durable catalog of every
//! subtitle file it has produced.

pub mod cli;
pub mod config;
pub mod engine;
pub mod jobs;
pub mod models;
pub mod store;
pub mod subtitle;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use engine::{DensityPreset, SpeechEngine, WhisperEngine};
pub use jobs::{JobEvent, JobPhase, Orchestrator};
pub use store::{ArtifactRecord, ArtifactStore};
pub use subtitle::{Cue, SubtitleFormat};

/// Result type used throughout the core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Structured error taxonomy shared by every core operation and the
/// orchestrator's error events
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No audio file selected - pick an audio file before starting")]
    AudioNotSelected,

    #[error("No output path set - choose where the subtitle file should be written")]
    OutputPathRequired,

    #[error("Transcription failed: {message}")]
    TranscriptionFailed {
        message: String,
        /// Captured tail of the engine's error stream, when available
        detail: Option<String>,
    },

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("File operation failed: {0}")]
    FileOperationFailed(String),
}

impl CoreError {
    /// Stable machine-readable kind, used in error event payloads
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::NotFound(_) => "not_found",
            CoreError::AudioNotSelected => "audio_not_selected",
            CoreError::OutputPathRequired => "output_path_required",
            CoreError::TranscriptionFailed { .. } => "transcription_failed",
            CoreError::Cancelled => "cancelled",
            CoreError::FileOperationFailed(_) => "file_operation_failed",
        }
    }

    /// Diagnostic detail carried alongside the message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            CoreError::TranscriptionFailed { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::FileOperationFailed(err.to_string())
    }
}
