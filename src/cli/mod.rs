use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::DensityPreset;
use crate::subtitle::SubtitleFormat;

#[derive(Parser)]
#[command(
    name = "subgen",
    about = "Subgen - Generate subtitle files from audio using a local whisper.cpp engine",
    version,
    long_about = "A CLI tool that transcribes audio files with whisper.cpp, converts the result \
to SRT or ASS subtitles, and keeps a catalog of everything it has generated."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe an audio file into a subtitle file
    Transcribe {
        /// Audio file to transcribe
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,

        /// Subtitle output path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Output format (config default if not specified)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Language code (config default if not specified)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Model identifier, e.g. base or large-v3 (config default if not specified)
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,

        /// Cue density preset (config default if not specified)
        #[arg(short, long, value_enum)]
        density: Option<DensityArg>,
    },

    /// Manage previously generated subtitle files
    Artifacts {
        #[command(subcommand)]
        command: ArtifactCommands,
    },

    /// List available engine models
    Models,

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum ArtifactCommands {
    /// List all catalogued subtitle files
    List,

    /// Rename a catalogued subtitle file
    Rename {
        /// Artifact identifier
        id: String,
        /// New base name, without extension
        new_name: String,
    },

    /// Delete a catalogued subtitle file
    Delete {
        /// Artifact identifier
        id: String,
    },

    /// Open a subtitle file with the default application
    Open {
        /// Artifact identifier
        id: String,
    },

    /// Reveal a subtitle file in the system file manager
    Reveal {
        /// Artifact identifier
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    /// SRT subtitle format
    Srt,
    /// Advanced SubStation Alpha
    Ass,
}

impl From<FormatArg> for SubtitleFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Srt => SubtitleFormat::Srt,
            FormatArg::Ass => SubtitleFormat::Ass,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DensityArg {
    /// Fewer, longer cues
    Low,
    /// Balanced default
    Medium,
    /// More, shorter cues
    High,
    /// Maximally fragmented cues
    Ultra,
}

impl From<DensityArg> for DensityPreset {
    fn from(arg: DensityArg) -> Self {
        match arg {
            DensityArg::Low => DensityPreset::Low,
            DensityArg::Medium => DensityPreset::Medium,
            DensityArg::High => DensityPreset::High,
            DensityArg::Ultra => DensityPreset::Ultra,
        }
    }
}
