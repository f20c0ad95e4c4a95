use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;

use crate::{CoreError, Result};

/// Number of trailing stderr lines kept as the failure diagnostic
const STDERR_TAIL_LINES: usize = 20;

/// User-selected setting controlling how finely speech is split into cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityPreset {
    /// Fewer, longer blocks - prioritizes continuous reading
    Low,
    /// Balanced default
    Medium,
    /// More, shorter blocks - favors fast speech and cuts
    High,
    /// Maximally fragmented blocks - short-form video style
    Ultra,
}

impl DensityPreset {
    /// Engine segmentation flags for this preset
    fn segmentation_args(&self) -> Vec<&'static str> {
        match self {
            // Engine default segmentation already yields long blocks
            DensityPreset::Low => vec![],
            DensityPreset::Medium => vec!["--max-len", "80", "--split-on-word"],
            DensityPreset::High => vec!["--max-len", "42", "--split-on-word"],
            DensityPreset::Ultra => vec!["--max-len", "16", "--split-on-word"],
        }
    }
}

/// Parameters for one engine invocation
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Audio file to transcribe; existence is validated by the caller
    pub audio_path: PathBuf,
    /// Language code passed to the engine
    pub language: String,
    /// Resolved model file path
    pub model_path: PathBuf,
    /// Segmentation density
    pub density: DensityPreset,
}

/// Hook receiving each engine output line as it arrives. May be ignored.
pub type LineHook = Box<dyn Fn(&str) + Send + Sync>;

/// Result of a successful engine run. The job-private working directory
/// travels with the subtitle path so the file stays alive until the caller
/// has copied it out.
#[derive(Debug)]
pub struct EngineOutput {
    /// Path of the produced SRT file inside the working directory
    pub srt_path: PathBuf,
    _workdir: TempDir,
}

impl EngineOutput {
    pub fn new(srt_path: PathBuf, workdir: TempDir) -> Self {
        Self {
            srt_path,
            _workdir: workdir,
        }
    }
}

/// Narrow capability boundary around the external recognition engine, so the
/// concrete binary and argument building stay swappable and testable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Spawn the engine and drive it to completion, streaming each output
    /// line through `on_line` as it arrives
    async fn run(&self, params: RunParams, on_line: LineHook) -> Result<EngineOutput>;

    /// Request termination of the underlying process. Safe no-op when no
    /// process is active or the run already finished.
    fn cancel(&self);
}

/// whisper.cpp CLI invocation, one per job.
///
/// Each instance is single-use: it supervises exactly one engine process and
/// rejects a second `run`.
pub struct WhisperEngine {
    binary: PathBuf,
    cancel_tx: watch::Sender<bool>,
    spent: AtomicBool,
}

impl WhisperEngine {
    pub fn new(binary: PathBuf) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            binary,
            cancel_tx,
            spent: AtomicBool::new(false),
        }
    }

    fn build_command(&self, params: &RunParams, output_prefix: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-m")
            .arg(&params.model_path)
            .arg("-l")
            .arg(&params.language)
            .arg("-f")
            .arg(&params.audio_path)
            .arg("--output-srt")
            .arg("--output-file")
            .arg(output_prefix)
            .args(params.density.segmentation_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl SpeechEngine for WhisperEngine {
    async fn run(&self, params: RunParams, on_line: LineHook) -> Result<EngineOutput> {
        if self.spent.swap(true, Ordering::SeqCst) {
            return Err(CoreError::Validation(
                "engine instance already used for a run".into(),
            ));
        }

        let mut cancel_rx = self.cancel_tx.subscribe();
        if *cancel_rx.borrow() {
            // Cancelled before the process was ever spawned
            return Err(CoreError::Cancelled);
        }

        // Job-private working area, never shared between concurrent jobs
        let workdir = TempDir::new().map_err(|e| CoreError::TranscriptionFailed {
            message: format!("Failed to create working directory: {}", e),
            detail: None,
        })?;
        let output_prefix = workdir.path().join("out");

        tracing::info!(
            "Running {} on {} (model {}, language {}, density {:?})",
            self.binary.display(),
            params.audio_path.display(),
            params.model_path.display(),
            params.language,
            params.density
        );

        let mut child = self
            .build_command(&params, &output_prefix)
            .spawn()
            .map_err(|e| CoreError::TranscriptionFailed {
                message: format!("Failed to spawn engine {}: {}", self.binary.display(), e),
                detail: None,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Keep only the stderr tail for the failure diagnostic
        let stderr_task = tokio::spawn(async move {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        // Stream stdout line by line, racing against cancellation
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => on_line(&line),
                        _ => break,
                    },
                    _ = cancel_rx.changed() => {
                        if *cancel_rx.borrow() {
                            tracing::info!("Cancellation requested, killing engine process");
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            stderr_task.abort();
                            return Err(CoreError::Cancelled);
                        }
                    }
                }
            }
        }

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| CoreError::TranscriptionFailed {
                message: format!("Failed to wait for engine process: {}", e),
                detail: None,
            })?,
            _ = wait_for_cancel(&mut cancel_rx) => {
                tracing::info!("Cancellation requested, killing engine process");
                let _ = child.start_kill();
                let _ = child.wait().await;
                stderr_task.abort();
                return Err(CoreError::Cancelled);
            }
        };

        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(CoreError::TranscriptionFailed {
                message: format!("Engine exited with {}", status),
                detail: (!stderr_tail.is_empty()).then_some(stderr_tail),
            });
        }

        let srt_path = output_prefix.with_extension("srt");
        if !srt_path.is_file() {
            return Err(CoreError::TranscriptionFailed {
                message: "Engine reported success but produced no subtitle file".into(),
                detail: (!stderr_tail.is_empty()).then_some(stderr_tail),
            });
        }

        Ok(EngineOutput::new(srt_path, workdir))
    }

    fn cancel(&self) {
        // watch keeps the latest value, so a pre-spawn cancel is still
        // observed and a post-completion cancel has no one listening
        let _ = self.cancel_tx.send(true);
    }
}

async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped; park forever, the other select arm settles
            std::future::pending::<()>().await;
        }
    }
}
