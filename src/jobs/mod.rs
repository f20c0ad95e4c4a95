use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::engine::{DensityPreset, RunParams, SpeechEngine, WhisperEngine};
use crate::store::{resolve_collision, ArtifactRecord, ArtifactStore};
use crate::subtitle::{self, Cue, SubtitleFormat};
use crate::utils;
use crate::{CoreError, Result};

/// Lifecycle phase of a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobPhase {
    Preparing,
    Transcribing,
    Converting,
    Saving,
    Done,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobPhase::Preparing => "preparing",
            JobPhase::Transcribing => "transcribing",
            JobPhase::Converting => "converting",
            JobPhase::Saving => "saving",
            JobPhase::Done => "done",
        };
        write!(f, "{}", label)
    }
}

/// Why the artifact catalog changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeReason {
    Created,
    Renamed,
    Deleted,
}

/// Structured error as carried by error events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&CoreError> for ErrorPayload {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            detail: err.detail().map(|d| d.to_string()),
        }
    }
}

/// Identity of a catalogued artifact, as carried by completion events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub id: String,
    pub path: PathBuf,
    pub file_name: String,
}

impl From<&ArtifactRecord> for ArtifactSummary {
    fn from(record: &ArtifactRecord) -> Self {
        Self {
            id: record.id.clone(),
            path: record.path.clone(),
            file_name: record.file_name.clone(),
        }
    }
}

/// Lifecycle events delivered to the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobEvent {
    Progress {
        job_id: String,
        phase: JobPhase,
        message: String,
    },
    Done {
        job_id: String,
        artifact: ArtifactSummary,
        preview: Vec<Cue>,
    },
    Error {
        job_id: String,
        error: ErrorPayload,
    },
    /// Broadcast, not scoped to a job
    ArtifactsChanged { reason: ChangeReason },
}

/// One transcription request
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
    pub language: String,
    pub model: String,
    pub format: SubtitleFormat,
    pub density: DensityPreset,
}

/// Result a successful job resolves with; mirrors the `Done` event
#[derive(Debug, Clone)]
pub struct JobCompletion {
    pub artifact: ArtifactSummary,
    pub preview: Vec<Cue>,
}

/// Handle to a started job
#[derive(Debug)]
pub struct JobHandle {
    pub id: String,
    handle: JoinHandle<Result<JobCompletion>>,
}

impl JobHandle {
    /// Await the job's terminal outcome. Carries the same structured error
    /// the error event does.
    pub async fn wait(self) -> Result<JobCompletion> {
        self.handle
            .await
            .unwrap_or_else(|e| Err(CoreError::TranscriptionFailed {
                message: format!("Job task failed: {}", e),
                detail: None,
            }))
    }
}

/// Registry of engines for in-flight jobs.
///
/// Owned by the orchestrator; everything else only sees
/// register/deregister/lookup behind a single lock.
#[derive(Default)]
pub struct JobRegistry {
    inner: Mutex<HashMap<String, Arc<dyn SpeechEngine>>>,
}

impl JobRegistry {
    async fn register(&self, job_id: &str, engine: Arc<dyn SpeechEngine>) {
        self.inner.lock().await.insert(job_id.to_string(), engine);
    }

    async fn deregister(&self, job_id: &str) {
        self.inner.lock().await.remove(job_id);
    }

    async fn lookup(&self, job_id: &str) -> Option<Arc<dyn SpeechEngine>> {
        self.inner.lock().await.get(job_id).cloned()
    }

    /// Number of currently registered jobs
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

type EngineFactory = Arc<dyn Fn() -> Arc<dyn SpeechEngine> + Send + Sync>;

/// Composition root: sequences a transcription request through its phases,
/// drives the engine, converts format when requested, registers the result in
/// the artifact store, and emits lifecycle events
pub struct Orchestrator {
    config: Config,
    store: Arc<ArtifactStore>,
    registry: Arc<JobRegistry>,
    events: mpsc::UnboundedSender<JobEvent>,
    engine_factory: EngineFactory,
}

impl Orchestrator {
    /// Orchestrator backed by the real whisper.cpp engine
    pub fn new(
        config: Config,
        store: Arc<ArtifactStore>,
        events: mpsc::UnboundedSender<JobEvent>,
    ) -> Self {
        let binary = config.engine.binary.clone();
        Self::with_engine_factory(
            config,
            store,
            events,
            Arc::new(move || Arc::new(WhisperEngine::new(binary.clone())) as Arc<dyn SpeechEngine>),
        )
    }

    /// Orchestrator with a custom engine factory; a fresh engine is created
    /// per job
    pub fn with_engine_factory(
        config: Config,
        store: Arc<ArtifactStore>,
        events: mpsc::UnboundedSender<JobEvent>,
        engine_factory: EngineFactory,
    ) -> Self {
        Self {
            config,
            store,
            registry: Arc::new(JobRegistry::default()),
            events,
            engine_factory,
        }
    }

    /// Validate a transcription request and start one job task for it.
    ///
    /// Precondition failures are returned before any event is emitted or any
    /// process spawned.
    pub async fn start_job(&self, request: JobRequest) -> Result<JobHandle> {
        if request.audio_path.as_os_str().is_empty() {
            return Err(CoreError::AudioNotSelected);
        }
        if request.output_path.as_os_str().is_empty() {
            return Err(CoreError::OutputPathRequired);
        }
        utils::check_file_accessible(&request.audio_path)?;

        let job_id = uuid::Uuid::new_v4().to_string();
        let engine = (self.engine_factory)();
        self.registry.register(&job_id, engine.clone()).await;

        tracing::info!(
            "Starting job {} for {} -> {}",
            job_id,
            request.audio_path.display(),
            request.output_path.display()
        );

        let params = RunParams {
            audio_path: request.audio_path.clone(),
            language: request.language.clone(),
            model_path: self.config.model_path(&request.model),
            density: request.density,
        };

        let store = self.store.clone();
        let registry = self.registry.clone();
        let events = self.events.clone();
        let id = job_id.clone();

        let handle = tokio::spawn(async move {
            let result = run_job(&id, &request, params, engine, &store, &events).await;
            registry.deregister(&id).await;

            if let Err(err) = &result {
                tracing::warn!("Job {} failed: {}", id, err);
                let _ = events.send(JobEvent::Error {
                    job_id: id.clone(),
                    error: ErrorPayload::from(err),
                });
            }

            result
        });

        Ok(JobHandle { id: job_id, handle })
    }

    /// Request cancellation of an in-flight job. A job that already reached a
    /// terminal state is a quiet no-op; no error and no spurious event.
    pub async fn cancel_job(&self, job_id: &str) {
        if let Some(engine) = self.registry.lookup(job_id).await {
            tracing::info!("Cancelling job {}", job_id);
            engine.cancel();
            self.registry.deregister(job_id).await;
        }
    }

    /// All catalogued artifacts with their on-disk existence
    pub async fn list_artifacts(&self) -> Vec<ArtifactRecord> {
        self.store.list().await
    }

    /// Rename an artifact's file and catalog entry, resolving collisions with
    /// a numbered suffix
    pub async fn rename_artifact(&self, id: &str, new_base_name: &str) -> Result<ArtifactRecord> {
        let base = utils::sanitize_filename(new_base_name);
        if base.is_empty() {
            return Err(CoreError::Validation(
                "rename target must not be empty".into(),
            ));
        }

        let record = self.store.get(id).await?;
        if !record.path.is_file() {
            return Err(CoreError::NotFound(format!(
                "subtitle file no longer exists: {}",
                record.path.display()
            )));
        }

        let parent = record
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let desired = parent.join(format!("{}.{}", base, record.format.extension()));
        if desired == record.path {
            return Ok(record);
        }

        let target = resolve_collision(&desired);
        fs_err::rename(&record.path, &target)
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;

        let mut updated = self
            .store
            .update(id, |r| r.set_path(target.clone()))
            .await?;
        updated.exists = true;

        self.emit(JobEvent::ArtifactsChanged {
            reason: ChangeReason::Renamed,
        });

        Ok(updated)
    }

    /// Delete an artifact from disk and catalog. A file already removed
    /// externally counts as already satisfied.
    pub async fn delete_artifact(&self, id: &str) -> Result<()> {
        let record = self.store.get(id).await?;

        if record.path.is_file() {
            fs_err::remove_file(&record.path)
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        }

        self.store.remove(id).await?;
        self.emit(JobEvent::ArtifactsChanged {
            reason: ChangeReason::Deleted,
        });

        Ok(())
    }

    /// Open the subtitle file with the OS default handler
    pub async fn open_artifact(&self, id: &str) -> Result<()> {
        let record = self.resolve_on_disk(id).await?;

        #[cfg(target_os = "windows")]
        let spawned = std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(&record.path)
            .spawn();

        #[cfg(target_os = "macos")]
        let spawned = std::process::Command::new("open").arg(&record.path).spawn();

        #[cfg(all(unix, not(target_os = "macos")))]
        let spawned = std::process::Command::new("xdg-open")
            .arg(&record.path)
            .spawn();

        spawned.map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        Ok(())
    }

    /// Reveal the subtitle file in the system file manager
    pub async fn reveal_artifact(&self, id: &str) -> Result<()> {
        let record = self.resolve_on_disk(id).await?;

        #[cfg(target_os = "windows")]
        let spawned = std::process::Command::new("explorer")
            .arg("/select,")
            .arg(&record.path)
            .spawn();

        #[cfg(target_os = "macos")]
        let spawned = std::process::Command::new("open")
            .arg("-R")
            .arg(&record.path)
            .spawn();

        #[cfg(all(unix, not(target_os = "macos")))]
        let spawned = {
            let target = record
                .path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| record.path.clone());
            std::process::Command::new("xdg-open").arg(target).spawn()
        };

        spawned.map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        Ok(())
    }

    async fn resolve_on_disk(&self, id: &str) -> Result<ArtifactRecord> {
        let record = self.store.get(id).await?;
        if !record.path.is_file() {
            return Err(CoreError::NotFound(format!(
                "subtitle file no longer exists: {}",
                record.path.display()
            )));
        }
        Ok(record)
    }

    fn emit(&self, event: JobEvent) {
        // A dropped receiver only means no one is listening
        let _ = self.events.send(event);
    }
}

/// Walk one job through its phases. Emits progress in strict phase order and
/// the `Done` event on success; the caller handles the error event.
async fn run_job(
    job_id: &str,
    request: &JobRequest,
    params: RunParams,
    engine: Arc<dyn SpeechEngine>,
    store: &ArtifactStore,
    events: &mpsc::UnboundedSender<JobEvent>,
) -> Result<JobCompletion> {
    let progress = |phase: JobPhase, message: &str| {
        let _ = events.send(JobEvent::Progress {
            job_id: job_id.to_string(),
            phase,
            message: message.to_string(),
        });
    };

    progress(JobPhase::Preparing, "Preparing transcription");

    progress(JobPhase::Transcribing, "Transcribing audio");
    let engine_output = engine
        .run(
            params,
            Box::new(|line| tracing::debug!("engine: {}", line)),
        )
        .await?;

    let native_content = fs_err::read_to_string(&engine_output.srt_path)
        .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;

    if let Some(parent) = request.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        }
    }

    match request.format {
        SubtitleFormat::Srt => {
            fs_err::copy(&engine_output.srt_path, &request.output_path)
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        }
        SubtitleFormat::Ass => {
            progress(JobPhase::Converting, "Converting to ASS");
            let converted = subtitle::convert_srt_to_ass(&native_content);

            // Write to a temporary sibling first, then copy to the exact
            // requested output path
            let tmp = tempfile::NamedTempFile::new()
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
            fs_err::write(tmp.path(), &converted)
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
            fs_err::copy(tmp.path(), &request.output_path)
                .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        }
    }

    progress(JobPhase::Saving, "Saving to catalog");
    let record = ArtifactRecord::new(
        request.output_path.clone(),
        request.format,
        request.language.clone(),
        request.model.clone(),
    );
    store.add(record.clone()).await?;
    let _ = events.send(JobEvent::ArtifactsChanged {
        reason: ChangeReason::Created,
    });

    let preview = subtitle::parse_srt(&native_content);

    progress(JobPhase::Done, "Transcription complete");
    let completion = JobCompletion {
        artifact: ArtifactSummary::from(&record),
        preview,
    };
    let _ = events.send(JobEvent::Done {
        job_id: job_id.to_string(),
        artifact: completion.artifact.clone(),
        preview: completion.preview.clone(),
    });

    tracing::info!("Job {} completed: {}", job_id, record.path.display());
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOutput, LineHook};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const TWO_CUE_SRT: &str =
        "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n2\n00:00:01,500 --> 00:00:03,200\nWorld\n";

    /// Canned engine: emits fixed output lines, then either produces an SRT
    /// file or fails with a controllable outcome
    struct FakeEngine {
        lines: Vec<String>,
        srt_content: Option<String>,
        cancelled: AtomicBool,
    }

    impl FakeEngine {
        fn succeeding(srt: &str) -> Self {
            Self {
                lines: vec!["loading model".into(), "processing audio".into()],
                srt_content: Some(srt.to_string()),
                cancelled: AtomicBool::new(false),
            }
        }

        fn failing() -> Self {
            Self {
                lines: vec![],
                srt_content: None,
                cancelled: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SpeechEngine for FakeEngine {
        async fn run(&self, _params: RunParams, on_line: LineHook) -> Result<EngineOutput> {
            for line in &self.lines {
                on_line(line);
            }
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(CoreError::Cancelled);
            }
            match &self.srt_content {
                Some(content) => {
                    let workdir = TempDir::new().unwrap();
                    let srt_path = workdir.path().join("out.srt");
                    fs_err::write(&srt_path, content).unwrap();
                    Ok(EngineOutput::new(srt_path, workdir))
                }
                None => Err(CoreError::TranscriptionFailed {
                    message: "engine exploded".into(),
                    detail: Some("stderr tail".into()),
                }),
            }
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        events: mpsc::UnboundedReceiver<JobEvent>,
        dir: TempDir,
    }

    fn fixture(engine: impl Fn() -> Arc<dyn SpeechEngine> + Send + Sync + 'static) -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ArtifactStore::new(&dir.path().join("data")).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator =
            Orchestrator::with_engine_factory(Config::default(), store, tx, Arc::new(engine));
        Fixture {
            orchestrator,
            events: rx,
            dir,
        }
    }

    fn request(dir: &TempDir, format: SubtitleFormat) -> JobRequest {
        let audio = dir.path().join("audio.wav");
        fs_err::write(&audio, b"fake audio").unwrap();
        JobRequest {
            audio_path: audio,
            output_path: dir.path().join(format!("subs.{}", format.extension())),
            language: "en".into(),
            model: "base".into(),
            format,
            density: DensityPreset::Medium,
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn progress_phases(events: &[JobEvent]) -> Vec<JobPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Progress { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_successful_srt_job_phase_sequence() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req.clone()).await.unwrap();
        let completion = handle.wait().await.unwrap();

        let events = drain(&mut fx.events);
        assert_eq!(
            progress_phases(&events),
            vec![
                JobPhase::Preparing,
                JobPhase::Transcribing,
                JobPhase::Saving,
                JobPhase::Done
            ]
        );
        assert!(req.output_path.is_file());
        assert_eq!(completion.preview.len(), 2);
    }

    #[tokio::test]
    async fn test_converting_phase_present_iff_format_differs() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Ass);

        let handle = fx.orchestrator.start_job(req.clone()).await.unwrap();
        handle.wait().await.unwrap();

        let events = drain(&mut fx.events);
        assert_eq!(
            progress_phases(&events),
            vec![
                JobPhase::Preparing,
                JobPhase::Transcribing,
                JobPhase::Converting,
                JobPhase::Saving,
                JobPhase::Done
            ]
        );

        let written = fs_err::read_to_string(&req.output_path).unwrap();
        assert!(written.starts_with("[Script Info]"));
    }

    #[tokio::test]
    async fn test_end_to_end_two_cue_preview_and_catalog() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req.clone()).await.unwrap();
        let completion = handle.wait().await.unwrap();

        assert_eq!(completion.preview.len(), 2);
        assert_eq!(completion.preview[0].start_ms, 0);
        assert_eq!(completion.preview[0].end_ms, 1500);
        assert_eq!(completion.preview[0].text, "Hello");
        assert_eq!(completion.preview[1].start_ms, 1500);
        assert_eq!(completion.preview[1].end_ms, 3200);
        assert_eq!(completion.preview[1].text, "World");

        let artifacts = fx.orchestrator.list_artifacts().await;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].format, SubtitleFormat::Srt);
        assert!(artifacts[0].exists);

        let events = drain(&mut fx.events);
        assert!(events.iter().any(|e| matches!(
            e,
            JobEvent::ArtifactsChanged {
                reason: ChangeReason::Created
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, JobEvent::Done { preview, .. } if preview.len() == 2)));
    }

    #[tokio::test]
    async fn test_empty_audio_path_fails_before_any_event() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let mut req = request(&fx.dir, SubtitleFormat::Srt);
        req.audio_path = PathBuf::new();

        let err = fx.orchestrator.start_job(req).await.unwrap_err();
        assert_eq!(err.kind(), "audio_not_selected");
        assert!(drain(&mut fx.events).is_empty());
    }

    #[tokio::test]
    async fn test_empty_output_path_is_rejected() {
        let fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let mut req = request(&fx.dir, SubtitleFormat::Srt);
        req.output_path = PathBuf::new();

        let err = fx.orchestrator.start_job(req).await.unwrap_err();
        assert_eq!(err.kind(), "output_path_required");
    }

    #[tokio::test]
    async fn test_engine_failure_emits_error_event_and_fails_handle() {
        let mut fx = fixture(|| Arc::new(FakeEngine::failing()));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req).await.unwrap();
        let err = handle.wait().await.unwrap_err();
        assert_eq!(err.kind(), "transcription_failed");

        let events = drain(&mut fx.events);
        let error_event = events.iter().find_map(|e| match e {
            JobEvent::Error { error, .. } => Some(error.clone()),
            _ => None,
        });
        let payload = error_event.expect("error event");
        assert_eq!(payload.kind, "transcription_failed");
        assert_eq!(payload.detail.as_deref(), Some("stderr tail"));

        assert!(fx.orchestrator.list_artifacts().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_quiet() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req).await.unwrap();
        let job_id = handle.id.clone();
        handle.wait().await.unwrap();

        let before = drain(&mut fx.events).len();
        fx.orchestrator.cancel_job(&job_id).await;
        fx.orchestrator.cancel_job(&job_id).await;
        assert_eq!(drain(&mut fx.events).len(), 0);
        assert!(before > 0);
        assert_eq!(fx.orchestrator.registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_job_deregistered_on_all_exit_paths() {
        let fx = fixture(|| Arc::new(FakeEngine::failing()));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req).await.unwrap();
        let _ = handle.wait().await;
        assert_eq!(fx.orchestrator.registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_rename_artifact_with_collision() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req).await.unwrap();
        let completion = handle.wait().await.unwrap();

        // Occupy the rename target so the probe has to step over it
        let colliding = fx.dir.path().join("final.srt");
        fs_err::write(&colliding, "taken").unwrap();

        let renamed = fx
            .orchestrator
            .rename_artifact(&completion.artifact.id, "final")
            .await
            .unwrap();

        assert_eq!(renamed.file_name, "final (1).srt");
        assert!(renamed.path.is_file());
        assert_eq!(renamed.id, completion.artifact.id);

        let events = drain(&mut fx.events);
        assert!(events.iter().any(|e| matches!(
            e,
            JobEvent::ArtifactsChanged {
                reason: ChangeReason::Renamed
            }
        )));
    }

    #[tokio::test]
    async fn test_rename_empty_name_is_validation_error() {
        let fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let err = fx
            .orchestrator
            .rename_artifact("whatever", "   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_delete_artifact_with_vanished_file_succeeds() {
        let mut fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let req = request(&fx.dir, SubtitleFormat::Srt);

        let handle = fx.orchestrator.start_job(req.clone()).await.unwrap();
        let completion = handle.wait().await.unwrap();

        // File removed externally; delete still treats it as satisfied
        fs_err::remove_file(&req.output_path).unwrap();
        fx.orchestrator
            .delete_artifact(&completion.artifact.id)
            .await
            .unwrap();

        assert!(fx.orchestrator.list_artifacts().await.is_empty());
        let events = drain(&mut fx.events);
        assert!(events.iter().any(|e| matches!(
            e,
            JobEvent::ArtifactsChanged {
                reason: ChangeReason::Deleted
            }
        )));
    }

    #[tokio::test]
    async fn test_delete_unknown_artifact_is_not_found() {
        let fx = fixture(|| Arc::new(FakeEngine::succeeding(TWO_CUE_SRT)));
        let err = fx.orchestrator.delete_artifact("missing").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_mock_engine_cancel_is_forwarded() {
        use crate::engine::MockSpeechEngine;

        let mut mock = MockSpeechEngine::new();
        mock.expect_cancel().times(1).return_const(());
        mock.expect_run().never();
        let engine: Arc<dyn SpeechEngine> = Arc::new(mock);

        let registry = JobRegistry::default();
        registry.register("job-1", engine.clone()).await;
        let looked_up = registry.lookup("job-1").await.unwrap();
        looked_up.cancel();
        registry.deregister("job-1").await;
        assert!(registry.lookup("job-1").await.is_none());
    }
}
