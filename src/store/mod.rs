use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::subtitle::SubtitleFormat;
use crate::{CoreError, Result};

/// Upper bound for collision probing during renames. When exhausted the
/// original (colliding) path is returned unchanged - an accepted
/// silent-overwrite edge case flagged for product review, not a bug.
const MAX_COLLISION_PROBES: u32 = 99;

/// One subtitle file the system has produced and catalogued
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Unique identifier, assigned at creation and stable across renames
    pub id: String,

    /// Absolute path of the subtitle file
    pub path: PathBuf,

    /// File name, always kept consistent with `path`
    pub file_name: String,

    /// Subtitle format of the file
    pub format: SubtitleFormat,

    /// Language code the transcription was requested with
    pub language: String,

    /// Model identifier used by the engine
    pub model: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Whether the file still exists on disk, recomputed on every read and
    /// never persisted
    #[serde(skip)]
    pub exists: bool,
}

impl ArtifactRecord {
    pub fn new(
        path: PathBuf,
        format: SubtitleFormat,
        language: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let file_name = derive_file_name(&path);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            file_name,
            format,
            language: language.into(),
            model: model.into(),
            created_at: Utc::now(),
            exists: false,
        }
    }

    /// Move the record to a new path, keeping `file_name` in sync
    pub fn set_path(&mut self, path: PathBuf) {
        self.file_name = derive_file_name(&path);
        self.path = path;
    }
}

fn derive_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Persisted catalog of generated artifacts.
///
/// The catalog file is the sole source of truth: a subtitle file on disk that
/// is absent from the catalog is invisible to the system. Every mutation
/// rewrites the whole file through a temporary sibling that is atomically
/// renamed into place, so concurrent readers never observe a partial write.
pub struct ArtifactStore {
    catalog_path: PathBuf,
    // Single catalog-level lock; catalog access does not cross OS processes.
    lock: Mutex<()>,
}

impl ArtifactStore {
    /// Open (or lazily create) the catalog inside `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs_err::create_dir_all(data_dir)
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;

        Ok(Self {
            catalog_path: data_dir.join("catalog.json"),
            lock: Mutex::new(()),
        })
    }

    /// All records in insertion order, with on-disk existence recomputed.
    /// A missing or unreadable catalog is treated as empty, never an error.
    pub async fn list(&self) -> Vec<ArtifactRecord> {
        let _guard = self.lock.lock().await;
        self.read_catalog()
    }

    /// Look up a single record by id
    pub async fn get(&self, id: &str) -> Result<ArtifactRecord> {
        let _guard = self.lock.lock().await;
        self.read_catalog()
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("artifact {}", id)))
    }

    /// Append one record; fails if the identifier is already catalogued
    pub async fn add(&self, record: ArtifactRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_catalog();

        if records.iter().any(|r| r.id == record.id) {
            return Err(CoreError::Validation(format!(
                "artifact {} already exists in the catalog",
                record.id
            )));
        }

        tracing::debug!("Adding artifact {} to catalog", record.id);
        records.push(record);
        self.write_catalog(&records)
    }

    /// Apply a transformation to the record matching `id` and persist the
    /// whole catalog atomically
    pub async fn update<F>(&self, id: &str, mutator: F) -> Result<ArtifactRecord>
    where
        F: FnOnce(&mut ArtifactRecord),
    {
        let _guard = self.lock.lock().await;
        let mut records = self.read_catalog();

        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("artifact {}", id)))?;

        mutator(record);
        let updated = record.clone();
        self.write_catalog(&records)?;

        Ok(updated)
    }

    /// Delete the record matching `id`. A missing record is a no-op, since
    /// the caller may have already removed it.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_catalog();
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() < before {
            tracing::debug!("Removed artifact {} from catalog", id);
            self.write_catalog(&records)?;
        }

        Ok(())
    }

    fn read_catalog(&self) -> Vec<ArtifactRecord> {
        let content = match fs_err::read_to_string(&self.catalog_path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        let mut records: Vec<ArtifactRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Unreadable artifact catalog, treating as empty: {}", e);
                return Vec::new();
            }
        };

        for record in &mut records {
            record.exists = record.path.is_file();
        }

        records
    }

    fn write_catalog(&self, records: &[ArtifactRecord]) -> Result<()> {
        let parent = self
            .catalog_path
            .parent()
            .ok_or_else(|| CoreError::FileOperationFailed("catalog has no parent directory".into()))?;

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;

        // Write to a sibling temp file, then atomically replace the catalog.
        let tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        std::io::Write::write_all(&mut tmp.as_file(), json.as_bytes())
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;
        tmp.persist(&self.catalog_path)
            .map_err(|e| CoreError::FileOperationFailed(e.to_string()))?;

        Ok(())
    }
}

/// Resolve a rename target against files already on disk.
///
/// If `desired` is free it is returned as-is; otherwise a ` (1)`, ` (2)`, ...
/// suffix is probed before the extension. When all probes collide the original
/// path is returned unchanged.
pub fn resolve_collision(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = desired.parent().unwrap_or_else(|| Path::new(""));

    for n in 1..=MAX_COLLISION_PROBES {
        let candidate_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    tracing::warn!(
        "Collision probing exhausted for {}, falling back to colliding path",
        desired.display()
    );
    desired.to_path_buf()
}
