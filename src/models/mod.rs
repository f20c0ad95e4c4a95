use serde::{Deserialize, Serialize};

/// One entry of the whisper.cpp model catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Model identifier, e.g. `base` or `large-v3`
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Approximate download size in megabytes
    pub size_mb: u64,
}

/// Static model catalog.
///
/// Download and on-disk acquisition are handled outside the core; the
/// transcription path only ever consumes a resolved model identifier.
pub fn list_models() -> Vec<ModelInfo> {
    [
        ("tiny", "Whisper Tiny", 75),
        ("base", "Whisper Base", 142),
        ("small", "Whisper Small", 466),
        ("medium", "Whisper Medium", 1536),
        ("large-v3", "Whisper Large v3", 3100),
    ]
    .into_iter()
    .map(|(id, name, size_mb)| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        size_mb,
    })
    .collect()
}
