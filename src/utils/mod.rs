use std::path::Path;

use crate::{CoreError, Result};

/// Format duration in human-readable form
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, spaces, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Check if a file exists and is readable
pub fn check_file_accessible(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CoreError::NotFound(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(CoreError::Validation(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    std::fs::metadata(path).map_err(|e| {
        CoreError::FileOperationFailed(format!("Cannot access file {}: {}", path.display(), e))
    })?;

    Ok(())
}

/// Check if the current environment has the required external tools
pub async fn check_dependencies(engine_binary: &Path) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&engine_binary.to_string_lossy()).await {
        missing.push(format!(
            "{} - required for transcription (build it from whisper.cpp)",
            engine_binary.display()
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--help")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello World!"), "Hello World_");
        assert_eq!(sanitize_filename("test/file?name"), "test_file_name");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
    }

    #[test]
    fn test_check_file_accessible_missing() {
        let err = check_file_accessible(Path::new("/no/such/file.wav")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
