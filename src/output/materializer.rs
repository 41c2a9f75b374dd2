//! Writes downloaded job results to disk.
//!
//! The payload is either written verbatim (`csv`) or converted to an array of
//! keyed records (`json`). Data goes to a temporary file in the destination
//! directory which is then persisted over the final path, so a failed write
//! never leaves a truncated result behind.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use tempfile::Builder;
use tracing::{debug, info};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// FileFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Output format, which is also the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Result text written unchanged.
    #[default]
    Csv,
    /// Result rows as a pretty-printed JSON array of objects.
    Json,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            other => Err(format!(
                "unsupported file format '{}' (expected csv or json)",
                other
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WrittenFile
// ─────────────────────────────────────────────────────────────────────────────

/// Describes a result file that has been fully written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenFile {
    pub path: PathBuf,
    pub file_name: String,
    pub format: FileFormat,
    pub bytes_written: usize,
    /// `"{name}.{ext} file successfully generated at {path}"`
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Persists a results payload as `{output_dir}/{file_name}.{format}`.
///
/// `output_dir` is created if missing (one level only; its parent must
/// exist). An existing file at the target path is replaced without warning.
///
/// Returns only once the file is on disk.
///
/// # Errors
///
/// Returns `AppError::RemoteOperationFailure` if the directory cannot be
/// created, the payload is not valid CSV (`json` only), or the write fails.
pub async fn write_results(
    payload: Vec<u8>,
    output_dir: PathBuf,
    file_name: String,
    format: FileFormat,
) -> Result<WrittenFile, AppError> {
    tokio::task::spawn_blocking(move || {
        write_results_blocking(&payload, &output_dir, &file_name, format)
    })
    .await
    .map_err(|e| AppError::RemoteOperationFailure(format!("File write task failed: {}", e)))?
}

/// Synchronous body of [`write_results`].
pub fn write_results_blocking(
    payload: &[u8],
    output_dir: &Path,
    file_name: &str,
    format: FileFormat,
) -> Result<WrittenFile, AppError> {
    ensure_output_dir(output_dir)?;

    let contents: Cow<'_, [u8]> = match format {
        FileFormat::Csv => Cow::Borrowed(payload),
        FileFormat::Json => {
            let json = csv_to_json(&String::from_utf8_lossy(payload))?;
            Cow::Owned(json.into_bytes())
        }
    };

    let full_name = format!("{}.{}", file_name, format.extension());
    let path = output_dir.join(&full_name);

    persist_atomically(&path, &contents).map_err(|e| {
        AppError::RemoteOperationFailure(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        ))
    })?;

    info!("[BULK] Wrote {} bytes to {:?}", contents.len(), path);

    Ok(WrittenFile {
        message: format!(
            "{} file successfully generated at {}",
            full_name,
            path.display()
        ),
        path,
        file_name: file_name.to_string(),
        format,
        bytes_written: contents.len(),
    })
}

/// Converts CSV text into a pretty-printed JSON array of objects.
///
/// The first row supplies the keys, in order. Every value stays a string.
/// Short rows are padded with `""`; surplus fields are dropped.
pub fn csv_to_json(payload: &str) -> Result<String, AppError> {
    let records = parse_records(payload).map_err(|e| {
        AppError::RemoteOperationFailure(format!("Failed to parse result CSV: {}", e))
    })?;

    serde_json::to_string_pretty(&records).map_err(|e| {
        AppError::RemoteOperationFailure(format!("Failed to serialize results as JSON: {}", e))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_records(payload: &str) -> Result<Vec<Map<String, Value>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let value = row.get(i).unwrap_or("");
                (key.to_string(), Value::String(value.to_string()))
            })
            .collect();
        records.push(record);
    }

    debug!("[BULK] Parsed {} result rows", records.len());
    Ok(records)
}

fn ensure_output_dir(dir: &Path) -> Result<(), AppError> {
    if dir.is_dir() {
        return Ok(());
    }

    match std::fs::create_dir(dir) {
        Ok(()) => {
            info!("[BULK] Created output directory {:?}", dir);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(AppError::RemoteOperationFailure(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))),
    }
}

fn persist_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Cannot determine parent directory for: {}", path.display()),
        )
    })?;

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create would use; the umask still applies.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut temp_file = builder.tempfile_in(parent)?;

    // Overwrites keep the mode of the file being replaced.
    #[cfg(unix)]
    {
        if let Ok(existing) = std::fs::metadata(path) {
            temp_file.as_file().set_permissions(existing.permissions())?;
        }
    }

    temp_file.write_all(contents)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
