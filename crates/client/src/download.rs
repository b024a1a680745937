//! Saving evidence files to disk.

use std::path::{Path, PathBuf};

use ikd_core::evidence::Evidence;

use crate::backend::IkdBackend;
use crate::error::ClientResult;

/// File name to write `record` under. Strips any directory part the
/// backend may have stored and falls back to `bukti-<id>`.
pub fn local_file_name(record: &Evidence) -> String {
    let base = record
        .file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        format!("bukti-{}", record.id)
    } else {
        base.to_string()
    }
}

/// Fetch the file through the authenticated client and write it into
/// `dir`, creating the directory when needed. Returns the written path.
pub async fn download_to(
    backend: &dyn IkdBackend,
    record: &Evidence,
    dir: &Path,
) -> ClientResult<PathBuf> {
    let bytes = backend.download_evidence(record.id).await?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(local_file_name(record));
    tokio::fs::write(&path, &bytes).await?;
    tracing::info!(
        evidence_id = record.id,
        path = %path.display(),
        bytes = bytes.len(),
        "Evidence downloaded",
    );
    Ok(path)
}
