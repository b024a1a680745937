//! Evidence upload form validation.
//!
//! Runs before any network call; a rejected file never reaches the backend.

use crate::error::CoreError;

/// Largest accepted evidence file (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted evidence file extensions (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "doc", "docx", "xls", "xlsx", "zip",
];

/// A file picked for upload, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// MIME type sent with the multipart part.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("doc") => "application/msword",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Some("xls") => "application/vnd.ms-excel",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("zip") => "application/zip",
            _ => "application/octet-stream",
        }
    }
}

/// Validate name, extension and size of a picked file.
pub fn validate_upload(file: &UploadFile) -> Result<(), CoreError> {
    let name = file.file_name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Pilih file terlebih dahulu".into()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CoreError::Validation(format!(
            "Nama file tidak valid: '{name}'"
        )));
    }
    match file.extension() {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(CoreError::Validation(format!(
                "Format file '{name}' tidak didukung. Gunakan: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        }
    }
    if file.bytes.is_empty() {
        return Err(CoreError::Validation(format!("File '{name}' kosong")));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "Ukuran file '{name}' melebihi {} MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}
