//! REST client for the IKD backend.
//!
//! Wraps the backend HTTP API (roster, catalog, evidence, scores,
//! deleted-key markers) using [`reqwest`]. Every request carries the
//! bearer token and a fresh `X-Request-Id`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use ikd_core::catalog::Activity;
use ikd_core::evidence::{DeletedKey, Evidence, EvidenceKey, ScoreUpdate};
use ikd_core::roles::Role;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;
use ikd_core::upload::UploadFile;

use crate::backend::IkdBackend;

/// Shown when a failed response carries no readable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Terjadi kesalahan pada server";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for one IKD backend.
#[derive(Clone)]
pub struct IkdApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

/// Errors from the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body
    /// decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the bearer token (HTTP 401).
    #[error("Unauthorized: session expired")]
    Unauthorized,

    /// The backend returned a non-2xx status other than 401.
    #[error("IKD API error ({status}): {message}")]
    Api {
        status: u16,
        /// Message extracted from the body, or [`GENERIC_ERROR_MESSAGE`].
        message: String,
    },
}

impl ApiError {
    /// Text for the blocking alert dialog.
    pub fn alert_message(&self) -> String {
        match self {
            ApiError::Api { message, .. } => message.clone(),
            ApiError::Unauthorized => "Sesi berakhir, silakan login kembali".to_string(),
            ApiError::Request(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// List and record responses come either bare or wrapped in `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, then `error`; falls back to
/// [`GENERIC_ERROR_MESSAGE`].
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"].iter().find_map(|field| {
                json.get(*field)
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

impl IkdApi {
    /// Create a client for the backend at `api_url` (no trailing slash
    /// needed) authenticating with `token`.
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url, token))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
    }

    /// Map 401 to [`ApiError::Unauthorized`] and any other failure status
    /// to [`ApiError::Api`] with the body's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.into_inner())
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IkdBackend for IkdApi {
    async fn list_users(&self, role: &Role) -> Result<Vec<Lecturer>, ApiError> {
        let response = self
            .request(Method::GET, "/users")
            .query(&[("role", role.as_wire())])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_user(&self, id: DbId) -> Result<Lecturer, ApiError> {
        let response = self
            .request(Method::GET, &format!("/users/{id}"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_catalog(&self, unit: UnitKerja) -> Result<Vec<Activity>, ApiError> {
        let response = self
            .request(Method::GET, "/pedoman")
            .query(&[("unit_kerja", unit.slug())])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn lookup_catalog(&self, ids: &[DbId]) -> Result<Vec<Activity>, ApiError> {
        let response = self
            .request(Method::POST, "/pedoman/lookup")
            .json(&serde_json::json!({ "ids": ids }))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_evidence(&self, unit: UnitKerja) -> Result<Vec<Evidence>, ApiError> {
        let response = self
            .request(Method::GET, "/bukti-fisik")
            .query(&[("unit_kerja", unit.slug())])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn upload_evidence(
        &self,
        key: EvidenceKey,
        unit: UnitKerja,
        file: &UploadFile,
    ) -> Result<Evidence, ApiError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type())?;
        let form = reqwest::multipart::Form::new()
            .text("dosen_id", key.lecturer_id.to_string())
            .text("pedoman_id", key.activity_id.to_string())
            .text("unit_kerja", unit.slug())
            .part("file", part);

        let response = self
            .request(Method::POST, "/bukti-fisik")
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete_evidence(&self, id: DbId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("/bukti-fisik/{id}"))
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn download_evidence(&self, id: DbId) -> Result<Vec<u8>, ApiError> {
        let response = self
            .request(Method::GET, &format!("/bukti-fisik/{id}/download"))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn update_score(&self, update: &ScoreUpdate) -> Result<Evidence, ApiError> {
        let response = self
            .request(Method::PUT, "/bukti-fisik/skor")
            .json(update)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_deleted_keys(&self, unit: UnitKerja) -> Result<Vec<DeletedKey>, ApiError> {
        let response = self
            .request(Method::GET, "/deleted-keys")
            .query(&[("unit_kerja", unit.slug())])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn mark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, "/deleted-keys")
            .json(marker)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn unmark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, "/deleted-keys")
            .json(marker)
            .send()
            .await?;
        Self::check_status(response).await
    }
}
