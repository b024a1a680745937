use ikd_core::error::CoreError;

use crate::api::ApiError;

/// Error returned by page operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally (validation, missing evidence, unknown id).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Text for the alert dialog or inline form message.
    pub fn alert_message(&self) -> String {
        match self {
            ClientError::Core(CoreError::Validation(msg)) => msg.clone(),
            ClientError::Core(other) => other.to_string(),
            ClientError::Api(api) => api.alert_message(),
            ClientError::Io(e) => format!("Gagal menyimpan file: {e}"),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api(api) if api.is_unauthorized())
    }
}
