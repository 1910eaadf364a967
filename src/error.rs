use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidView(String),

    #[error("stored {key} is not valid: {source}")]
    CorruptStore {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error("could not reach attendance service: {0}")]
    RemoteUnreachable(String),

    #[error("attendance service returned HTTP {status} for {path}")]
    RemoteHttp { status: u16, path: String },

    #[error("attendance service sent an unreadable response: {0}")]
    RemoteBadResponse(String),

    #[error("{0}")]
    RemoteRejected(String),
}

impl RollcallError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        RollcallError::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Stable code reported on the IPC error object.
    pub fn code(&self) -> &'static str {
        match self {
            RollcallError::NotFound { .. } => "not_found",
            RollcallError::Validation(_) => "validation_failed",
            RollcallError::InvalidView(_) => "bad_view",
            RollcallError::CorruptStore { .. } => "corrupt_store",
            RollcallError::Encode { .. } => "encode_failed",
            RollcallError::Db(_) => "db_query_failed",
            RollcallError::RemoteUnreachable(_) => "remote_unreachable",
            RollcallError::RemoteHttp { .. } => "remote_http",
            RollcallError::RemoteBadResponse(_) => "remote_bad_response",
            RollcallError::RemoteRejected(_) => "remote_rejected",
        }
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;
