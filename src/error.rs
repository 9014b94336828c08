use std::time::Duration;

/// Failure of a single call against the backend under test.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Reply(String),

    #[error("unexpected reply to {command}: {detail}")]
    UnexpectedReply { command: String, detail: String },
}

impl BackendError {
    pub fn unexpected(command: &str, detail: impl Into<String>) -> Self {
        BackendError::UnexpectedReply {
            command: command.to_string(),
            detail: detail.into(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: BackendError,
    },

    #[error("invalid value '{value}' for {name}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("run is not connected")]
    NotConnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
