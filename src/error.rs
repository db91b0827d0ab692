use thiserror::Error;

// Everything that can go wrong between the panel and the backend
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} answered with HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("malformed status payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("malformed service list: {0}")]
    Discovery(#[source] serde_json::Error),

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("request worker is not running")]
    WorkerStopped,

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
