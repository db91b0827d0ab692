use crate::error::PanelError;
use log::{debug, trace};
use reqwest::blocking::Client;
use std::time::Duration;

/// Path listing the services the backend can host.
pub const AVAILABLE_SERVERS_PATH: &str = "/available-servers";

/// The two calls a widget needs from the backend.
///
/// Paths are absolute (`/arma/start`); the implementation decides where they
/// go. Implementations are shared with the request worker thread, hence
/// `Send + Sync`.
pub trait Transport: Send + Sync {
    /// Sends a POST and ignores the response body.
    fn send_post(&self, path: &str) -> Result<(), PanelError>;

    /// Sends a GET and returns the raw response body.
    fn get_text(&self, path: &str) -> Result<String, PanelError>;
}

/// Blocking HTTP transport against one backend.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns [`PanelError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PanelError> {
        // The backend lives on the local network, never behind a proxy
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(PanelError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Turns a non-2xx response into PanelError::Status
fn check_status(path: &str, status: reqwest::StatusCode) -> Result<(), PanelError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(PanelError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        })
    }
}

impl Transport for HttpTransport {
    fn send_post(&self, path: &str) -> Result<(), PanelError> {
        debug!("POST {}", self.url(path));
        let response = self
            .client
            .post(self.url(path))
            .send()
            .map_err(|source| PanelError::Request {
                path: path.to_string(),
                source,
            })?;
        check_status(path, response.status())
    }

    fn get_text(&self, path: &str) -> Result<String, PanelError> {
        debug!("GET {}", self.url(path));
        let response = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|source| PanelError::Request {
                path: path.to_string(),
                source,
            })?;
        check_status(path, response.status())?;

        let body = response.text().map_err(|source| PanelError::Request {
            path: path.to_string(),
            source,
        })?;
        trace!("GET {} -> {}", path, body);
        Ok(body)
    }
}

/// Asks the backend which services it hosts.
///
/// # Errors
/// Fails if the request fails or the body is not a JSON array of names.
pub fn available_services(transport: &dyn Transport) -> Result<Vec<String>, PanelError> {
    let body = transport.get_text(AVAILABLE_SERVERS_PATH)?;
    serde_json::from_str(&body).map_err(PanelError::Discovery)
}
