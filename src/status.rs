use crate::error::PanelError;
use serde::Deserialize;

/// The only `state` value the backend uses for a running server.
pub const STATE_ON: &str = "On";

/// Status text shown before the first refresh has been applied.
pub const INITIAL_STATUS: &str = "Status: Off";

/// Status text shown after a refresh failed.
pub const FALLBACK_STATUS: &str = "Status: Unknown";

/// Players connected to a running server
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Players {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub name_tags: Vec<String>,
}

/// One `get_status` response from the backend.
///
/// `state` is kept as the raw string: the backend reports `"On"`, `"Off"` or
/// `"Unknown"`, and anything it reports is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub state: String,
    #[serde(default)]
    pub players: Option<Players>,
}

impl ServiceStatus {
    /// Parses a raw response body.
    ///
    /// # Errors
    /// Returns [`PanelError::Payload`] when the body is not a status record.
    pub fn from_json(body: &str) -> Result<Self, PanelError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }

    /// Builds the line displayed in the widget.
    ///
    /// `"Status: <state>"`, plus the player count when the server is on, plus
    /// the comma-joined name tags when at least one player is known by name.
    /// A running server that sent no `players` record counts as empty.
    pub fn display_text(&self) -> String {
        let mut text = format!("Status: {}", self.state);
        if !self.is_on() {
            return text;
        }

        let empty = Players::default();
        let players = self.players.as_ref().unwrap_or(&empty);
        text.push_str(&format!(", Player count: {}", players.count));
        if !players.name_tags.is_empty() {
            text.push_str(&format!(", Player nametags: {}", players.name_tags.join(",")));
        }
        text
    }
}
