use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:31415";
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// One managed game server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,     // Identifier used on the command line
    pub title: String,    // Heading shown above the controls
    pub endpoint: String, // Path prefix on the backend, e.g. "arma" for /arma/start
    pub element_id: String, // Id of the status element, also salts the egui ids
}

impl ServiceConfig {
    /// A service whose endpoint is its name and whose status element is
    /// `<name>-status`.
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            endpoint: name.to_string(),
            element_id: format!("{}-status", name),
        }
    }

    /// Used for services found through discovery, which only have a name.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        let title = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self::new(name, &title)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("arma", "Arma"),
        ServiceConfig::new("minecraft", "Minecraft"),
    ]
}

fn default_refresh_delay_ms() -> u64 {
    DEFAULT_REFRESH_DELAY_MS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

// Configuration data saved to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,
    /// Delay between a start/stop command and the refresh that follows it.
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
    /// Interval of the background `refresh(false)` poll. 0 disables polling.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub discover_services: bool,
    #[serde(default)]
    pub refresh_on_launch: bool,
}

// Default values for a new configuration
impl Default for ConfigData {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            services: default_services(),
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            discover_services: false,
            refresh_on_launch: false,
        }
    }
}

impl ConfigData {
    pub fn find_service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Appends a default definition for every name not configured yet.
    /// Returns the definitions that were added.
    pub fn merge_discovered(&mut self, names: &[String]) -> Vec<ServiceConfig> {
        let mut added = Vec::new();
        for name in names {
            if self.find_service(name).is_none() {
                let service = ServiceConfig::from_name(name);
                self.services.push(service.clone());
                added.push(service);
            }
        }
        added
    }
}
