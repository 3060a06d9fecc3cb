use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::defs::POLL_INTERVAL_MS;
use crate::logging::{log_info, log_warning};

pub const DEFAULT_CONFIG_PATH: &str = "conf/client.conf";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: u64,
    pub poll_interval_ms: u64,
    pub sound: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout: 30,
            poll_interval_ms: POLL_INTERVAL_MS,
            sound: true,
        }
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_config(&content)))
    }

    fn from_map(config_map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let host = config_map.get("host")
            .cloned()
            .unwrap_or(defaults.host);

        let port = config_map.get("port")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let timeout = config_map.get("timeout")
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(defaults.timeout);

        // a zero interval would spin the poll task
        let poll_interval_ms = config_map.get("poll_interval_ms")
            .and_then(|i| i.parse::<u64>().ok())
            .filter(|i| *i > 0)
            .unwrap_or(defaults.poll_interval_ms);

        let sound = config_map.get("sound")
            .and_then(|s| parse_bool(s))
            .unwrap_or(defaults.sound);

        ClientConfig { host, port, timeout, poll_interval_ms, sound }
    }

    pub fn load_or_default() -> Self {
        Self::load_from_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from_or_default<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref();

        match Self::from_file(config_path) {
            Ok(config) => {
                log_info(&format!("Loaded client configuration from {}", config_path.display()));
                config
            }
            Err(e) => {
                log_warning(&format!("Could not load client config from {}: {}. Using defaults.", config_path.display(), e));
                Self::default()
            }
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_config(content: &str) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse key = value pairs
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            config.insert(key, value);
        }
    }

    config
}
