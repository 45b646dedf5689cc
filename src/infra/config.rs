// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, host:port.
    pub bind: String,
    /// Upper bound on request bodies, which are dominated by log uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".into(),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where uploaded log files are kept. Created at startup.
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploaded_logs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// OpenAI-compatible API root, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// When set, each session keeps its conversation history and replays
    /// it on every chat call. Off by default: every question is answered
    /// against the telemetry alone.
    #[serde(default)]
    pub conversation_memory: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.together.xyz/v1".into(),
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".into(),
            temperature: 0.7,
            max_tokens: 512,
            conversation_memory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Capacity bound on live sessions; the least-recently-used entry is
    /// evicted when the registry would grow past this.
    pub max_sessions: usize,
    /// Sessions idle longer than this are swept.
    pub idle_ttl_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_ttl_secs: 3600,
        }
    }
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

impl Config {
    /// Load config from a file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.server.bind, "127.0.0.1:8000");
        assert_eq!(c.server.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(c.storage.upload_dir, PathBuf::from("uploaded_logs"));
        assert_eq!(c.chat.max_tokens, 512);
        assert!((c.chat.temperature - 0.7).abs() < 0.001);
        assert!(!c.chat.conversation_memory);
        assert_eq!(c.sessions.max_sessions, 1024);
        assert_eq!(c.sessions.idle_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chat.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert!(config.chat.base_url.ends_with("/v1"));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:9000"
max_upload_bytes = 1048576

[storage]
upload_dir = "/var/lib/aerolog/logs"

[chat]
base_url = "http://localhost:11434/v1"
model = "llama3"
temperature = 0.2
max_tokens = 1024
conversation_memory = true

[sessions]
max_sessions = 16
idle_ttl_secs = 120
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
        assert_eq!(config.storage.upload_dir, PathBuf::from("/var/lib/aerolog/logs"));
        assert_eq!(config.chat.model, "llama3");
        assert!((config.chat.temperature - 0.2).abs() < 0.001);
        assert!(config.chat.conversation_memory);
        assert_eq!(config.sessions.max_sessions, 16);
        assert_eq!(config.sessions.idle_ttl_secs, 120);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[chat]\nbase_url = \"http://x/v1\"\nmodel = \"m\"\ntemperature = 0.0\nmax_tokens = 1\n").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.chat.model, "m");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.server.bind, config.server.bind);
        assert_eq!(deserialized.chat.model, config.chat.model);
        assert_eq!(deserialized.sessions.max_sessions, config.sessions.max_sessions);
    }

    #[test]
    fn test_load_nonexistent_file() {
        assert!(Config::load_from(Path::new("/nonexistent/aerolog.toml")).is_err());
    }

    #[test]
    fn test_load_none_is_default() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }
}
