use crate::error::ConfigError;
use crate::prompt::Tone;
use crate::transport::TransportStrategy;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Gemini API key used when a command does not pass one explicitly.
    pub api_key: Option<String>,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: default_config_dir().join("config.toml"),
            api_key: None,
            service: ServiceConfig::default(),
            reliability: ReliabilityConfig::default(),
            channel: ChannelConfig::default(),
            rewrite: RewriteConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    UserDirs::new()
        .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf())
        .join(".mailcraft")
}

// ── Generative service ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API base URL (default: Gemini v1beta)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Kept low so rewrites stay close to the source text.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Deadline for a single HTTP attempt.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".into()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    700
}

fn default_attempt_timeout_secs() -> u64 {
    20
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

// ── Reliability ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Total attempts per remote call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff (ms); doubles on every retry.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Upper bound (exclusive, ms) of the uniform jitter added to each delay.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_jitter_ms() -> u64 {
    250
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

// ── Cross-context channel ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Overall deadline for one end-to-end call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Pause before re-sending after a transient delivery error.
    #[serde(default = "default_resend_delay_ms")]
    pub resend_delay_ms: u64,
    /// Re-sends allowed on the one-shot transport.
    #[serde(default = "default_resend_attempts")]
    pub resend_attempts: u32,
    #[serde(default)]
    pub transport: TransportStrategy,
}

fn default_call_timeout_secs() -> u64 {
    20
}

fn default_resend_delay_ms() -> u64 {
    500
}

fn default_resend_attempts() -> u32 {
    1
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            resend_delay_ms: default_resend_delay_ms(),
            resend_attempts: default_resend_attempts(),
            transport: TransportStrategy::default(),
        }
    }
}

// ── Rewrite defaults ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub default_tone: Tone,
}

// ── Observability ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ObservabilityConfig {
    pub fn level(&self) -> tracing::Level {
        self.log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

// ── Loading / saving ──────────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let dir = default_config_dir();
        let config_path = dir.join("config.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create .mailcraft directory")?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(e.to_string()))
            .context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("MAILCRAFT_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY"))
            && !key.trim().is_empty()
        {
            self.api_key = Some(key.trim().to_string());
        }

        if let Ok(model) = std::env::var("MAILCRAFT_MODEL")
            && !model.is_empty()
        {
            self.service.model = model;
        }

        if let Ok(endpoint) = std::env::var("MAILCRAFT_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.service.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.reliability.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "reliability.max_attempts must be at least 1".into(),
            ));
        }
        if self.service.attempt_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "service.attempt_timeout_secs must be positive".into(),
            ));
        }
        if self.channel.call_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "channel.call_timeout_secs must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.service.temperature) {
            return Err(ConfigError::Validation(format!(
                "service.temperature {} is outside 0.0..=2.0",
                self.service.temperature
            )));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    /// Credential with all but the last four characters masked.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| {
            let visible: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{visible}")
        })
    }
}
