use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub port_fallback_attempts: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Synthesis provider
    pub provider_base_url: String,
    pub provider_api_key: Option<String>,
    pub provider_model: String,
    pub provider_timeout_secs: u64,
    pub max_chunk_chars: usize,
    // TTS Cache
    pub tts_cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match env::var("LOG_FORMAT").unwrap_or_default().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T::Err: std::error::Error + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => Ok(raw.trim().parse()?),
        _ => Ok(default),
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|s| s.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080)?,
            port_fallback_attempts: parse_or("PORT_FALLBACK_ATTEMPTS", 10)?,
            environment: match env::var("ENVIRONMENT").unwrap_or_default().as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: LogFormat::from_env(),
            provider_base_url: env::var("TTS_PROVIDER_BASE_URL")?,
            provider_api_key: env::var("TTS_PROVIDER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            provider_model: env::var("TTS_PROVIDER_MODEL")
                .unwrap_or_else(|_| "eleven_multilingual_v2".to_string()),
            provider_timeout_secs: parse_or("TTS_PROVIDER_TIMEOUT_SECS", 30)?,
            max_chunk_chars: parse_or("TTS_MAX_CHUNK_CHARS", 5000)?,
            tts_cache_enabled: flag("TTS_CACHE_ENABLED"),
        };

        Ok(config)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// Settings of the relay client and batch orchestrator
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ws_url: String,
    pub probe_url: String,
    pub chunk_char_limit: usize,
    pub chunk_timeout: Duration,
    pub connect_timeout: Duration,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
    pub reconnect_max_attempts: u32,
    pub strict_correlation: bool,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8080/ws".to_string(),
            probe_url: "http://127.0.0.1:8080/api/health".to_string(),
            chunk_char_limit: 500,
            chunk_timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
            reconnect_base_delay: Duration::from_millis(5000),
            reconnect_max_delay: Duration::from_millis(60_000),
            reconnect_max_attempts: 6,
            strict_correlation: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let defaults = ClientConfig::default();
        let config = ClientConfig {
            ws_url: env::var("RELAY_WS_URL").unwrap_or(defaults.ws_url),
            probe_url: env::var("RELAY_PROBE_URL").unwrap_or(defaults.probe_url),
            chunk_char_limit: parse_or("RELAY_CHUNK_CHAR_LIMIT", defaults.chunk_char_limit)?,
            chunk_timeout: Duration::from_secs(parse_or("RELAY_CHUNK_TIMEOUT_SECS", 20)?),
            connect_timeout: Duration::from_secs(parse_or("RELAY_CONNECT_TIMEOUT_SECS", 10)?),
            reconnect_base_delay: Duration::from_millis(parse_or("RELAY_RECONNECT_BASE_MS", 5000)?),
            reconnect_max_delay: Duration::from_millis(parse_or("RELAY_RECONNECT_MAX_MS", 60_000)?),
            reconnect_max_attempts: parse_or(
                "RELAY_RECONNECT_MAX_ATTEMPTS",
                defaults.reconnect_max_attempts,
            )?,
            strict_correlation: flag("RELAY_STRICT_CORRELATION"),
            log_format: LogFormat::from_env(),
        };

        Ok(config)
    }
}
