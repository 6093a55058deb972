use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ITEMBOX_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ITEMBOX_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            store: StoreConfig::from_env_profiled(p),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  store:       db_path={}", self.store.db_path.display());
        tracing::info!(
            "  server:      transport={}, bind={}",
            self.server.transport,
            self.server.bind_address()
        );
        tracing::info!(
            "  llm:         provider={}, model={}, api_key={}",
            self.llm.provider,
            self.llm.model.as_deref().unwrap_or("(provider default)"),
            if self.llm.api_key().is_some() { "set" } else { "unset" }
        );
    }
}

// ── Store ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file backing the item store.
    pub db_path: PathBuf,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            db_path: PathBuf::from(profiled_env_or(p, "ITEMBOX_DB_PATH", "database.db")),
        }
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub transport: Transport,
    /// Bind host for the HTTP transports; ignored for stdio.
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let transport = profiled_env_opt(p, "ITEMBOX_TRANSPORT")
            .and_then(|v| match v.parse() {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring ITEMBOX_TRANSPORT, using stdio");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            transport,
            host: profiled_env_or(p, "ITEMBOX_HOST", "127.0.0.1"),
            port: profiled_env_u16(p, "ITEMBOX_PORT", 8000),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "groq", "openai", "ollama"
    pub provider: String,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "groq").to_lowercase(),
            groq_api_key: profiled_env_opt(p, "GROQ_API_KEY"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            model: profiled_env_opt(p, "LLM_MODEL"),
            base_url: profiled_env_opt(p, "LLM_BASE_URL"),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.0")
                .parse()
                .unwrap_or(0.0),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 4096),
        }
    }

    /// API key from the environment for the selected provider.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key_for(&self.provider)
    }

    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        match provider {
            "groq" => self.groq_api_key.as_deref(),
            "openai" => self.openai_api_key.as_deref(),
            _ => None,
        }
    }
}

// ── Transport ─────────────────────────────────────────────────

/// How the MCP server talks to its client. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// Legacy HTTP+SSE transport (`GET /sse`, `POST /messages`).
    Sse,
    /// Single-endpoint HTTP transport (`POST /mcp`).
    StreamableHttp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Sse => "sse",
            Transport::StreamableHttp => "streamable-http",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "sse" => Ok(Transport::Sse),
            "streamable-http" | "streamable_http" | "http" => Ok(Transport::StreamableHttp),
            other => Err(format!(
                "unknown transport '{}' (expected stdio, sse or streamable-http)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_parses_known_names() {
        assert_eq!("stdio".parse::<Transport>().unwrap(), Transport::Stdio);
        assert_eq!("SSE".parse::<Transport>().unwrap(), Transport::Sse);
        assert_eq!(
            "streamable-http".parse::<Transport>().unwrap(),
            Transport::StreamableHttp
        );
        assert!("websocket".parse::<Transport>().is_err());
    }

    #[test]
    fn transport_display_matches_parse() {
        for t in [Transport::Stdio, Transport::Sse, Transport::StreamableHttp] {
            assert_eq!(t.to_string().parse::<Transport>().unwrap(), t);
        }
    }

    #[test]
    fn transport_serde_is_kebab_case() {
        let json = serde_json::to_string(&Transport::StreamableHttp).unwrap();
        assert_eq!(json, "\"streamable-http\"");
    }

    #[test]
    fn llm_api_key_follows_provider() {
        let llm = LlmConfig {
            provider: "groq".to_string(),
            groq_api_key: Some("gsk".to_string()),
            openai_api_key: None,
            model: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: 4096,
        };
        assert_eq!(llm.api_key(), Some("gsk"));
        assert_eq!(llm.api_key_for("openai"), None);

        let ollama = LlmConfig {
            provider: "ollama".to_string(),
            ..llm
        };
        assert_eq!(ollama.api_key(), None);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let server = ServerConfig {
            transport: Transport::Sse,
            host: "0.0.0.0".to_string(),
            port: 9000,
        };
        assert_eq!(server.bind_address(), "0.0.0.0:9000");
    }
}
