use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use itembox_core::config::LlmConfig;
use itembox_llm::{ProviderKind, ProviderSettings};

use crate::cli::CliArgs;

/// Agent configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default LLM provider name (groq, openai, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model per provider
    #[serde(default)]
    pub default_models: HashMap<String, String>,

    /// API keys keyed by provider name
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    /// Endpoint overrides keyed by provider name
    #[serde(default)]
    pub base_urls: HashMap<String, String>,

    /// System prompt used when `--system-prompt` is not given
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Maximum context window tokens
    #[serde(default = "default_max_tokens")]
    pub max_context_tokens: usize,
}

fn default_provider() -> String {
    ProviderKind::default().as_str().to_string()
}

fn default_max_tokens() -> usize {
    100_000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_models: HashMap::new(),
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
            system_prompt: None,
            max_context_tokens: default_max_tokens(),
        }
    }
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/itembox-agent/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("itembox-agent");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            let config = Self::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let toml_str = toml::to_string_pretty(&config)
                .context("failed to serialize default config")?;
            std::fs::write(&config_path, toml_str).ok();
            Ok(config)
        }
    }

    /// Resolve the provider. Priority: cli_override (or `LLM_PROVIDER`) > config file.
    pub fn resolve_provider(&self, cli_override: Option<&str>) -> Result<ProviderKind> {
        let name = cli_override.unwrap_or(&self.default_provider);
        name.parse::<ProviderKind>()
            .with_context(|| format!("unsupported provider '{}'", name))
    }

    /// Resolve an API key for the given provider.
    /// Priority: cli_override > env var > config file.
    pub fn resolve_api_key(
        &self,
        kind: ProviderKind,
        cli_override: Option<&str>,
        env: &LlmConfig,
    ) -> Option<String> {
        if let Some(key) = cli_override {
            return Some(key.to_string());
        }
        if let Some(key) = env.api_key_for(kind.as_str()) {
            return Some(key.to_string());
        }
        self.api_keys.get(kind.as_str()).cloned()
    }

    /// Resolve the model name for a provider.
    /// Priority: cli_override > config file > `LLM_MODEL` > provider default.
    pub fn resolve_model(
        &self,
        kind: ProviderKind,
        cli_override: Option<&str>,
        env: &LlmConfig,
    ) -> String {
        if let Some(model) = cli_override {
            return model.to_string();
        }
        if let Some(model) = self.default_models.get(kind.as_str()) {
            return model.clone();
        }
        env.model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_string())
    }

    /// Endpoint override for a provider: config file, then `LLM_BASE_URL`.
    pub fn resolve_base_url(&self, kind: ProviderKind, env: &LlmConfig) -> Option<String> {
        self.base_urls
            .get(kind.as_str())
            .cloned()
            .or_else(|| env.base_url.clone())
    }

    /// Everything needed to build the LLM provider for this run.
    pub fn provider_settings(&self, args: &CliArgs, env: &LlmConfig) -> Result<ProviderSettings> {
        let kind = self.resolve_provider(args.provider.as_deref())?;
        Ok(ProviderSettings {
            kind,
            api_key: self.resolve_api_key(kind, args.api_key.as_deref(), env),
            model: Some(self.resolve_model(kind, args.model.as_deref(), env)),
            base_url: self.resolve_base_url(kind, env),
        })
    }

    /// System prompt: flag first, then the config file.
    pub fn resolve_system_prompt(&self, cli_override: Option<&str>) -> Option<String> {
        cli_override
            .map(String::from)
            .or_else(|| self.system_prompt.clone())
    }
}
