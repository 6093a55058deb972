pub mod openai_tool_provider;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use itembox_tool_runtime::provider::{LlmError, ToolAwareLlmProvider};

use self::openai_tool_provider::OpenAiToolProvider;

/// Supported chat-completions backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Base URL; `/v1/chat/completions` is appended per request.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai",
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "llama3.2",
        }
    }

    /// Environment variable holding the API key, if the backend needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(LlmError::NotConfigured(format!(
                "unknown LLM provider: '{}'",
                other
            ))),
        }
    }
}

/// Fully resolved provider settings. Unset fields fall back to the
/// provider's defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Create the provider described by `settings`.
pub fn create_provider(
    settings: &ProviderSettings,
) -> Result<Arc<dyn ToolAwareLlmProvider>, LlmError> {
    let kind = settings.kind;
    let api_key = settings.api_key.clone().filter(|k| !k.is_empty());
    if let (Some(env_key), None) = (kind.api_key_env(), &api_key) {
        return Err(LlmError::NotConfigured(format!(
            "{} requires an API key (set {} or pass --api-key)",
            kind, env_key
        )));
    }

    let model = settings
        .model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());
    let base_url = settings
        .base_url
        .clone()
        .unwrap_or_else(|| kind.default_base_url().to_string());

    Ok(Arc::new(OpenAiToolProvider::new(
        kind.as_str().to_string(),
        api_key,
        model,
        base_url,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("groq".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(LlmError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_groq_defaults() {
        let settings = ProviderSettings {
            api_key: Some("gsk_test".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.provider_name(), "groq");
        assert_eq!(provider.model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let settings = ProviderSettings {
            kind: ProviderKind::OpenAi,
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&settings),
            Err(LlmError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = ProviderSettings {
            kind: ProviderKind::Ollama,
            model: Some("qwen2.5".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.model(), "qwen2.5");
    }
}
