use crate::error::ConfigError;
use crate::providers::{
    GeminiBackend, GroqGenerator, HuggingFaceBackend, LocalHashEmbeddings, OllamaBackend,
    OpenAiBackend,
};
use crate::providers::gemini::{GEMINI_CHAT_MODEL, GEMINI_EMBED_MODEL};
use crate::providers::groq::GROQ_DEFAULT_MODEL;
use crate::providers::huggingface::{HF_DEFAULT_EMBED_MODEL, HF_DEFAULT_MODEL};
use crate::providers::ollama::{
    OLLAMA_DEFAULT_EMBED_MODEL, OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL,
};
use crate::providers::openai::{OPENAI_CHAT_MODEL, OPENAI_EMBED_MODEL};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    OpenAi,
    Gemini,
    Ollama,
    Groq,
    HuggingFace,
}

impl ProviderId {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            "groq" => Some(Self::Groq),
            "huggingface" | "hf" => Some(Self::HuggingFace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::Groq => "groq",
            Self::HuggingFace => "huggingface",
        }
    }
}

/// Provider selection and credentials, resolved once from the environment at
/// startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// `None` when `LLM_PROVIDER` held an identifier no backend maps to.
    pub provider: Option<ProviderId>,
    pub raw_provider: String,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub ollama_base_url: Url,
    pub ollama_model: String,
    pub ollama_embed_model: String,
    pub groq_model: String,
    pub hf_model: String,
    pub hf_embed_model: String,
}

fn env_nonempty(variable: &str) -> Option<String> {
    std::env::var(variable).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

impl ProviderSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_provider =
            env_nonempty("LLM_PROVIDER").unwrap_or_else(|| ProviderId::OpenAi.as_str().to_string());
        let ollama_url_raw =
            env_nonempty("OLLAMA_BASE_URL").unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string());
        let ollama_base_url =
            Url::parse(&ollama_url_raw).map_err(|error| ConfigError::InvalidEndpoint {
                url: ollama_url_raw,
                details: error.to_string(),
            })?;

        Ok(Self {
            provider: ProviderId::parse(&raw_provider),
            raw_provider,
            openai_api_key: env_nonempty("OPENAI_API_KEY"),
            google_api_key: env_nonempty("GOOGLE_API_KEY"),
            groq_api_key: env_nonempty("GROQ_API_KEY"),
            huggingface_api_key: env_nonempty("HUGGINGFACE_API_KEY"),
            ollama_base_url,
            ollama_model: env_nonempty("OLLAMA_MODEL")
                .unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string()),
            ollama_embed_model: env_nonempty("OLLAMA_EMBED_MODEL")
                .unwrap_or_else(|| OLLAMA_DEFAULT_EMBED_MODEL.to_string()),
            groq_model: env_nonempty("GROQ_MODEL")
                .unwrap_or_else(|| GROQ_DEFAULT_MODEL.to_string()),
            hf_model: env_nonempty("HF_MODEL").unwrap_or_else(|| HF_DEFAULT_MODEL.to_string()),
            hf_embed_model: env_nonempty("HF_EMBED_MODEL")
                .unwrap_or_else(|| HF_DEFAULT_EMBED_MODEL.to_string()),
        })
    }

    fn provider_or_unsupported(&self) -> Result<ProviderId, ConfigError> {
        self.provider
            .ok_or_else(|| ConfigError::UnsupportedProvider(self.raw_provider.clone()))
    }
}

fn required<'a>(
    credential: &'a Option<String>,
    variable: &'static str,
) -> Result<&'a str, ConfigError> {
    credential
        .as_deref()
        .ok_or(ConfigError::MissingCredential { variable })
}

/// Embedding backend for the selected provider. Groq has no embedding API,
/// so its selection maps to the free local embedder; this cross-mapping is
/// intentional and mirrors the provider's real capability gap.
pub fn resolve_embeddings(
    settings: &ProviderSettings,
) -> Result<Arc<dyn EmbeddingBackend>, ConfigError> {
    match settings.provider_or_unsupported()? {
        ProviderId::OpenAi => {
            let api_key = required(&settings.openai_api_key, "OPENAI_API_KEY")?;
            Ok(Arc::new(OpenAiBackend::new(api_key, DEFAULT_TEMPERATURE)))
        }
        ProviderId::Gemini => {
            let api_key = required(&settings.google_api_key, "GOOGLE_API_KEY")?;
            Ok(Arc::new(GeminiBackend::new(api_key, DEFAULT_TEMPERATURE)))
        }
        ProviderId::Ollama => Ok(Arc::new(OllamaBackend::new(
            settings.ollama_base_url.clone(),
            settings.ollama_model.clone(),
            settings.ollama_embed_model.clone(),
            DEFAULT_TEMPERATURE,
        ))),
        ProviderId::Groq => Ok(Arc::new(LocalHashEmbeddings::default())),
        ProviderId::HuggingFace => {
            let api_key = required(&settings.huggingface_api_key, "HUGGINGFACE_API_KEY")?;
            Ok(Arc::new(HuggingFaceBackend::new(
                api_key,
                settings.hf_model.clone(),
                settings.hf_embed_model.clone(),
                DEFAULT_TEMPERATURE,
            )))
        }
    }
}

pub fn resolve_generator(
    settings: &ProviderSettings,
    temperature: f32,
) -> Result<Arc<dyn GenerationBackend>, ConfigError> {
    match settings.provider_or_unsupported()? {
        ProviderId::OpenAi => {
            let api_key = required(&settings.openai_api_key, "OPENAI_API_KEY")?;
            Ok(Arc::new(OpenAiBackend::new(api_key, temperature)))
        }
        ProviderId::Gemini => {
            let api_key = required(&settings.google_api_key, "GOOGLE_API_KEY")?;
            Ok(Arc::new(GeminiBackend::new(api_key, temperature)))
        }
        ProviderId::Ollama => Ok(Arc::new(OllamaBackend::new(
            settings.ollama_base_url.clone(),
            settings.ollama_model.clone(),
            settings.ollama_embed_model.clone(),
            temperature,
        ))),
        ProviderId::Groq => {
            let api_key = required(&settings.groq_api_key, "GROQ_API_KEY")?;
            Ok(Arc::new(GroqGenerator::new(
                api_key,
                settings.groq_model.clone(),
                temperature,
            )))
        }
        ProviderId::HuggingFace => {
            let api_key = required(&settings.huggingface_api_key, "HUGGINGFACE_API_KEY")?;
            Ok(Arc::new(HuggingFaceBackend::new(
                api_key,
                settings.hf_model.clone(),
                settings.hf_embed_model.clone(),
                temperature,
            )))
        }
    }
}

/// Static description of the active provider selection.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub cost: String,
    pub requires: Vec<String>,
}

/// Unknown identifiers fall back to the default provider's description.
pub fn describe_active_provider(settings: &ProviderSettings) -> ProviderInfo {
    match settings.provider.unwrap_or(ProviderId::OpenAi) {
        ProviderId::OpenAi => ProviderInfo {
            name: "OpenAI".to_string(),
            generation_model: OPENAI_CHAT_MODEL.to_string(),
            embedding_model: OPENAI_EMBED_MODEL.to_string(),
            cost: "Paid".to_string(),
            requires: vec!["OPENAI_API_KEY".to_string()],
        },
        ProviderId::Gemini => ProviderInfo {
            name: "Google Gemini".to_string(),
            generation_model: GEMINI_CHAT_MODEL.to_string(),
            embedding_model: GEMINI_EMBED_MODEL.to_string(),
            cost: "Free tier available".to_string(),
            requires: vec!["GOOGLE_API_KEY".to_string()],
        },
        ProviderId::Ollama => ProviderInfo {
            name: "Ollama (Local)".to_string(),
            generation_model: settings.ollama_model.clone(),
            embedding_model: settings.ollama_embed_model.clone(),
            cost: "100% Free (Local)".to_string(),
            requires: vec!["Ollama installed locally".to_string()],
        },
        ProviderId::Groq => ProviderInfo {
            name: "Groq".to_string(),
            generation_model: settings.groq_model.clone(),
            embedding_model: "character-ngram-hash (built-in, free)".to_string(),
            cost: "Free tier available".to_string(),
            requires: vec!["GROQ_API_KEY".to_string()],
        },
        ProviderId::HuggingFace => ProviderInfo {
            name: "Hugging Face".to_string(),
            generation_model: settings.hf_model.clone(),
            embedding_model: settings.hf_embed_model.clone(),
            cost: "Free tier available".to_string(),
            requires: vec!["HUGGINGFACE_API_KEY".to_string()],
        },
    }
}
