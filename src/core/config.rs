use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{QueryForgeError, Result};
use super::modes::EnhancementMode;


const ENV_PREFIX: &str = "QUERYFORGE";


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryForgeConfig {

    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,


    pub llm_fallback_enabled: bool,
    pub llm_fallback_url: String,
    pub llm_fallback_model: String,


    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,


    pub embedding_fallback_enabled: bool,
    pub embedding_fallback_url: String,
    pub embedding_fallback_model: String,


    pub llm_timeout_ms: u64,
    pub embedding_timeout_ms: u64,
    pub max_concurrent_llm_calls: usize,


    pub embedding_cache_size: usize,
    pub embedding_cache_ttl_secs: u64,


    pub default_mode: String,
}

impl QueryForgeConfig {

    pub fn new() -> Self {
        Self {
            llm_provider: "ollama".to_string(),
            llm_model: crate::DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.3,

            llm_fallback_enabled: false,
            llm_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            llm_fallback_model: "llama3.2".to_string(),

            embedding_provider: "ollama".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,

            embedding_fallback_enabled: false,
            embedding_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_fallback_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),

            llm_timeout_ms: 10_000,
            embedding_timeout_ms: 5_000,
            max_concurrent_llm_calls: 3,

            embedding_cache_size: crate::DEFAULT_CACHE_SIZE,
            embedding_cache_ttl_secs: crate::DEFAULT_CACHE_TTL,

            default_mode: EnhancementMode::default().to_string(),
        }
    }


    /// Reads `QUERYFORGE_<FIELD>` variables on top of the defaults. Covers the
    /// same keys as the environment layer of [`QueryForgeConfig::load`].
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(format!("{ENV_PREFIX}_{name}")).ok())
    }

    fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(provider) = var("LLM_PROVIDER") {
            config.llm_provider = provider;
        }
        if let Some(model) = var("LLM_MODEL") {
            config.llm_model = model;
        }
        if let Some(key) = var("LLM_API_KEY") {
            config.llm_api_key = Some(key);
        }
        if let Some(url) = var("LLM_BASE_URL") {
            config.llm_base_url = Some(url);
        }
        if let Some(t) = parse_var(var("LLM_TEMPERATURE")) {
            config.llm_temperature = t;
        }

        if let Some(enabled) = parse_var(var("LLM_FALLBACK_ENABLED")) {
            config.llm_fallback_enabled = enabled;
        }
        if let Some(url) = var("LLM_FALLBACK_URL") {
            config.llm_fallback_url = url;
        }
        if let Some(model) = var("LLM_FALLBACK_MODEL") {
            config.llm_fallback_model = model;
        }

        if let Some(provider) = var("EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Some(model) = var("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(url) = var("EMBEDDING_URL") {
            config.embedding_url = url;
        }
        if let Some(key) = var("EMBEDDING_API_KEY") {
            config.embedding_api_key = Some(key);
        }

        if let Some(enabled) = parse_var(var("EMBEDDING_FALLBACK_ENABLED")) {
            config.embedding_fallback_enabled = enabled;
        }
        if let Some(url) = var("EMBEDDING_FALLBACK_URL") {
            config.embedding_fallback_url = url;
        }
        if let Some(model) = var("EMBEDDING_FALLBACK_MODEL") {
            config.embedding_fallback_model = model;
        }

        if let Some(ms) = parse_var(var("LLM_TIMEOUT_MS")) {
            config.llm_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(var("EMBEDDING_TIMEOUT_MS")) {
            config.embedding_timeout_ms = ms;
        }
        if let Some(n) = parse_var(var("MAX_CONCURRENT_LLM_CALLS")) {
            config.max_concurrent_llm_calls = n;
        }

        if let Some(size) = parse_var(var("EMBEDDING_CACHE_SIZE")) {
            config.embedding_cache_size = size;
        }
        if let Some(ttl) = parse_var(var("EMBEDDING_CACHE_TTL_SECS")) {
            config.embedding_cache_ttl_secs = ttl;
        }

        if let Some(mode) = var("DEFAULT_MODE") {
            config.default_mode = mode;
        }

        config
    }

    /// Layers built-in defaults, an optional TOML/JSON/YAML file and
    /// `QUERYFORGE_*` environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Self::new())?;

        let mut builder = ::config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn validate(&self) -> Result<()> {
        let check_url = |field: &str, value: &str| {
            Url::parse(value)
                .map(|_| ())
                .map_err(|e| QueryForgeError::Config(format!("{field} is not a valid URL ({value}): {e}")))
        };

        check_url("embedding_url", &self.embedding_url)?;
        check_url("llm_fallback_url", &self.llm_fallback_url)?;
        check_url("embedding_fallback_url", &self.embedding_fallback_url)?;
        if let Some(base_url) = &self.llm_base_url {
            check_url("llm_base_url", base_url)?;
        }

        if self.llm_timeout_ms == 0 || self.embedding_timeout_ms == 0 {
            return Err(QueryForgeError::Config("timeouts must be non-zero".to_string()));
        }
        if self.max_concurrent_llm_calls == 0 {
            return Err(QueryForgeError::Config(
                "max_concurrent_llm_calls must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(QueryForgeError::Config(format!(
                "llm_temperature must be within [0, 2], got {}",
                self.llm_temperature
            )));
        }

        EnhancementMode::parse(&self.default_mode)?;
        Ok(())
    }


    pub fn mode(&self) -> Result<EnhancementMode> {
        EnhancementMode::parse(&self.default_mode)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }
}

fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

impl Default for QueryForgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = QueryForgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode().unwrap(), EnhancementMode::Balanced);
        assert_eq!(config.llm_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = QueryForgeConfig {
            embedding_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(QueryForgeError::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = QueryForgeConfig {
            max_concurrent_llm_calls: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_default_mode_rejected() {
        let config = QueryForgeConfig {
            default_mode: "ludicrous".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(QueryForgeError::UnknownMode(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("queryforge-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "llm_model = \"qwen2.5:7b\"\ndefault_mode = \"quality\"\nmax_concurrent_llm_calls = 5\n",
        )
        .unwrap();

        let config = QueryForgeConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.llm_model, "qwen2.5:7b");
        assert_eq!(config.mode().unwrap(), EnhancementMode::Quality);
        assert_eq!(config.max_concurrent_llm_calls, 5);
        assert_eq!(config.embedding_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_lookup_reads_every_field() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("LLM_PROVIDER", "openai"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_BASE_URL", "https://api.example.com/v1"),
            ("LLM_TEMPERATURE", "0.9"),
            ("LLM_FALLBACK_ENABLED", "true"),
            ("LLM_FALLBACK_URL", "http://fallback:11434"),
            ("LLM_FALLBACK_MODEL", "qwen2.5:3b"),
            ("EMBEDDING_PROVIDER", "openai"),
            ("EMBEDDING_MODEL", "text-embedding-3-small"),
            ("EMBEDDING_URL", "https://api.example.com/v1"),
            ("EMBEDDING_API_KEY", "sk-embed"),
            ("EMBEDDING_FALLBACK_ENABLED", "true"),
            ("EMBEDDING_FALLBACK_URL", "http://fallback:11434"),
            ("EMBEDDING_FALLBACK_MODEL", "all-minilm"),
            ("LLM_TIMEOUT_MS", "2500"),
            ("EMBEDDING_TIMEOUT_MS", " 1500 "),
            ("MAX_CONCURRENT_LLM_CALLS", "6"),
            ("EMBEDDING_CACHE_SIZE", "64"),
            ("EMBEDDING_CACHE_TTL_SECS", "30"),
            ("DEFAULT_MODE", "speed"),
        ]
        .into_iter()
        .collect();

        let config = QueryForgeConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm_provider, "openai");
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm_base_url.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(config.llm_temperature, 0.9);
        assert!(config.llm_fallback_enabled);
        assert_eq!(config.llm_fallback_url, "http://fallback:11434");
        assert_eq!(config.llm_fallback_model, "qwen2.5:3b");
        assert_eq!(config.embedding_provider, "openai");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.embedding_url, "https://api.example.com/v1");
        assert_eq!(config.embedding_api_key.as_deref(), Some("sk-embed"));
        assert!(config.embedding_fallback_enabled);
        assert_eq!(config.embedding_fallback_url, "http://fallback:11434");
        assert_eq!(config.embedding_fallback_model, "all-minilm");
        assert_eq!(config.llm_timeout_ms, 2_500);
        assert_eq!(config.embedding_timeout_ms, 1_500);
        assert_eq!(config.max_concurrent_llm_calls, 6);
        assert_eq!(config.embedding_cache_size, 64);
        assert_eq!(config.embedding_cache_ttl_secs, 30);
        assert_eq!(config.mode().unwrap(), EnhancementMode::Speed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_queries_every_config_key() {
        let asked = std::cell::RefCell::new(Vec::new());
        QueryForgeConfig::from_lookup(|name| {
            asked.borrow_mut().push(name.to_lowercase());
            None
        });

        let defaults = serde_json::to_value(QueryForgeConfig::new()).unwrap();
        let asked = asked.into_inner();
        for key in defaults.as_object().unwrap().keys() {
            assert!(asked.contains(key), "environment key for {key} is never read");
        }
    }

    #[test]
    fn test_from_lookup_ignores_unparseable_values() {
        let config = QueryForgeConfig::from_lookup(|name| {
            (name == "LLM_TIMEOUT_MS" || name == "LLM_FALLBACK_ENABLED").then(|| "soon".to_string())
        });
        assert_eq!(config.llm_timeout_ms, 10_000);
        assert!(!config.llm_fallback_enabled);
    }
}
