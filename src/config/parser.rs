use super::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            format!("sqlite://{}", default_database_file())
        }
    }

    pub fn sqlite_path(&self) -> String {
        let url = self.connection_string();
        url.strip_prefix("sqlite://").unwrap_or(&url).to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_api_url")]
    pub api_url: String,
    #[serde(default = "default_inference_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: default_inference_api_url(),
            model_id: default_inference_model_id(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroqConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_groq_model")]
    pub model: String,
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_groq_model(),
            base_url: default_groq_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct QuizConfig {
    /// Quiz script JSON. The bundled script is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config.yaml"));

        Self::load_from_file(&config_path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.sqlite_path().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database path cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.inference.model_id.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "inference.model_id cannot be empty".to_string(),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.max_body_bytes must be positive".to_string(),
            ));
        }

        if self
            .llm
            .groq
            .api_key
            .as_ref()
            .is_some_and(|key| key.expose_secret().trim().is_empty())
        {
            return Err(ConfigError::InvalidConfig(
                "llm.groq.api_key cannot be blank when set".to_string(),
            ));
        }

        for (field, value) in [
            ("inference.api_url", &self.inference.api_url),
            ("llm.groq.base_url", &self.llm.groq.base_url),
            ("llm.gemini.base_url", &self.llm.gemini.base_url),
        ] {
            Url::parse(value).map_err(|e| {
                ConfigError::InvalidConfig(format!("{} is not a valid URL: {}", field, e))
            })?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies `ROBOFLOW_API_KEY`, `GROQ_API_KEY`, `GEMINI_API_KEY` and
    /// `DATABASE_URL` as returned by `lookup` over the file values.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ROBOFLOW_API_KEY") {
            self.inference.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = lookup("GROQ_API_KEY") {
            self.llm.groq.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = lookup("GEMINI_API_KEY") {
            self.llm.gemini.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.database.url = Some(value);
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_database_file() -> String {
    "scans.db".to_string()
}

fn default_inference_api_url() -> String {
    "https://detect.roboflow.com".to_string()
}

fn default_inference_model_id() -> String {
    "early-detection-xvxmf/1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_groq_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").expect("parse");

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.database.sqlite_path(), "scans.db");
        assert_eq!(config.inference.model_id, "early-detection-xvxmf/1");
        assert_eq!(config.llm.groq.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.gemini.model, "gemini-2.0-flash");
        assert!(config.quiz.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn database_url_takes_precedence_over_filename() {
        let config = DatabaseConfig {
            url: Some("sqlite:///var/lib/scans.db".to_string()),
            filename: Some("local.db".to_string()),
        };
        assert_eq!(config.sqlite_path(), "/var/lib/scans.db");

        let config = DatabaseConfig {
            url: None,
            filename: Some("local.db".to_string()),
        };
        assert_eq!(config.sqlite_path(), "local.db");
    }

    #[test]
    fn validate_rejects_zero_port() {
        let config: Config = serde_yaml::from_str("server:\n  port: 0\n").expect("parse");
        let err = config.validate().expect_err("port 0 must be rejected");
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn validate_rejects_blank_model_id() {
        let config: Config =
            serde_yaml::from_str("inference:\n  model_id: \"  \"\n").expect("parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_upstream_url() {
        let config: Config =
            serde_yaml::from_str("inference:\n  api_url: detect.roboflow.com\n").expect("parse");
        let err = config.validate().expect_err("relative URL must be rejected");
        assert!(err.to_string().contains("inference.api_url"));
    }

    #[test]
    fn environment_values_override_file_values() {
        let mut config: Config = serde_yaml::from_str(
            "database:\n  filename: file.db\ninference:\n  api_key: rf-file\nllm:\n  groq:\n    api_key: gsk_file\n",
        )
        .expect("parse");

        let env: HashMap<&str, &str> = [
            ("ROBOFLOW_API_KEY", "rf-env"),
            ("GROQ_API_KEY", "gsk_env"),
            ("GEMINI_API_KEY", "gemini-env"),
            ("DATABASE_URL", "sqlite:///srv/scans.db"),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        let key = |secret: &Option<SecretString>| {
            secret.as_ref().map(|s| s.expose_secret().to_string())
        };
        assert_eq!(key(&config.inference.api_key).as_deref(), Some("rf-env"));
        assert_eq!(key(&config.llm.groq.api_key).as_deref(), Some("gsk_env"));
        assert_eq!(key(&config.llm.gemini.api_key).as_deref(), Some("gemini-env"));
        assert_eq!(config.database.sqlite_path(), "/srv/scans.db");
    }

    #[test]
    fn unset_environment_keeps_file_values() {
        let mut config: Config =
            serde_yaml::from_str("inference:\n  api_key: rf-file\n").expect("parse");
        config.apply_overrides(|_| None);

        let key = config.inference.api_key.as_ref().expect("file key kept");
        assert_eq!(key.expose_secret(), "rf-file");
        assert!(config.llm.groq.api_key.is_none());
    }

    #[test]
    fn api_keys_are_redacted_in_debug_output() {
        let config: Config =
            serde_yaml::from_str("llm:\n  gemini:\n    api_key: super-secret\n").expect("parse");
        let rendered = format!("{:?}", config.llm.gemini);
        assert!(!rendered.contains("super-secret"));
    }
}
