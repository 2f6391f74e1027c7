pub use self::parser::{
    Config, DatabaseConfig, GeminiConfig, GroqConfig, InferenceConfig, LoggingConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
