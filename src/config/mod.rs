// Configuration management module
// TOML settings for the corpus, the model backend and the assistant persona

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    AssistantConfig, BackendKind, Config, ConfigError, CorpusConfig, ModelConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
