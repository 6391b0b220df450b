use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;

use super::{BackendKind, Config, ConfigError, ModelConfig};
use crate::model;

#[inline]
pub async fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Docs Assistant Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Documentation Corpus").bold().yellow());
    configure_corpus(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Language Model").bold().yellow());
    eprintln!("Choose a local completion server (e.g. LM Studio) or a hosted inference API.");
    eprintln!();

    configure_model(&mut config.model)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match model::test_connection(&config.model).await {
        Ok(reply) => {
            eprintln!("{}", style("✓ Model connection successful!").green());
            eprintln!("  Reply: {}", style(reply).dim());
        }
        Err(e) => {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not get a reply from the model").yellow()
            );
            eprintln!("  {}", e);
            eprintln!("You can continue, but make sure the model server is running before chatting.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Corpus:").bold().yellow());
    eprintln!("  Source: {}", style(&config.corpus.source).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.corpus.embedding_dimension).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Model:").bold().yellow());
    eprintln!("  Backend: {}", style(config.model.backend).cyan());
    match config.model.backend {
        BackendKind::Local => match config.model.local_url() {
            Ok(url) => eprintln!("  Endpoint: {}", style(url).cyan()),
            Err(e) => eprintln!("  Endpoint: {} ({})", style("Invalid").red(), e),
        },
        BackendKind::Hosted => {
            eprintln!("  Endpoint: {}", style(&config.model.hosted_url).cyan());
            let key_state = if config.model.resolve_api_key().is_some() {
                style("set").green()
            } else {
                style("missing").red()
            };
            eprintln!("  API Key: {}", key_state);
        }
    }
    eprintln!("  Model: {}", style(&config.model.model).cyan());
    eprintln!("  Temperature: {}", style(config.model.temperature).cyan());
    eprintln!("  Max Tokens: {}", style(config.model.max_tokens).cyan());

    eprintln!();
    eprintln!("{}", style("Assistant:").bold().yellow());
    eprintln!("  Name: {}", style(&config.assistant.assistant_name).cyan());
    eprintln!("  Product: {}", style(&config.assistant.product_name).cyan());
    eprintln!(
        "  Preferred Language: {}",
        style(&config.assistant.preferred_language).cyan()
    );
    eprintln!("  Results Per Query: {}", style(config.assistant.top_k).cyan());
    eprintln!("  Production Mode: {}", style(config.assistant.production).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            }
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_corpus(config: &mut Config) -> Result<()> {
    let source: String = Input::new()
        .with_prompt("Corpus file path or URL")
        .default(config.corpus.source.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Corpus source cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.corpus.source = source.trim().to_string();
    Ok(())
}

fn configure_model(model: &mut ModelConfig) -> Result<()> {
    let backends = &[BackendKind::Local, BackendKind::Hosted];
    let labels = &["local (OpenAI-compatible completions)", "hosted (inference API)"];
    let default_index = backends
        .iter()
        .position(|&b| b == model.backend)
        .unwrap_or(0);

    let backend_index = Select::new()
        .with_prompt("Model backend")
        .default(default_index)
        .items(labels)
        .interact()?;
    model.backend = backends[backend_index];

    match model.backend {
        BackendKind::Local => configure_local_endpoint(model)?,
        BackendKind::Hosted => configure_hosted_endpoint(model)?,
    }

    let name: String = Input::new()
        .with_prompt("Model name")
        .default(model.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(model.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    let max_tokens: u32 = Input::new()
        .with_prompt("Maximum tokens per answer")
        .default(model.max_tokens)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Max tokens must be greater than 0")
            } else if *input > 32768 {
                Err("Max tokens must be 32768 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    model.set_model(name)?;
    model.set_temperature(temperature)?;
    model.set_max_tokens(max_tokens)?;

    Ok(())
}

fn configure_local_endpoint(model: &mut ModelConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == model.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Completion server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Completion server host")
        .default(model.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ModelConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..ModelConfig::default()
            };
            temp_config.local_url()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Completion server port")
        .default(model.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    model.set_protocol(protocol)?;
    model.set_host(host)?;
    model.set_port(port)?;

    Ok(())
}

fn configure_hosted_endpoint(model: &mut ModelConfig) -> Result<()> {
    let hosted_url: String = Input::new()
        .with_prompt("Inference API base URL")
        .default(model.hosted_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ModelConfig {
                hosted_url: input.clone(),
                ..ModelConfig::default()
            };
            temp_config.hosted_base_url()?;
            Ok(())
        })
        .interact_text()?;

    model.set_hosted_url(hosted_url)?;

    if model.resolve_api_key().is_none() {
        let api_key: String = Input::new()
            .with_prompt(format!(
                "API key (leave empty to use ${})",
                super::settings::API_KEY_ENV_VAR
            ))
            .allow_empty(true)
            .interact_text()?;
        let api_key = api_key.trim();
        model.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
    }

    Ok(())
}
