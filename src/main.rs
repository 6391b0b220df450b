use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docs_assistant::commands::{ask, chat, ping, search};
use docs_assistant::config::{Config, get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-assistant")]
#[command(about = "A retrieval-augmented assistant that answers questions from a documentation corpus")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and relative corpus paths
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the corpus and model backend
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,
        /// Preferred language for code examples, e.g. "python" or "rust"
        #[arg(long)]
        language: Option<String>,
    },
    /// Start an interactive conversation
    Chat {
        /// Preferred language for code examples
        #[arg(long)]
        language: Option<String>,
    },
    /// Print the documentation context retrieved for a query without calling the model
    Search {
        /// Text to search for
        query: String,
        /// Maximum number of documents to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Check that the configured model backend responds
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().context("Could not determine config directory")?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir).await?;
            }
        }
        Commands::Ask { question, language } => {
            ask(&Config::load(&config_dir)?, &question, language).await?;
        }
        Commands::Chat { language } => {
            chat(&Config::load(&config_dir)?, language).await?;
        }
        Commands::Search { query, limit } => {
            search(&Config::load(&config_dir)?, &query, limit).await?;
        }
        Commands::Ping => {
            ping(&Config::load(&config_dir)?).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["docs-assistant", "ask", "How do I authenticate?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question, language } = parsed.command {
                assert_eq!(question, "How do I authenticate?");
                assert_eq!(language, None);
            } else {
                panic!("expected ask command");
            }
        }
    }

    #[test]
    fn ask_command_with_language() {
        let cli = Cli::try_parse_from([
            "docs-assistant",
            "ask",
            "List orders",
            "--language",
            "rust",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { language, .. } = parsed.command {
                assert_eq!(language, Some("rust".to_string()));
            }
        }
    }

    #[test]
    fn search_command_with_limit() {
        let cli = Cli::try_parse_from(["docs-assistant", "search", "webhooks", "--limit", "3"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search { query, limit } = parsed.command {
                assert_eq!(query, "webhooks");
                assert_eq!(limit, Some(3));
            }
        }
    }

    #[test]
    fn global_config_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["docs-assistant", "ping", "--config-dir", "/tmp/assistant"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.config_dir, Some(PathBuf::from("/tmp/assistant")));
            assert!(matches!(parsed.command, Commands::Ping));
        }
    }

    #[test]
    fn chat_command() {
        let cli = Cli::try_parse_from(["docs-assistant", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Chat { language: None }));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["docs-assistant", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn ask_requires_question() {
        let cli = Cli::try_parse_from(["docs-assistant", "ask"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["docs-assistant", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["docs-assistant", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
