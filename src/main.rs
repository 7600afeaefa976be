use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use translation_module::config::{self, Config};
use translation_module::i18n::{Lookup, Registry};
use translation_module::Translations;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root holding resources/lang (overrides TRANSLATION_PROJECT_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List locales and their language files as JSON
    Languages,
    /// List the language files of one locale
    Files { locale: String },
    /// List every key of a language file across all locales
    Keys { file: String },
    /// Print one translation value
    Get {
        key: String,
        file: String,
        locale: String,
    },
    /// Create a locale directory
    AddLocale { locale: String },
    /// Delete a locale directory and everything in it
    RemoveLocale { locale: String },
    /// Merge KEY=VALUE pairs into a language file
    Set {
        file: String,
        locale: String,
        /// Entries as KEY=VALUE
        #[arg(required = true, value_parser = parse_entry)]
        entries: Vec<(String, String)>,
    },
    /// Machine translate a piece of text
    Translate {
        text: String,
        /// Target locale code
        #[arg(long)]
        to: String,
    },
    /// Machine translate keys missing from one locale
    Fill {
        file: String,
        /// Source locale
        #[arg(long, default_value = "en")]
        from: String,
        /// Target locale
        #[arg(long)]
        to: String,
    },
    /// Print module information as JSON
    Info,
    /// Write the default config file into the project
    PublishConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_module=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(root) = cli.root {
        config.project_root = Some(root);
    }

    let load_registry = || -> Result<Registry> {
        let config = config
            .clone()
            .with_published_config(&config.published_config_path())?;
        Registry::from_config(&config).context("Failed to set up translation registry")
    };

    match cli.command {
        Commands::Languages => print_json(&load_registry()?.languages()?)?,
        Commands::Files { locale } => print_json(&load_registry()?.language_files(&locale)?)?,
        Commands::Keys { file } => print_json(&load_registry()?.language_file_keys(&file)?)?,
        Commands::Get { key, file, locale } => {
            let lookup = load_registry()?.get(&key, &file, &locale)?;
            if lookup == Lookup::FileNotFound {
                bail!("No language file {} for locale {}", file, locale);
            }
            match lookup.into_value() {
                Some(value) => println!("{}", value),
                None => bail!("Key `{}` not found in {} ({})", key, file, locale),
            }
        }
        Commands::AddLocale { locale } => load_registry()?.add_locale(&locale)?,
        Commands::RemoveLocale { locale } => load_registry()?.remove_locale(&locale)?,
        Commands::Set {
            file,
            locale,
            entries,
        } => {
            let updates: Translations = entries.into_iter().collect();
            load_registry()?.save_translation_file(&file, &locale, &updates)?;
        }
        Commands::Translate { text, to } => {
            println!("{}", load_registry()?.translate(&text, &to).await?)
        }
        Commands::Fill { file, from, to } => {
            let filled = load_registry()?
                .translate_missing(&file, &from, &to)
                .await?;
            info!("{} key(s) translated", filled);
        }
        Commands::Info => print_json(&load_registry()?.module_info()?)?,
        // Publishing must work before a config file exists
        Commands::PublishConfig { force } => {
            config::publish_default_config(&config.published_config_path(), force)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
