//! # djinn-news
//!
//! Serves a `news` content type with the djinn content views.
//!
//! ```bash
//! djinn-news --settings news.toml --users users.json serve
//! djinn-news --settings news.toml types
//! djinn-news --settings news.toml check
//! ```
//!
//! Requests are authenticated by the `X-Remote-User` header, which an
//! authenticating proxy is expected to set.

mod news;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use djinn_auth::UserDirectory;
use djinn_contenttypes::{CTRegistry, ContentTypesApp};
use djinn_core::checks::CheckLevel;
use djinn_core::logging::setup_logging;
use djinn_core::{settings_loader, Settings};

#[derive(Debug, Parser)]
#[command(name = "djinn-news", version, about = "News content served with djinn")]
struct Cli {
    /// Settings file (TOML, or JSON by extension).
    #[arg(long, short)]
    settings: Option<PathBuf>,

    /// Users and groups as JSON.
    #[arg(long)]
    users: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Starts the server.
    Serve {
        /// Address to bind, overriding the settings.
        #[arg(long)]
        addr: Option<String>,
    },
    /// Lists the registered content types.
    Types {
        /// Content types to leave out.
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },
    /// Runs the system checks.
    Check,
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => settings_loader::from_file_with_env(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(settings_loader::from_env()),
    }
}

fn load_users(path: Option<&PathBuf>) -> anyhow::Result<UserDirectory> {
    let Some(path) = path else {
        tracing::warn!("no users file given, every request is anonymous");
        return Ok(UserDirectory::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading users from {}", path.display()))?;
    Ok(UserDirectory::from_json_str(&json)?)
}

fn registry(settings: &Settings) -> CTRegistry {
    let registry = CTRegistry::from_settings(settings);
    if registry.get(news::CT).is_none() {
        registry.register(news::CT, news::default_entry());
    }
    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_ref())?;
    setup_logging(&settings);

    let registry = registry(&settings);
    match cli.command {
        Command::Types { exclude } => {
            let exclude: Vec<&str> = exclude.iter().map(String::as_str).collect();
            for name in registry.list_types(&exclude) {
                let label = registry
                    .get(&name)
                    .and_then(|entry| entry.label().map(String::from))
                    .unwrap_or_default();
                let model = registry.model(&name).unwrap_or_default();
                println!("{name}\t{model}\t{label}");
            }
            Ok(())
        }
        Command::Check => {
            let app = ContentTypesApp::new(settings)?.registry(Arc::new(registry));
            let messages = app.check();
            for message in &messages {
                let id = message.id.as_deref().unwrap_or("-");
                println!("{} {id}: {}", message.level, message.msg);
                if let Some(hint) = &message.hint {
                    println!("\tHINT: {hint}");
                }
            }
            let serious = messages.iter().filter(|m| m.level >= CheckLevel::Error).count();
            anyhow::ensure!(serious == 0, "{serious} serious problem(s) found");
            println!("System check identified {} issue(s).", messages.len());
            Ok(())
        }
        Command::Serve { addr } => {
            let users = load_users(cli.users.as_ref())?;
            tracing::info!(users = users.user_count().await, "loaded users");
            let addr = addr.unwrap_or_else(|| settings.bind_address.clone());
            ContentTypesApp::new(settings)?
                .registry(Arc::new(registry))
                .auth(Arc::new(users))
                .mount(news::options())?
                .serve(&addr)
                .await?;
            Ok(())
        }
    }
}
