// SPDX-License-Identifier: MPL-2.0

//! backdrop-ctl - CLI tool for backdrop preferences
//!
//! Reads and changes the persisted theme, fetches the wallpaper list and looks
//! up translations from the command line.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use backdrop::{
    Config, FetchOutcome, PreferenceStore, Theme, build_localization, theme::RootAttributes,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

/// CLI tool for backdrop preferences
#[derive(Parser)]
#[command(name = "backdrop-ctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Fetch the wallpaper list and print it
    Fetch,

    /// Fetch wallpapers and rotate through them
    Rotate {
        /// Rotation interval in milliseconds. Defaults to the configured value
        #[arg(short, long)]
        interval_ms: Option<u64>,
        /// Number of rotations to show before exiting
        #[arg(short, long, default_value = "3")]
        ticks: usize,
    },

    /// Look up a translation key
    Translate {
        /// Message identifier, e.g. theme-toggle
        key: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell type: bash, zsh, fish, elvish, powershell
        shell: String,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Get,
    /// Switch between dark and light
    Toggle,
    /// Set the theme explicitly
    Set {
        /// dark or light
        value: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Theme { action } => cmd_theme(&config, action),
        Commands::Fetch => cmd_fetch(&config).await,
        Commands::Rotate { interval_ms, ticks } => cmd_rotate(&config, interval_ms, ticks).await,
        Commands::Translate { key } => cmd_translate(&key),
        Commands::Completions { shell } => cmd_completions(&shell),
    }
}

fn open_store(config: &Config) -> Result<PreferenceStore, Box<dyn std::error::Error>> {
    Ok(PreferenceStore::from_config(
        config,
        Arc::new(RootAttributes::new()),
    )?)
}

fn parse_theme(value: &str) -> Result<Theme, Box<dyn std::error::Error>> {
    Ok(value.to_lowercase().parse::<Theme>()?)
}

fn cmd_theme(config: &Config, action: ThemeAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    let theme = match action {
        ThemeAction::Get => store.theme(),
        ThemeAction::Toggle => store.toggle_theme(),
        ThemeAction::Set { value } => {
            let theme = parse_theme(&value)?;
            store.set_theme(theme);
            theme
        }
    };

    println!("{theme}");
    Ok(())
}

async fn cmd_fetch(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    match store.fetch_wallpapers().await {
        FetchOutcome::Updated { count } => {
            println!("{count} wallpapers from {}", config.wallpaper_url());
            for (idx, url) in store.wallpapers().iter().enumerate() {
                println!("  [{idx}] {url}");
            }
            Ok(())
        }
        FetchOutcome::Empty => Err(format!("{} returned no wallpapers", config.wallpaper_url()).into()),
        FetchOutcome::Failed => {
            Err(format!("failed to fetch wallpapers from {}", config.wallpaper_url()).into())
        }
    }
}

async fn cmd_rotate(
    config: &Config,
    interval_ms: Option<u64>,
    ticks: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.rotation_interval());

    if !matches!(store.fetch_wallpapers().await, FetchOutcome::Updated { .. }) {
        return Err(format!("no wallpapers available from {}", config.wallpaper_url()).into());
    }

    let mut changes = store.subscribe();
    println!("{}", store.current_wallpaper());

    if store.wallpapers().len() < 2 {
        println!("only one wallpaper, nothing to rotate");
        return Ok(());
    }

    store.start_rotation(interval)?;

    for _ in 0..ticks {
        changes.changed().await?;
        println!("{}", changes.borrow_and_update().current_wallpaper);
    }

    store.stop_rotation();
    Ok(())
}

fn cmd_translate(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let localization = build_localization()?;

    if !localization.has(key) {
        return Err(format!("no translation for '{key}'").into());
    }

    println!("{}", localization.t(key));
    Ok(())
}

fn cmd_completions(shell: &str) -> Result<(), Box<dyn std::error::Error>> {
    let shell = match shell.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => {
            return Err(format!(
                "Unsupported shell: {shell}. Supported: bash, zsh, fish, elvish, powershell"
            )
            .into());
        }
    };

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "backdrop-ctl", &mut io::stdout());
    Ok(())
}
