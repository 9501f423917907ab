//! # amor
//!
//! Command-line view and dashboard for the couple page.
//!
//! ```text
//! amor show [--watch]          public page
//! amor dashboard               current values of every field
//! amor set --playlist <url>    merge-write any subset of fields
//! amor names <a> <b>           rename the couple
//! amor toggle-theme            switch between light and dark
//! ```

use std::path::PathBuf;

use amor_client::anniversary::spawn_ticker;
use amor_client::config::ClientConfig;
use amor_client::view::{DashboardView, PublicPage};
use amor_client::{
    events, ClientCache, ClientEvent, FileCache, HttpPreferencesApi, MemoryCache, PreferencesApi,
    PreferencesController, Surface,
};
use amor_shared::{NameDisplayPreference, PartialPreferences, Theme};
use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the preferences server (overrides AMOR_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Cache file for the last known theme (overrides AMOR_CACHE_PATH)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the public page
    Show {
        /// Keep running and print the anniversary text every minute
        #[arg(long)]
        watch: bool,
    },
    /// Show every editable field
    Dashboard,
    /// Save one or more fields
    Set(SetArgs),
    /// Save the couple's names and how the heading shows them
    Names {
        first: String,
        second: String,
        #[arg(long, default_value = "both")]
        display: NameDisplayPreference,
    },
    /// Switch between light and dark
    ToggleTheme,
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Anniversary date (YYYY-MM-DD or an ISO-8601 timestamp)
    #[arg(long, conflicts_with = "clear_anniversary")]
    anniversary: Option<String>,

    #[arg(long)]
    clear_anniversary: bool,

    /// Spotify or YouTube playlist link
    #[arg(long, conflicts_with = "clear_playlist")]
    playlist: Option<String>,

    #[arg(long)]
    clear_playlist: bool,

    /// Defining phrase; an empty string clears it
    #[arg(long)]
    phrase: Option<String>,

    /// both, user1 or user2
    #[arg(long)]
    display: Option<NameDisplayPreference>,

    /// light or dark
    #[arg(long)]
    theme: Option<Theme>,
}

impl SetArgs {
    fn into_partial(self) -> PartialPreferences {
        let mut partial = PartialPreferences::default();
        if self.clear_anniversary {
            partial = partial.anniversary_date(None);
        } else if let Some(date) = self.anniversary {
            partial = partial.anniversary_date(Some(date));
        }
        if self.clear_playlist {
            partial = partial.playlist_url(None);
        } else if let Some(url) = self.playlist {
            partial = partial.playlist_url(Some(url));
        }
        if let Some(phrase) = self.phrase {
            partial = partial.defining_phrase(phrase);
        }
        if let Some(display) = self.display {
            partial = partial.name_display_preference(display);
        }
        if let Some(theme) = self.theme {
            partial = partial.theme(theme);
        }
        partial
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays the rendered page.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,amor_client=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(cache) = cli.cache {
        config.cache_path = Some(cache);
    }
    debug!(?config, "Loaded configuration");

    let api = HttpPreferencesApi::new(&config.server_url, config.request_timeout)
        .context("Failed to build HTTP client")?;
    let cache: Box<dyn ClientCache> = match &config.cache_path {
        Some(path) => Box::new(FileCache::new(path)),
        None => {
            warn!("No data directory available, theme cache kept in memory");
            Box::new(MemoryCache::new())
        }
    };

    let surface = match cli.command {
        Command::Show { .. } => Surface::Public,
        _ => Surface::Dashboard,
    };

    let (tx, mut rx) = events::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ClientEvent::ThemeApplied(theme) => debug!(%theme, "Theme applied"),
                ClientEvent::Notice(notice) => {
                    eprintln!("[{}] {}: {}", notice.severity, notice.title, notice.description)
                }
            }
        }
    });

    let controller = PreferencesController::new(api, cache, surface, tx);
    controller.initialize().await?;

    let outcome = run(&controller, cli.command).await;

    // Closing the channel lets the printer flush the remaining notices.
    drop(controller);
    printer.await?;
    outcome
}

async fn run<A, C>(controller: &PreferencesController<A, C>, command: Command) -> Result<()>
where
    A: PreferencesApi,
    C: ClientCache,
{
    let snapshot = || {
        controller
            .preferences()
            .context("Preferences missing after initialization")
    };

    match command {
        Command::Show { watch } => {
            let preferences = snapshot()?;
            println!("{}", PublicPage::new(&preferences, Local::now().naive_local()));

            if watch {
                let mut ticker = spawn_ticker(preferences.anniversary_date.clone());
                ticker.borrow_and_update();
                loop {
                    tokio::select! {
                        changed = ticker.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            println!("{}", *ticker.borrow_and_update());
                        }
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
            }
        }
        Command::Dashboard => {
            println!("{}", DashboardView::new(snapshot()?, controller.phase()));
        }
        Command::Set(args) => {
            let partial = args.into_partial();
            if partial.is_empty() {
                bail!("Nothing to save; pass at least one field (see `amor set --help`)");
            }
            let saved = controller.save(partial).await?;
            println!("{}", DashboardView::new(saved, controller.phase()));
        }
        Command::Names {
            first,
            second,
            display,
        } => {
            let saved = controller.save_names(&first, &second, display).await?;
            println!("{}", DashboardView::new(saved, controller.phase()));
        }
        Command::ToggleTheme => {
            let saved = controller.toggle_theme().await?;
            println!("Tema: {}", saved.theme);
        }
    }

    Ok(())
}
