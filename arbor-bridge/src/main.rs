// SPDX-License-Identifier: LGPL-3.0-only
use anyhow::{bail, Context, Result};
use arbor_bridge::{serve, Bridge};
use arbor_services::filesystem::{filter_by_name, sort_entries, DirectoryEntry, TypeFilter};
use arbor_services::navigation::{NavigationError, NavigationEvent, NavigationSession, SessionOptions};
use arbor_services::roots::enumerate_roots;
use arbor_services::settings::{Config, SettingsRegistry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Parser)]
#[command(name = "arbor-host", version, about = "Filesystem navigation host for the arbor explorer")]
struct Cli {
    /// Read settings from this file instead of the standard locations
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer JSON-lines IPC requests on stdin/stdout
    Serve,
    /// Print the root locations of this host
    Roots,
    /// List a directory (home when omitted)
    Ls {
        path: Option<PathBuf>,
        /// Directories first, then by name
        #[arg(long)]
        sort: bool,
        /// Only entries whose name contains this text
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
        /// Only files of this type: documents, images, videos or audio
        #[arg(long = "type", value_name = "TYPE")]
        type_filter: Option<TypeFilter>,
    },
    /// Print the navigation tree down to PATH
    Tree {
        path: Option<PathBuf>,
        /// Levels to expand below PATH (or below the roots)
        #[arg(long, default_value_t = 1)]
        depth: usize,
        /// Keep running and reprint the tree when watched directories change
        #[arg(long)]
        follow: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    let level = config.general.log_level.as_deref().unwrap_or(
        if config.general.debug.unwrap_or(false) {
            "debug"
        } else {
            "warn"
        },
    );
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let bridge = Bridge::from_config(&config);
    match cli.command {
        Command::Serve => {
            log::info!("serving IPC on stdio");
            serve(Arc::new(bridge), tokio::io::stdin(), tokio::io::stdout())
                .await
                .context("IPC loop failed")?;
        },
        Command::Roots => {
            let listing = enumerate_roots(bridge.roots()).await;
            if let Some(error) = listing.error {
                bail!("cannot enumerate roots: {}", error);
            }
            for root in listing.directories {
                println!("{}", root.display());
            }
        },
        Command::Ls {
            path,
            sort,
            filter,
            type_filter,
        } => {
            let path = path.or_else(|| config.explorer.start_path.clone());
            let mut entries = bridge
                .accessor()
                .list(path.as_deref())
                .await
                .with_context(|| format!("cannot list {}", display_or_home(path.as_deref())))?;
            if sort {
                sort_entries(&mut entries);
            }
            let shown = filter_by_name(&entries, filter.as_deref().unwrap_or(""))
                .into_iter()
                .filter(|e| type_filter.map_or(true, |t| t.matches(e)));
            for entry in shown {
                print_entry(entry);
            }
        },
        Command::Tree {
            path,
            depth,
            follow,
        } => print_tree(&bridge, &config, path, depth, follow).await?,
    }
    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut registry = SettingsRegistry::with_defaults();
            for result in registry.load_from_paths_async(vec![path.to_path_buf()]).await {
                result?;
            }
            Ok(registry.get().clone())
        },
        None => Ok(SettingsRegistry::new().await?.get().clone()),
    }
}

fn print_entry(entry: &DirectoryEntry) {
    let size = if entry.is_directory {
        "-".to_string()
    } else {
        entry.display_size()
    };
    let suffix = if entry.is_directory { "/" } else { "" };
    println!(
        "{:>10}  {}  {}{}",
        size,
        entry.modified_at.format("%Y-%m-%d %H:%M"),
        entry.name,
        suffix
    );
}

fn display_or_home(path: Option<&Path>) -> String {
    path.map_or_else(|| "home directory".to_string(), |p| p.display().to_string())
}

async fn print_tree(
    bridge: &Bridge,
    config: &Config,
    path: Option<PathBuf>,
    depth: usize,
    follow: bool,
) -> Result<()> {
    let mut options = SessionOptions::from_settings(&config.explorer);
    if follow && !options.watch {
        log::warn!("watching is disabled in the settings, printing once");
    }
    options.watch &= follow;
    let session = Arc::new(NavigationSession::new(bridge.accessor().clone(), options));
    let roots = session.initialize(bridge.roots()).await;
    if let Some(error) = roots.error {
        bail!("cannot enumerate roots: {}", error);
    }

    let mut frontier = match path {
        Some(path) => {
            session.open(Some(&path)).await?;
            session.reveal().await?;
            session.current_path().into_iter().collect()
        },
        None => session.roots(),
    };
    for _ in 0..depth {
        let mut next = Vec::new();
        for dir in frontier {
            match session.expand(&dir).await {
                Ok(()) => {},
                Err(NavigationError::UnknownNode(p)) => {
                    log::warn!("{:?} is not reachable from the roots", p);
                    continue;
                },
                Err(e) => return Err(e.into()),
            }
            if let Some(node) = session.node(&dir) {
                next.extend(node.children);
            }
        }
        frontier = next;
    }

    print_rows(&session);
    let mut events = session.subscribe();
    let Some(watcher) = session.spawn_watcher() else {
        return Ok(());
    };

    loop {
        match events.recv().await {
            Ok(NavigationEvent::DirectoryLoaded { path, .. }) | Ok(NavigationEvent::LoadFailed { path, .. }) => {
                println!("-- {} changed", path.display());
                print_rows(&session);
            },
            Ok(NavigationEvent::ListingReplaced { .. }) => {},
            Err(RecvError::Lagged(skipped)) => log::debug!("skipped {} tree updates", skipped),
            Err(RecvError::Closed) => break,
        }
    }
    watcher.abort();
    Ok(())
}

fn print_rows(session: &NavigationSession) {
    for (level, node) in session.visible_rows() {
        let marker = if node.expanded { '-' } else { '+' };
        println!("{}{} {}", "  ".repeat(level), marker, node.entry.name);
    }
}
