pub mod clean;
pub mod config;
pub mod scan;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use sweep_lib::progress::{progress_channel, ProgressEvent};
use sweep_lib::util::create_progress_bar;
use sweep_lib::{Config, Result, ScanReport, Scanner, SweepError};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "sweep")]
#[command(about = "Find clutter in your folders and clean it up with undo", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'q', global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Scan folders and report categories, duplicates and suggestions")]
    Scan {
        #[command(flatten)]
        roots: RootArgs,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,

        #[arg(long, short = 'o', help = "Write the JSON report to a file")]
        output: Option<PathBuf>,
    },

    #[command(about = "Scan, pick suggested actions and apply them")]
    Clean(clean::CleanArgs),

    #[command(about = "Show or create the config file")]
    Config {
        #[command(subcommand)]
        action: config::ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RootArgs {
    #[arg(help = "Folders to scan")]
    pub dirs: Vec<PathBuf>,

    #[arg(long, help = "Include ~/Desktop")]
    pub desktop: bool,

    #[arg(long, help = "Include ~/Downloads")]
    pub downloads: bool,

    #[arg(long, help = "Include ~/Documents")]
    pub documents: bool,
}

impl RootArgs {
    /// Explicit folders plus the requested home folders. With nothing given,
    /// falls back to Desktop, Downloads and Documents.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let mut roots = self.dirs.clone();
        let none_given = roots.is_empty() && !self.desktop && !self.downloads && !self.documents;

        let home = std::env::var_os("HOME").map(PathBuf::from);
        let mut home_folder = |name: &str| -> Result<()> {
            let home = home
                .as_ref()
                .ok_or_else(|| SweepError::Config("HOME is not set".to_string()))?;
            roots.push(home.join(name));
            Ok(())
        };

        if self.desktop || none_given {
            home_folder("Desktop")?;
        }
        if self.downloads || none_given {
            home_folder("Downloads")?;
        }
        if self.documents || none_given {
            home_folder("Documents")?;
        }

        Ok(roots)
    }
}

/// Runs a scan with a progress bar fed from scanner events.
pub async fn run_scan(
    config: &Config,
    roots: &[PathBuf],
    show_progress: bool,
    cancel: CancellationToken,
) -> Result<ScanReport> {
    let (tx, mut rx) = progress_channel();
    let scanner = Scanner::from_settings(&config.settings)?
        .with_progress(tx)
        .with_cancellation(cancel);

    let pb = show_progress.then(|| create_progress_bar(100, "Scanning..."));
    let render = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(pb) = &pb else { continue };
            match event {
                ProgressEvent::Scanning { location, fraction } => {
                    pb.set_message(format!("Scanned {}", location));
                    pb.set_position((fraction * 50.0) as u64);
                }
                ProgressEvent::Hashing { done, total } => {
                    pb.set_message("Looking for duplicates...");
                    pb.set_position(50 + (done * 50 / total.max(1)) as u64);
                }
                _ => {}
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    });

    let report = scanner.scan(roots).await;
    drop(scanner);
    render.await?;
    report
}

pub fn spawn_interrupt_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current step");
            child.cancel();
        }
    });
    token
}
