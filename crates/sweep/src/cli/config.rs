use clap::Subcommand;
use console::style;
use std::path::PathBuf;
use sweep_lib::{Config, Result};

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the effective settings")]
    Show,

    #[command(about = "Write a default config file")]
    Init {
        #[arg(help = "Where to write it (defaults to the XDG config directory)")]
        path: Option<PathBuf>,
    },
}

pub fn handle_config_command(config: &Config, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Init { path } => init_config(path),
    }
}

fn show_config(config: &Config) -> Result<()> {
    match &config.config_path {
        Some(path) => println!("{} {}", style("# Loaded from").dim(), path.display()),
        None => println!("{}", style("# No config file found, showing defaults").dim()),
    }
    println!("{}", config.settings.to_toml()?);
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    Config::write_default(&path)?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    Ok(())
}
