mod cli;

use clap::Parser;
use sweep_lib::Config;

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = Config::new(cli.config)?;
    let cancel = cli::spawn_interrupt_handler();

    match cli.command {
        cli::Commands::Scan { roots, json, output } => {
            cli::scan::handle_scan_command(&config, roots, json, output, cli.quiet, cancel).await?
        }

        cli::Commands::Clean(args) => {
            cli::clean::handle_clean_command(&config, args, cli.quiet, cancel).await?
        }

        cli::Commands::Config { action } => cli::config::handle_config_command(&config, action)?,
    }

    Ok(())
}
