mod cli;

use clap::Parser;
use cli::{Cli, Command};
use toolroute::platform::config::{ConfigurationSource, FileConfiguration};
use toolroute::replay::{self, ReplayOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            script,
            config,
            reject,
            keep_going,
        } => {
            let options = ReplayOptions {
                script,
                config,
                reject,
                keep_going,
            };
            match replay::execute(options).await {
                Ok(summary) => println!("{summary}"),
                Err(e) => {
                    tracing::error!(error = %e, "replay failed");
                    eprintln!("toolroute replay: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::CheckConfig { path } => {
            let source = FileConfiguration::new(path);
            if let Err(e) = source.load() {
                tracing::error!(error = %e, "configuration check failed");
                eprintln!("toolroute check-config: {e}");
                std::process::exit(1);
            }
            match serde_json::to_string_pretty(&source.current()) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("toolroute check-config: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
