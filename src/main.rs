use log::info;
use std::time::Duration;

use stampede::{LoadConfig, Result};

mod app_config;
mod app_state;

use app_config::{Cli, Commands};
use app_state::StampedeApp;

#[tokio::main]
async fn main() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Run {
            duration_secs,
            seed,
        } => {
            let mut config = LoadConfig::load_from_file(&cli.config)?;
            if let Some(seed) = seed {
                config.seed = Some(seed);
            }
            info!("configuration loaded from {}", cli.config);

            let app = StampedeApp::new(config);
            app.start(duration_secs.map(Duration::from_secs)).await?;
        }

        Commands::CheckConfig => {
            let config = LoadConfig::load_from_file(&cli.config)?;
            println!("✅ {} is valid", cli.config);
            println!(
                "   target {}, {} ramp steps, pool of {} credentials",
                config.target_base_url,
                config.ramp_schedule.len(),
                config
                    .credentials
                    .users
                    .as_ref()
                    .map_or(config.credentials.pool_size, Vec::len)
            );
        }

        Commands::SampleConfig => {
            print!("{}", LoadConfig::sample_toml());
        }
    }

    Ok(())
}
