//! Config command - show and edit settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_ccx_dir;
use crate::output;
use ccx_core::config::{ApiUrlSource, Config};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the backend base URL
    SetUrl {
        /// e.g. https://api.example.com/api
        url: String,
    },
    /// Set the request timeout in seconds
    SetTimeout {
        secs: u64,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let ccx_dir = get_ccx_dir()?;
    let mut config = Config::load(&ccx_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "directory": ccx_dir.to_string_lossy(),
                        "apiUrl": config.api_url,
                        "apiUrlSource": config.api_url_source.as_str(),
                        "timeoutSecs": config.timeout_secs,
                        "pageSizes": config.page_sizes,
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!("  Directory: {}", ccx_dir.display());
            println!(
                "  API URL: {} {}",
                config.api_url,
                format!("({})", config.api_url_source.as_str()).dimmed()
            );
            println!("  Timeout: {} s", config.timeout_secs);
            println!(
                "  Page sizes: users {}, transactions {}, logs {}",
                config.page_sizes.users, config.page_sizes.transactions, config.page_sizes.logs
            );
        }
        ConfigCommands::SetUrl { url } => {
            let from_env = config.api_url_source == ApiUrlSource::Environment;
            config.set_api_url(&url)?;
            config.save(&ccx_dir)?;
            output::success(&format!("API URL set to {}", config.api_url));
            if from_env {
                output::warning("CCX_API_URL is set and still takes precedence");
            }
        }
        ConfigCommands::SetTimeout { secs } => {
            config.set_timeout(secs)?;
            config.save(&ccx_dir)?;
            output::success(&format!("Timeout set to {} s", secs));
        }
    }

    Ok(())
}
