//! ccx - MAD/RWF currency exchange in your terminal

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{admin, auth, config, logs, password, wallet, PageArgs, TransactionFilterArgs};

/// ccx - MAD/RWF currency exchange in your terminal
#[derive(Parser)]
#[command(name = "ccx", version, about, long_about = None)]
struct Cli {
    /// Increase diagnostic output (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account e-mail
        #[arg(long, env = "CCX_EMAIL")]
        email: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new account
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the backend instead of the stored session
        #[arg(long)]
        remote: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exchange the refresh token for a new session
    Refresh {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Password recovery and change
    Password {
        #[command(subcommand)]
        command: password::PasswordCommands,
    },

    /// Convert between MAD and RWF
    Convert {
        /// mad-to-rwf or rwf-to-mad
        direction: String,
        /// Amount in the source currency
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit funds into the wallet
    Deposit {
        /// MAD or RWF
        currency: String,
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List your transactions
    History {
        #[command(flatten)]
        filter: TransactionFilterArgs,
        #[command(flatten)]
        paging: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show wallet balances and activity
    Balance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download your transactions as a spreadsheet
    Export {
        /// Target directory or file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Administration (requires an ADMIN session)
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// View the local activity log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change client settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout { .. } => "logout",
            Commands::Whoami { .. } => "whoami",
            Commands::Refresh { .. } => "refresh",
            Commands::Password { .. } => "password",
            Commands::Convert { .. } => "convert",
            Commands::Deposit { .. } => "deposit",
            Commands::History { .. } => "history",
            Commands::Balance { .. } => "balance",
            Commands::Export { .. } => "export",
            Commands::Admin { .. } => "admin",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "ccx_core=debug,ccx=debug",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let name = cli.command.name();
    let started = Instant::now();

    let result = run(cli);

    // Reading the activity log is not itself recorded
    if name != "logs" {
        commands::record_outcome(name, started, &result);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, json } => auth::run_login(email, json),
        Commands::Register { email, full_name, phone, json } => {
            auth::run_register(email, full_name, phone, json)
        }
        Commands::Logout { json } => auth::run_logout(json),
        Commands::Whoami { remote, json } => auth::run_whoami(remote, json),
        Commands::Refresh { json } => auth::run_refresh(json),
        Commands::Password { command } => password::run(command),
        Commands::Convert { direction, amount, json } => wallet::run_convert(&direction, &amount, json),
        Commands::Deposit { currency, amount, json } => wallet::run_deposit(&currency, &amount, json),
        Commands::History { filter, paging, json } => wallet::run_history(filter, paging, json),
        Commands::Balance { json } => wallet::run_balance(json),
        Commands::Export { output, json } => wallet::run_export(output, json),
        Commands::Admin { command } => admin::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_flags() {
        let cli = Cli::try_parse_from([
            "ccx", "history", "--type", "deposit-mad", "--page", "2", "--per-page", "5", "--asc",
        ])
        .unwrap();
        match cli.command {
            Commands::History { filter, paging, json } => {
                assert_eq!(filter.tx_type.as_deref(), Some("deposit-mad"));
                assert!(filter.asc);
                assert_eq!(paging.page, 2);
                assert_eq!(paging.per_page, Some(5));
                assert!(!json);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_refresh_help_describes_token_exchange() {
        let cli = Cli::command();
        let refresh = cli.find_subcommand("refresh").unwrap();
        let about = refresh.get_about().unwrap().to_string();
        assert!(about.contains("refresh token"));
        assert!(about.contains("new session"));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["ccx", "balance", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.name(), "balance");
    }
}
