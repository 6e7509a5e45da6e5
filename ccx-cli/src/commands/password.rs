//! Password commands - recovery, reset, change and token checks

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_context, read_new_secret, read_secret};
use crate::output;

#[derive(Subcommand)]
pub enum PasswordCommands {
    /// Request a password reset e-mail
    Forgot {
        /// Account e-mail
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a new password with the token from the reset e-mail
    Reset {
        /// Reset token
        token: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the password of the logged-in account
    Change {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a token is accepted by the server
    Verify {
        /// Token to check (defaults to the stored session token)
        token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_message(message: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({"message": message}));
    } else {
        output::success(message);
    }
}

pub fn run(command: PasswordCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        PasswordCommands::Forgot { email, json } => {
            let message = ctx.auth_service.request_password_reset(&email)?;
            print_message(&message, json);
        }
        PasswordCommands::Reset { token, json } => {
            let (new_password, confirm) = read_new_secret("New password")?;
            let message = ctx
                .auth_service
                .reset_password(&token, &new_password, &confirm)?;
            print_message(&message, json);
        }
        PasswordCommands::Change { json } => {
            let old_password = read_secret("Current password")?;
            let (new_password, confirm) = read_new_secret("New password")?;
            if new_password != confirm {
                anyhow::bail!("Passwords do not match");
            }
            let message = ctx
                .auth_service
                .change_password(&old_password, &new_password)?;
            print_message(&message, json);
        }
        PasswordCommands::Verify { token, json } => {
            let token = match token {
                Some(t) => t,
                None => ctx.auth_service.require_session()?.access_token,
            };
            let verification = ctx.auth_service.verify_token(&token)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&verification)?);
            } else if verification.valid {
                println!("{}", "Token is valid".green());
                if let Some(secs) = verification.expires_in {
                    println!("  Expires in: {} s", secs);
                }
            } else {
                println!("{}", "Token is not valid".red());
                if let Some(message) = verification.message {
                    println!("  {}", message);
                }
            }
        }
    }

    Ok(())
}
