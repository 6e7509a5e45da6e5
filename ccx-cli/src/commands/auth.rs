//! Session commands - login, register, logout, whoami, refresh

use anyhow::Result;
use colored::Colorize;
use dialoguer::Input;

use ccx_core::domain::RegisterRequest;
use ccx_core::services::RemoteLogout;
use ccx_core::Session;

use super::{get_context, read_new_secret, read_secret};
use crate::output;

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

fn session_json(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "email": session.email,
        "fullName": session.full_name,
        "userId": session.user_id,
        "role": session.role,
        "loggedInAt": session.created_at,
        "expiresAt": session.expires_at(),
    })
}

pub fn run_login(email: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let email = prompt_if_missing(email, "Email")?;
    let password = read_secret("Password")?;

    let session = ctx.auth_service.login(&email, &password)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session_json(&session))?);
        return Ok(());
    }

    output::success(&format!("Logged in as {}", session.display_name()));
    if session.is_admin() {
        println!("  Role: {}", "ADMIN".bold());
    }
    Ok(())
}

pub fn run_register(
    email: Option<String>,
    full_name: Option<String>,
    phone: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let email = prompt_if_missing(email, "Email")?;
    let full_name = prompt_if_missing(full_name, "Full name")?;
    let phone_number = prompt_if_missing(phone, "Phone number")?;
    let (password, confirm) = read_new_secret("Password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    ctx.auth_service.register(&RegisterRequest {
        email: email.clone(),
        password,
        full_name,
        phone_number,
    })?;

    if json {
        println!("{}", serde_json::json!({"registered": email.trim()}));
    } else {
        output::success("Account created");
        println!("  Log in with: ccx login --email {}", email.trim());
    }
    Ok(())
}

pub fn run_logout(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let outcome = ctx.auth_service.logout()?;

    if json {
        let remote = match &outcome.remote {
            RemoteLogout::Acknowledged => serde_json::json!("acknowledged"),
            RemoteLogout::Failed(e) => serde_json::json!({"failed": e}),
            RemoteLogout::Skipped => serde_json::json!("skipped"),
        };
        println!(
            "{}",
            serde_json::json!({"hadSession": outcome.had_session, "remote": remote})
        );
        return Ok(());
    }

    match outcome.remote {
        RemoteLogout::Acknowledged => output::success("Logged out"),
        RemoteLogout::Failed(e) => {
            output::success("Logged out locally");
            output::warning(&format!("Server logout failed: {}", e));
        }
        RemoteLogout::Skipped => output::info("No active session"),
    }
    Ok(())
}

pub fn run_whoami(remote: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;

    if remote {
        let profile = ctx.auth_service.profile()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            return Ok(());
        }
        let mut table = output::create_table();
        table.add_row(vec!["Name", profile.full_name.as_deref().unwrap_or("-")]);
        table.add_row(vec!["Email", profile.email.as_str()]);
        table.add_row(vec!["Phone", profile.phone_number.as_deref().unwrap_or("-")]);
        table.add_row(vec!["Role", profile.role.as_str()]);
        table.add_row(vec!["Active", if profile.is_active { "yes" } else { "no" }]);
        table.add_row(vec![
            "Last login".to_string(),
            output::format_date_time(profile.last_login),
        ]);
        println!("{}", table);
        return Ok(());
    }

    let Some(session) = ctx.auth_service.current()? else {
        if json {
            println!("{}", serde_json::json!({"loggedIn": false}));
        } else {
            println!("Not logged in. Run 'ccx login' first.");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&session_json(&session))?);
        return Ok(());
    }

    println!("{}", session.display_name().bold());
    println!("  Email: {}", session.email);
    println!("  Role: {}", session.role);
    println!("  Logged in: {}", session.created_at.format("%Y-%m-%d %H:%M UTC"));
    match session.expires_at() {
        Some(exp) if session.is_expired(chrono::Utc::now()) => {
            println!("  Expires: {}", format!("expired {}", exp.format("%Y-%m-%d %H:%M UTC")).red())
        }
        Some(exp) => println!("  Expires: {}", exp.format("%Y-%m-%d %H:%M UTC")),
        None => {}
    }
    Ok(())
}

pub fn run_refresh(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.auth_service.refresh()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session_json(&session))?);
    } else {
        output::success("Session refreshed");
        if let Some(exp) = session.expires_at() {
            println!("  Expires: {}", exp.format("%Y-%m-%d %H:%M UTC"));
        }
    }
    Ok(())
}
