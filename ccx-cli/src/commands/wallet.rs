//! Wallet commands - convert, deposit, history, balance, export

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use ccx_core::domain::validation::parse_amount;
use ccx_core::{ConversionDirection, Currency};

use super::{get_context, PageArgs, TransactionFilterArgs};
use crate::output;

pub fn run_convert(direction: &str, amount: &str, json: bool) -> Result<()> {
    let direction = ConversionDirection::parse(direction).ok_or_else(|| {
        anyhow!("Unknown direction '{}': use mad-to-rwf or rwf-to-mad", direction)
    })?;
    let amount = parse_amount(amount)?;

    let ctx = get_context()?;
    let tx = ctx.wallet_service.convert(direction, amount)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tx)?);
        return Ok(());
    }

    output::success("Conversion completed");
    let source = direction.source().as_str();
    let target = direction.target().as_str();
    println!("  Sent: {}", output::format_amount(tx.amount, Some(source)));
    println!(
        "  Received: {}",
        output::format_optional_amount(tx.final_amount, Some(target)).bold()
    );
    if let Some(rate) = tx.exchange_rate {
        println!("  Rate: 1 {} = {} {}", source, rate, target);
    }
    if !tx.reference().is_empty() {
        println!("  Reference: {}", tx.reference());
    }
    println!("  Status: {}", output::format_status(&tx.status));
    Ok(())
}

pub fn run_deposit(currency: &str, amount: &str, json: bool) -> Result<()> {
    let currency = Currency::parse(currency)
        .ok_or_else(|| anyhow!("Unknown currency '{}': use MAD or RWF", currency))?;
    let amount = parse_amount(amount)?;

    let ctx = get_context()?;
    let message = ctx.wallet_service.deposit(currency, amount)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"message": message, "currency": currency.as_str()})
        );
    } else {
        output::success(&message);
        println!(
            "  Deposited: {}",
            output::format_amount(amount, Some(currency.as_str()))
        );
    }
    Ok(())
}

pub fn run_history(filter: TransactionFilterArgs, paging: PageArgs, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let request = paging.request(ctx.config.page_sizes.transactions);
    let page = ctx
        .wallet_service
        .history_page(&filter.to_filter()?, filter.order(), request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.total_items == 0 {
        println!("No transactions found.");
        return Ok(());
    }
    if page.is_empty() {
        println!("No transactions on page {} ({} pages).", page.page, page.total_pages);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Reference", "Type", "Amount", "Received", "Status"]);
    for tx in &page.items {
        table.add_row(vec![
            output::format_date_time(tx.created_at),
            tx.reference().to_string(),
            tx.tx_type.to_string(),
            output::format_amount(tx.amount, tx.from_currency.as_deref()),
            output::format_optional_amount(tx.final_amount, tx.to_currency.as_deref()),
            output::format_status(&tx.status).to_string(),
        ]);
    }
    println!("{}", table);
    output::print_page_footer(&page, "transactions");
    Ok(())
}

pub fn run_balance(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let summary = ctx.wallet_service.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Wallet".bold());
    let mut table = output::create_table();
    for currency in [Currency::MAD, Currency::RWF] {
        table.add_row(vec![
            currency.label().to_string(),
            output::format_amount(summary.balance(currency), Some(currency.as_str())),
        ]);
    }
    table.add_row(vec![
        "Conversions".to_string(),
        summary.total_conversions.to_string(),
    ]);
    table.add_row(vec!["Deposits".to_string(), summary.total_deposits.to_string()]);
    table.add_row(vec![
        "Last conversion".to_string(),
        output::format_date_time(summary.last_conversion_at),
    ]);
    table.add_row(vec![
        "Last deposit".to_string(),
        output::format_date_time(summary.last_deposit_at),
    ]);
    println!("{}", table);
    Ok(())
}

pub fn run_export(output_path: PathBuf, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let spinner = if json {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Downloading export...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = ctx.wallet_service.export(&output_path);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let exported = result?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": exported.path.to_string_lossy(),
                "sizeBytes": exported.bytes,
            })
        );
    } else {
        output::success(&format!("Exported to {}", exported.path.display()));
        println!("  Size: {}", output::format_size(exported.bytes as u64));
    }
    Ok(())
}
