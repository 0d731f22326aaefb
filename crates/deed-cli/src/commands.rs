use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use deed_ledger::{Deadline, Ledger, LedgerConfig, VerificationResult};
use deed_server::{DeedServer, ServerConfig};
use deed_store::{FileRecordStore, JournalConfig};
use deed_types::{ChainKey, LedgerRecord, RecordFields};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Append(args) => cmd_append(&cli, args).await,
        Command::Verify(args) => cmd_verify(&cli, args).await,
        Command::History(args) => cmd_history(&cli, args).await,
        Command::Serve(args) => cmd_serve(&cli, args).await,
    }
}

fn open_ledger(path: &Path) -> anyhow::Result<Ledger> {
    let store = FileRecordStore::open(path, JournalConfig::default())
        .with_context(|| format!("opening journal {}", path.display()))?;
    Ok(Ledger::new(Arc::new(store), LedgerConfig::default()))
}

async fn cmd_append(cli: &Cli, args: &AppendArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(&cli.data_path())?;
    let fields = RecordFields {
        survey_number: args.survey.clone(),
        property_number: args.property.clone(),
        owner_id: args.owner.clone(),
        land_type: args.land_type.clone(),
        action: args.action,
        details: args.details.clone(),
    };
    let record = ledger.append(fields, Deadline::after(cli.timeout())).await?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("{} Record appended to {}", "✓".green().bold(), record.property_number.bold());
            println!("{}", render_record(&record));
        }
    }
    Ok(())
}

async fn cmd_verify(cli: &Cli, args: &VerifyArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(&cli.data_path())?;
    let key = ChainKey::new(&args.property)?;
    let result = ledger.verify(&key, Deadline::after(cli.timeout())).await?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_verification(&result, args.all),
    }
    if !result.valid {
        anyhow::bail!("chain {} failed verification", result.chain_key);
    }
    Ok(())
}

async fn cmd_history(cli: &Cli, args: &HistoryArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(&cli.data_path())?;
    let deadline = Deadline::after(cli.timeout());
    let records = if args.survey {
        ledger.survey_history(&args.key, deadline).await?
    } else {
        ledger.property_history(&ChainKey::new(&args.key)?, deadline).await?
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            let view = if args.survey { "survey" } else { "property" };
            if records.is_empty() {
                println!("No records for {view} {}.", args.key.bold());
            }
            for record in &records {
                println!("{}\n", render_record(record));
            }
        }
    }
    Ok(())
}

async fn cmd_serve(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if args.in_memory {
        config.data_path = None;
    } else if let Some(path) = &cli.data {
        config.data_path = Some(path.clone());
    } else if config.data_path.is_none() {
        config.data_path = Some(cli.data_path());
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.request_timeout_ms = cli.timeout_ms;

    println!("Deed server on {}", config.bind_addr.to_string().bold());
    DeedServer::new(config)?.serve().await?;
    Ok(())
}

fn print_verification(result: &VerificationResult, all: bool) {
    if result.valid {
        println!(
            "{} Chain {} intact ({} records)",
            "✓".green().bold(),
            result.chain_key.to_string().bold(),
            result.count
        );
        return;
    }
    println!(
        "{} Chain {} INVALID ({} records, {} violations)",
        "✗".red().bold(),
        result.chain_key.to_string().bold(),
        result.count,
        result.violations.len()
    );
    let shown = if all { result.violations.len() } else { 1 };
    for violation in result.violations.iter().take(shown) {
        println!("  {}", violation.to_string().red());
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn render_record(record: &LedgerRecord) -> String {
    format!(
        "{} {}  {}\n  Survey: {}  Owner: {}  Land: {}\n  Details: {}\n  Prev: {}\n  Hash: {}",
        record.action.to_string().yellow().bold(),
        record.id.to_string().dimmed(),
        format_timestamp(record.timestamp.as_millis()),
        record.survey_number,
        record.owner_id,
        record.land_type,
        record.details,
        record.prev_hash,
        record.hash.to_hex().cyan(),
    )
}
