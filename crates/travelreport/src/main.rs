//! `tareport` - CLI for travelreport
//!
//! This binary provides the command-line interface for filling in, saving,
//! listing and exporting travel agent complaint reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;

use travelreport::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, DraftArgs, ExportCommand, ListCommand,
    OutputFormat, StatusCommand, ViewCommand,
};
use travelreport::{init_logging, Config, Field, LoadState, RemoveOutcome, Report, Session, View};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Configuration commands work without opening the store
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(cli.config, config_cmd),
        command => command,
    };

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let mut session = Session::open(&config).context("failed to open the report store")?;

    if let LoadState::Recovered { backup_key, reason } = session.store().load_state() {
        eprintln!("Warning: saved reports could not be read ({reason}).");
        eprintln!("The unreadable data was kept under '{backup_key}'.");
    }

    match command {
        Command::Save(args) => handle_save(&mut session, &args),
        Command::Export(export_cmd) => handle_export(&mut session, export_cmd),
        Command::List(list_cmd) => handle_list(&mut session, &list_cmd),
        Command::View(view_cmd) => handle_view(&mut session, &view_cmd),
        Command::Delete(delete_cmd) => handle_delete(&mut session, &delete_cmd),
        Command::Status(status_cmd) => handle_status(&config, &session, &status_cmd),
        Command::Config(_) => Ok(()),
    }
}

fn handle_save(session: &mut Session, args: &DraftArgs) -> Result<()> {
    args.apply(&mut session.draft, &mut session.pads)?;
    let report = session.save()?;
    println!("Report saved successfully! (id {})", report.id);
    Ok(())
}

fn handle_export(session: &mut Session, cmd: ExportCommand) -> Result<()> {
    let path = match cmd {
        ExportCommand::Pdf { id: Some(id), .. } => session.export_report_pdf(id)?,
        ExportCommand::Pdf { id: None, draft } => {
            draft.apply(&mut session.draft, &mut session.pads)?;
            session.export_draft_pdf()?
        }
        ExportCommand::Csv => session.export_csv()?,
    };
    println!("Exported {}", path.display());
    Ok(())
}

fn handle_list(session: &mut Session, cmd: &ListCommand) -> Result<()> {
    session.show(View::Dashboard);
    let reports = session.store().reports();

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
        OutputFormat::Plain => {
            for report in reports {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    report.id,
                    report.created_at,
                    report.fields.booking_no,
                    report.fields.name,
                    report.fields.problem_type
                );
            }
        }
        OutputFormat::Table => {
            println!("Saved Reports ({})", reports.len());
            println!("==================");
            if reports.is_empty() {
                println!("No saved reports yet.");
                return Ok(());
            }
            println!(
                "{:<14}  {:<24}  {:<12}  {:<20}  {:<14}  {:<10}",
                "ID", "Created", "Booking No", "Name", "Problem", "Signed"
            );
            for report in reports {
                let signed = match (&report.traveler_signature, &report.agent_signature) {
                    (Some(_), Some(_)) => "both",
                    (Some(_), None) => "traveler",
                    (None, Some(_)) => "agent",
                    (None, None) => "-",
                };
                println!(
                    "{:<14}  {:<24}  {:<12}  {:<20}  {:<14}  {:<10}",
                    report.id,
                    clip(&report.created_at, 24),
                    clip(&report.fields.booking_no, 12),
                    clip(&report.fields.name, 20),
                    clip(report.fields.problem_type.label(), 14),
                    signed
                );
            }
        }
    }
    Ok(())
}

fn handle_view(session: &mut Session, cmd: &ViewCommand) -> Result<()> {
    let report = session.view_report(cmd.id)?.clone();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Report {}", report.id);
    println!("Created: {}", report.created_at);
    println!();
    for field in Field::ALL {
        let value = session.draft.get(field);
        if field == Field::ReportText {
            println!("{}:", field.label());
            for line in value.lines() {
                println!("  {line}");
            }
        } else {
            println!("{:<14} {}", format!("{}:", field.label()), value);
        }
    }
    println!();
    println!(
        "Traveler signature: {}",
        signed_label(report.traveler_signature.is_some())
    );
    println!(
        "Agent signature:    {}",
        signed_label(report.agent_signature.is_some())
    );
    Ok(())
}

fn handle_delete(session: &mut Session, cmd: &DeleteCommand) -> Result<()> {
    let yes = cmd.yes;
    let outcome = session.delete(cmd.id, |report| yes || confirm_delete(report))?;

    match outcome {
        RemoveOutcome::Removed(report) => println!("Deleted report {}.", report.id),
        RemoveOutcome::Declined => println!("Delete cancelled."),
        RemoveOutcome::NotFound => println!("No report with id {}.", cmd.id),
    }
    Ok(())
}

fn confirm_delete(report: &Report) -> bool {
    print!(
        "Delete report {} ({}, {})? [y/N] ",
        report.id, report.fields.booking_no, report.fields.name
    );
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn handle_status(config: &Config, session: &Session, cmd: &StatusCommand) -> Result<()> {
    let store = session.store();
    let storage = store.storage();
    let keys = storage.keys()?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "database_size_bytes": storage.size_bytes(),
            "store_key": store.key(),
            "stored_keys": keys,
            "store_state": store.load_state().to_string(),
            "report_count": store.len(),
            "newest_id": store.newest_id(),
            "export_dir": session.exporter().output_dir(),
            "default_phone_code": config.form.default_phone_code,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("tareport status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", storage.size_bytes());
        println!("Store key:     {}", store.key());
        println!("Store state:   {}", store.load_state());
        println!("Stored keys:   {}", keys.join(", "));
        println!("Reports:       {}", store.len());
        println!("Export dir:    {}", session.exporter().output_dir().display());
    }
    Ok(())
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Store key:          {}", config.storage.store_key);
                println!();
                println!("[Export]");
                println!("  Output directory:   {}", config.output_dir().display());
                println!(
                    "  Page break (mm):    {}",
                    config.export.page_break_threshold_mm
                );
                println!();
                println!("[Form]");
                println!("  Default phone code: {}", config.form.default_phone_code);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                path.unwrap_or_else(Config::default_config_path).display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn signed_label(signed: bool) -> &'static str {
    if signed {
        "signed"
    } else {
        "not signed"
    }
}

/// Shorten `value` to at most `width` characters for table output.
fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut clipped: String = value.chars().take(width.saturating_sub(1)).collect();
        clipped.push('~');
        clipped
    }
}
