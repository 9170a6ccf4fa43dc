// src/main.rs
//
// Command-line front end for the overtime allocation engine. Every run signs
// in, builds the unit store, performs one operation and exits; the cloud
// workbooks are the source of truth between runs.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod allocate;
mod auth;
mod cloud;
mod error;
mod excel;
mod import;
mod jalali;
mod links;
mod model;
mod settings;

mod cloud_tests;
mod excel_tests;

use auth::User;
use links::LinkCatalog;
use model::{UnitRecord, UnitStore};
use settings::{RunSettings, StoredCredentials};

#[derive(Parser)]
#[command(name = "overtime-core", version, about = "Monthly overtime allocation for department rosters")]
struct Cli {
    /// Sign-in username; falls back to saved credentials when omitted.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Sign-in password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Save the supplied credentials for later runs.
    #[arg(long, global = true)]
    remember_me: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the units the signed-in user may manage.
    Units,
    /// Download a unit's roster workbook and show the resulting allocation.
    Refresh {
        #[arg(long)]
        unit: String,
    },
    /// Download, allocate and write a unit's allocation workbook.
    Export {
        #[arg(long)]
        unit: String,
        /// Output .xlsx path.
        #[arg(long)]
        out: PathBuf,
        /// Override the unit's monthly total before allocating.
        #[arg(long)]
        total: Option<u32>,
        /// Pin a row at a fixed value before allocating, as ROW=HOURS
        /// (1-based row numbers as printed by `refresh`). Repeatable.
        #[arg(long = "lock", value_name = "ROW=HOURS")]
        locks: Vec<String>,
    },
    /// Import a multi-unit workbook from disk (administrators only).
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Inspect or change the per-unit download links.
    Links {
        #[command(subcommand)]
        command: LinksCommand,
    },
    /// Zero a unit's budget and clear its roster, then show the record.
    Reset {
        #[arg(long)]
        unit: String,
    },
    /// Forget any saved credentials.
    Logout,
}

#[derive(Subcommand)]
enum LinksCommand {
    /// Print the resolved link for every manageable unit.
    List,
    /// Set one unit's download link (administrators only).
    Set {
        #[arg(long)]
        unit: String,
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = RunSettings::from_env().context("Failed to read settings from environment")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Command::Logout = cli.command {
        StoredCredentials::clear(&settings.credentials_file)?;
        println!("Saved credentials removed.");
        return Ok(());
    }

    let user = sign_in(&cli, &settings)?;
    info!("Signed in as '{}'", user.username);

    let catalog = LinkCatalog::load(&settings.links_file);
    let mut store = UnitStore::new();

    match cli.command {
        Command::Units => {
            for unit in auth::accessible_units(&user) {
                println!("{}", unit);
            }
        }
        Command::Refresh { unit } => {
            require_unit_access(&user, &unit)?;
            let client = cloud::build_client(settings.download_timeout())?;
            let record = cloud::refresh_unit(&mut store, &catalog, &client, &unit)
                .await
                .with_context(|| format!("Failed to refresh unit '{}'", unit))?;
            print_record(record);
        }
        Command::Export {
            unit,
            out,
            total,
            locks,
        } => {
            require_unit_access(&user, &unit)?;
            let client = cloud::build_client(settings.download_timeout())?;
            cloud::refresh_unit(&mut store, &catalog, &client, &unit)
                .await
                .with_context(|| format!("Failed to refresh unit '{}'", unit))?;

            let record = store
                .get_mut(&unit)
                .ok_or(error::AppError::NoRoster { unit: unit.clone() })?;
            if let Some(total) = total {
                apply_total_override(&user, record, total)?;
            }
            for spec in &locks {
                let (index, hours) = parse_lock(spec)?;
                if index >= record.employees.len() {
                    bail!(
                        "Row {} does not exist; unit '{}' has {} rows",
                        index + 1,
                        unit,
                        record.employees.len()
                    );
                }
                allocate::set_employee_hours(record, index, hours)?;
            }
            allocate::check_export(record)
                .context("Allocation does not cover the unit total, refusing to export")?;

            let rows = excel::allocation_rows(record);
            let mut file = File::create(&out).map_err(|e| error::AppError::io(&out, e))?;
            excel::write_rows(&mut file, &rows)?;
            println!(
                "Wrote {} allocation rows for unit '{}' to {}",
                record.employees.len(),
                unit,
                out.display()
            );
        }
        Command::Import { file } => {
            if !user.is_admin() {
                bail!("Importing workbooks requires an administrator account");
            }
            let summary = import::import_workbook(&mut store, &file)?;
            for unit in &summary.imported {
                println!("imported: {}", unit);
            }
            for note in &summary.skipped {
                println!("skipped:  {}", note);
            }
        }
        Command::Links { command } => match command {
            LinksCommand::List => {
                for (unit, url) in catalog.entries() {
                    println!("{} -> {}", unit, if url.is_empty() { "(none)" } else { url });
                }
            }
            LinksCommand::Set { unit, url } => {
                if !user.is_admin() {
                    bail!("Changing download links requires an administrator account");
                }
                if !model::is_manageable_unit(&unit) {
                    return Err(error::AppError::UnknownUnit { unit }.into());
                }
                let mut catalog = catalog;
                let mut updated: BTreeMap<String, String> = catalog
                    .entries()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                updated.insert(unit.clone(), url);
                catalog.save(updated)?;
                println!("Link for '{}' saved to {}", unit, catalog.path().display());
            }
        },
        Command::Reset { unit } => {
            require_unit_access(&user, &unit)?;
            store.reset(&unit);
            let record = store.get_or_create(&unit);
            print_record(record);
        }
        Command::Logout => unreachable!("handled before sign-in"),
    }

    Ok(())
}

/// Resolves the principal for this run: explicit flags first, then the
/// remember-me file. With `--remember-me`, successful explicit credentials
/// are saved for later runs.
fn sign_in(cli: &Cli, settings: &RunSettings) -> anyhow::Result<User> {
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        let user = auth::authenticate(username, password)?;
        if cli.remember_me {
            StoredCredentials {
                username: username.clone(),
                password: password.clone(),
                remember_me: true,
            }
            .save(&settings.credentials_file)?;
        }
        return Ok(user);
    }

    if let Some(saved) = StoredCredentials::load(&settings.credentials_file) {
        return Ok(auth::authenticate(&saved.username, &saved.password)?);
    }

    bail!("No credentials supplied; pass --username and --password")
}

/// Applies an `export --total` override. Editing a unit's monthly budget is
/// an administrator operation; department heads only redistribute within it.
fn apply_total_override(user: &User, record: &mut UnitRecord, total: u32) -> anyhow::Result<()> {
    if !user.is_admin() {
        bail!("Changing the unit total requires an administrator account");
    }
    allocate::set_total_hours(record, total);
    Ok(())
}

fn require_unit_access(user: &User, unit: &str) -> anyhow::Result<()> {
    if !auth::accessible_units(user).iter().any(|u| u == unit) {
        bail!("User '{}' may not manage unit '{}'", user.username, unit);
    }
    Ok(())
}

/// Parses a `ROW=HOURS` lock specification into a 0-based row index.
fn parse_lock(spec: &str) -> anyhow::Result<(usize, u32)> {
    let (row, hours) = spec
        .split_once('=')
        .with_context(|| format!("Lock '{}' is not of the form ROW=HOURS", spec))?;
    let row: usize = row
        .trim()
        .parse()
        .with_context(|| format!("Lock '{}' has a non-numeric row", spec))?;
    let hours: u32 = hours
        .trim()
        .parse()
        .with_context(|| format!("Lock '{}' has non-numeric hours", spec))?;
    if row == 0 {
        bail!("Lock rows are numbered from 1");
    }
    Ok((row - 1, hours))
}

fn print_record(record: &UnitRecord) {
    println!(
        "{} | total {} h | {} production days | {}",
        record.unit,
        record.total_hours,
        record.production_days,
        record.display_month()
    );
    for (i, employee) in record.employees.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:<8} {:>4} h{}",
            i + 1,
            employee.name,
            employee.personnel_code,
            employee.hours,
            if employee.locked { "  [locked]" } else { "" }
        );
    }
}
