// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `selenggara doctor` command implementation.
//!
//! Runs diagnostic checks against the configured environment. The database
//! is opened read-only so a check never migrates or repairs anything.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use selenggara_config::SelenggaraConfig;
use selenggara_core::SelenggaraError;
use selenggara_storage::migrations::embedded_migration_count;
use selenggara_storage::{Database, queries};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `selenggara doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(config: &SelenggaraConfig, plain: bool) -> Result<(), SelenggaraError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  selenggara doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

/// Run every check in order. Later checks are skipped once the database
/// cannot be opened.
pub async fn collect_checks(config: &SelenggaraConfig) -> Vec<CheckResult> {
    let mut results = vec![check_config(config)];

    let db_path = &config.storage.database_path;
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        ));
        return results;
    }

    let db = match Database::open_read_only(db_path).await {
        Ok(db) => db,
        Err(e) => {
            results.push(CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            ));
            return results;
        }
    };
    match db.ping().await {
        Ok(()) => results.push(CheckResult::new("Database", CheckStatus::Pass, "connected", start)),
        Err(e) => {
            results.push(CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("query failed: {e}"),
                start,
            ));
            return results;
        }
    }

    let migrated = check_migrations(&db).await;
    let schema_ready = migrated.status == CheckStatus::Pass;
    results.push(migrated);
    if schema_ready {
        results.push(check_sequences(&db).await);
    }
    results
}

fn check_config(config: &SelenggaraConfig) -> CheckResult {
    let start = Instant::now();
    if config.gateway.bearer_token.is_none() {
        return CheckResult::new(
            "Configuration",
            CheckStatus::Warn,
            "valid, but /api is open (no gateway.bearer_token)",
            start,
        );
    }
    CheckResult::new("Configuration", CheckStatus::Pass, "valid", start)
}

async fn check_migrations(db: &Database) -> CheckResult {
    let start = Instant::now();
    let embedded = embedded_migration_count() as i64;
    match db.schema_version().await {
        Ok(Some(v)) if v == embedded => {
            CheckResult::new("Migrations", CheckStatus::Pass, format!("{v} applied"), start)
        }
        Ok(Some(v)) if v < embedded => CheckResult::new(
            "Migrations",
            CheckStatus::Warn,
            format!("{} pending (applied on next serve)", embedded - v),
            start,
        ),
        Ok(Some(v)) => CheckResult::new(
            "Migrations",
            CheckStatus::Fail,
            format!("database is at version {v}, this build knows {embedded}"),
            start,
        ),
        Ok(None) => CheckResult::new(
            "Migrations",
            CheckStatus::Warn,
            "none applied (applied on next serve)",
            start,
        ),
        Err(e) => CheckResult::new(
            "Migrations",
            CheckStatus::Fail,
            format!("could not read schema history: {e}"),
            start,
        ),
    }
}

async fn check_sequences(db: &Database) -> CheckResult {
    let start = Instant::now();
    match queries::equipment::year_density(db).await {
        Ok(years) => {
            let sparse: Vec<String> = years
                .iter()
                .filter(|y| !y.is_dense())
                .map(|y| y.year.to_string())
                .collect();
            if sparse.is_empty() {
                CheckResult::new(
                    "BIL sequences",
                    CheckStatus::Pass,
                    format!("{} year(s), all dense", years.len()),
                    start,
                )
            } else {
                CheckResult::new(
                    "BIL sequences",
                    CheckStatus::Warn,
                    format!(
                        "gaps or duplicates in {} (run `selenggara repair --all`)",
                        sparse.join(", ")
                    ),
                    start,
                )
            }
        }
        Err(e) => CheckResult::new(
            "BIL sequences",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
    }
}
