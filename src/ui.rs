//! UI layer: interactive menu and prompts built on `dialoguer`, spinners
//! from `indicatif` while remote calls run. Record logic lives in
//! `records`; this module only collects input and renders results.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::{style, Stylize};
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use crate::api::{ApiClient, LoginCredentials, UserProfile};
use crate::config::{Config, GroupConfig};
use crate::records::query::sort_newest_first;
use crate::records::review::ReviewCounts;
use crate::records::{
    run_review, DeletionReport, Record, RecordQuery, RecordStore, RetentionPlan, ReviewPrompt,
    ReviewStep, ReviewSummary, SearchCriteria, Session,
};

/// Main interactive menu. Runs until the operator picks "Exit".
///
/// Failed actions are reported and the menu is shown again; only terminal
/// I/O errors end the loop.
pub fn main_menu(api: &ApiClient, session: &Session, config: &Config) -> Result<()> {
    let items = [
        "Manage record group",
        "Review message items",
        "Search records",
        "Display auth token",
        "Edit profile",
        "Exit",
    ];
    loop {
        println!();
        let selection = Select::new()
            .with_prompt("Resonite records")
            .items(&items)
            .default(0)
            .interact()?;
        let outcome = match selection {
            0 => handle_manage_group(api, session, &config.group),
            1 => handle_message_review(api, session),
            2 => handle_search(api, session),
            3 => {
                display_token(session);
                Ok(())
            }
            4 => handle_edit_profile(api, session),
            _ => {
                println!("Goodbye!");
                return Ok(());
            }
        };
        if let Err(err) = outcome {
            if err.downcast_ref::<io::Error>().is_some() {
                return Err(err);
            }
            error!(error = %err, "menu action failed");
            println!("{} {err:#}", style("Error:").red());
        }
    }
}

/// Prompt for username, masked password and an optional TOTP code.
pub fn prompt_credentials() -> io::Result<LoginCredentials> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    let totp: String = Input::new()
        .with_prompt("TOTP code (optional, press Enter to skip)")
        .allow_empty(true)
        .interact_text()?;
    let totp = totp.trim();
    Ok(LoginCredentials {
        username: username.trim().to_string(),
        password,
        totp: (!totp.is_empty()).then(|| totp.to_string()),
    })
}

/// Collect credentials and create the session for this run.
pub fn login(api: &ApiClient) -> Result<Session> {
    let credentials = prompt_credentials()?;
    let session = with_spinner("Logging in...", || api.create_session(&credentials))?;
    println!("Logged in as {}", session.user_id());
    Ok(session)
}

/// Prune a name+path group down to its most recently modified record.
fn handle_manage_group(api: &ApiClient, session: &Session, group: &GroupConfig) -> Result<()> {
    let name: String = Input::new()
        .with_prompt("Record name")
        .default(group.name.clone())
        .interact_text()?;
    let path: String = Input::new()
        .with_prompt("Record path")
        .default(group.path.clone())
        .interact_text()?;

    let query = RecordQuery::new(api, session);
    let records = with_spinner("Fetching records...", || query.by_name_and_path(&name, &path))?;
    if records.is_empty() {
        println!("No '{name}' records found in {path}");
        return Ok(());
    }

    let plan = RetentionPlan::new(&records);
    println!("Found {} '{name}' records in {path}", records.len());
    let ordered: Vec<Record> = plan.ordered().cloned().collect();
    print_records(&ordered);

    if plan.candidates.is_empty() {
        println!("No records to delete (only one record found)");
        return Ok(());
    }

    println!("\nRecords to delete (excluding most recent):");
    print_summary(&plan.candidates);
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete {} oldest '{name}' records?", plan.candidates.len()))
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Deletion cancelled");
        return Ok(());
    }

    println!("Deleting {} records", plan.candidates.len());
    let report = with_spinner("Deleting...", || api.delete_many(session, &plan.candidates));
    print_report(&report);
    Ok(())
}

fn handle_message_review(api: &ApiClient, session: &Session) -> Result<()> {
    println!("Searching for 'message_item' records (excluding voice+message bundles)...");
    let query = RecordQuery::new(api, session);
    let records = with_spinner("Fetching records...", || query.message_items())?;
    if records.is_empty() {
        println!("No message item records found.");
        return Ok(());
    }
    println!("Found {} message item records to review.", records.len());
    review(api, session, records)
}

fn handle_search(api: &ApiClient, session: &Session) -> Result<()> {
    println!("Search for records by name, tag, or both. Leave a field empty to skip it.");
    let name: String = Input::new()
        .with_prompt("Record name")
        .allow_empty(true)
        .interact_text()?;
    let tag: String = Input::new()
        .with_prompt("Tag")
        .allow_empty(true)
        .interact_text()?;
    let Some(criteria) = SearchCriteria::from_inputs(&name, &tag) else {
        println!("Please provide at least one search criteria (name or tag).");
        return Ok(());
    };

    let query = RecordQuery::new(api, session);
    let mut results = with_spinner("Searching...", || query.search(&criteria))?;
    println!("Found {} records matching {criteria}", results.len());
    if results.is_empty() {
        return Ok(());
    }

    sort_newest_first(&mut results);
    print_summary(&results);
    let wants_review = Confirm::new()
        .with_prompt("Review these records?")
        .default(false)
        .interact()?;
    if wants_review {
        review(api, session, results)?;
    }
    Ok(())
}

fn review(api: &ApiClient, session: &Session, records: Vec<Record>) -> Result<()> {
    println!("\n=== Interactive Review ===");
    let summary = run_review(api, session, records, &mut TerminalPrompt)?;
    print_review_summary(&summary);
    Ok(())
}

/// Operator-requested display; this is the only place the token is shown.
fn display_token(session: &Session) {
    println!("\n=== Authentication Token ===");
    println!("User ID: {}", session.user_id());
    println!("Token: {}", session.token());
    println!("\nAuthorization header:");
    println!("{}", session.authorization());
}

fn handle_edit_profile(api: &ApiClient, session: &Session) -> Result<()> {
    let mut profile = with_spinner("Loading profile...", || api.get_profile(session))?;
    println!("\nCurrent profile:");
    print_profile(&profile);

    println!("\nEnter new values (press Enter to keep the current value):");
    if let Some(tagline) = prompt_optional("New tagline", profile.tagline.as_deref())? {
        profile.tagline = Some(tagline);
    }
    if let Some(description) = prompt_optional("New description", profile.description.as_deref())? {
        profile.description = Some(description);
    }

    println!("\nProfile changes:");
    print_profile(&profile);
    let confirmed = Confirm::new()
        .with_prompt("Save these changes?")
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Profile update cancelled.");
        return Ok(());
    }
    with_spinner("Saving profile...", || api.update_profile(session, &profile))?;
    println!("{} Profile updated", style("✓").green());
    Ok(())
}

fn prompt_optional(label: &str, current: Option<&str>) -> io::Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(format!("{label} [{}]", current.unwrap_or("")))
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn print_profile(profile: &UserProfile) {
    println!("Tagline: {}", profile.tagline.as_deref().unwrap_or("(not set)"));
    println!(
        "Description: {}",
        profile.description.as_deref().unwrap_or("(not set)")
    );
}

/// Review prompt on the controlling terminal.
struct TerminalPrompt;

impl ReviewPrompt for TerminalPrompt {
    fn show(&mut self, index: usize, total: usize, record: &Record, counts: ReviewCounts) {
        println!("\n--- Record {} of {total} ---", index + 1);
        print_record_detail(record);
        println!(
            "\nProgress: {}/{total} | Deleted: {} | Skipped: {}",
            index + 1,
            counts.deleted,
            counts.skipped
        );
        println!("  [D] Delete this record");
        println!("  [S] Skip this record");
        println!("  [E] Exit to main menu");
    }

    fn read_decision(&mut self) -> io::Result<String> {
        Input::new()
            .with_prompt("Choose an option (D/S/E)")
            .allow_empty(true)
            .interact_text()
    }

    fn report(&mut self, step: &ReviewStep) {
        match step {
            ReviewStep::Deleted(record) => {
                println!("{} Deleted record: {}", style("✓").green(), record.name)
            }
            ReviewStep::DeleteFailed(_, err) => {
                println!("{} Failed to delete record: {err}", style("✗").red())
            }
            ReviewStep::Skipped(record) => println!("→ Skipped record: {}", record.name),
            ReviewStep::Exited => println!("\nExiting to main menu..."),
            ReviewStep::Invalid(invalid) => println!("{invalid}"),
            ReviewStep::Finished => {}
        }
    }
}

fn print_review_summary(summary: &ReviewSummary) {
    if summary.aborted() {
        println!("\n=== Review Exited ===");
    } else {
        println!("\n=== Review Complete ===");
    }
    println!(
        "Records reviewed: {} of {}",
        summary.counts.reviewed, summary.total
    );
    println!("Records deleted: {}", summary.counts.deleted);
    println!("Records skipped: {}", summary.counts.skipped);
}

fn print_record_detail(record: &Record) {
    println!("Name: {}", record.name);
    println!("ID: {}", record.id);
    println!("Path: {}", record.path);
    println!("Last Modified: {}", record.formatted_time());
    if !record.tags.is_empty() {
        println!("Tags: {}", record.tags.join(", "));
    }
}

fn print_records(records: &[Record]) {
    for record in records {
        println!("  - {} ({})", record.name, record.id);
        println!("    Path: {}", record.path);
        println!("    Last Modified: {}", record.formatted_time());
        if !record.tags.is_empty() {
            println!("    Tags: {}", record.tags.join(", "));
        }
        println!();
    }
}

/// Total count, then per-name counts in name order.
fn print_summary(records: &[Record]) {
    println!("Found {} records", records.len());
    for (name, count) in name_counts(records) {
        println!("  {name}: {count} record(s)");
    }
}

fn name_counts(records: &[Record]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.name.as_str()).or_insert(0) += 1;
    }
    counts
}

fn print_report(report: &DeletionReport) {
    for record in &report.succeeded {
        println!(
            "{} Deleted record: {} ({})",
            style("✓").green(),
            record.name,
            record.id
        );
    }
    for (record, err) in &report.failed {
        println!(
            "{} Failed to delete record {}: {err}",
            style("✗").red(),
            record.id
        );
    }
    println!(
        "Deleted {} of {} records",
        report.succeeded.len(),
        report.attempted()
    );
}

/// Run `work` behind a spinner.
fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = work();
    spinner.finish_and_clear();
    out
}
