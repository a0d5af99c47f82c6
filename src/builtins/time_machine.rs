use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;
use humansize::{format_size, DECIMAL};

use crate::backup::{self, BackupEntry};
use crate::plugin::Plugin;
use crate::safety;
use crate::session::Session;
use crate::ux::{self, Terminal};

/// Restores a zipped backup over the plugin or project it came from.
pub struct TimeMachine;

#[async_trait]
impl Plugin for TimeMachine {
    fn id(&self) -> &str {
        "time_machine"
    }

    fn label(&self) -> &str {
        "Time Machine (Restore)"
    }

    fn icon(&self) -> &str {
        "⏪"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            term.clear();
            ux::heading(term, "⏪ TIME MACHINE (UNIVERSAL RESTORE)");

            let backups = backup::list(&session.workspace.backups_dir())?;
            if backups.is_empty() {
                term.say("\n🚫 No backup files found.");
                term.pause();
                return Ok(());
            }
            print_table(term, &backups);

            let Some(choice) = term.read_line("\nSelect the backup ID to restore (or 0): ") else {
                return Ok(());
            };
            let entry = match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(n) if n <= backups.len() => &backups[n - 1],
                _ => continue,
            };
            restore_entry(session, entry)?;
        }
    }
}

fn print_table(term: &dyn Terminal, backups: &[BackupEntry]) {
    term.say("\nAvailable Backups (Most recent first):");
    term.say(&format!("{:<4} {:<25} {:<20} {:>10}", "ID", "PROJECT", "DATE CREATED", "SIZE"));
    term.say(&"-".repeat(66));
    for (i, b) in backups.iter().enumerate() {
        let name = if b.name.chars().count() > 22 {
            format!("{}..", b.name.chars().take(22).collect::<String>())
        } else {
            b.name.clone()
        };
        let size = format_size(b.size, DECIMAL);
        term.say(&format!("{:<4} {:<25} {:<20} {:>10}", i + 1, name, b.display_date(), size));
    }
    term.say(&"-".repeat(66));
    term.say("0) ❌ Back");
}

/// Where a backup goes back to: an existing plugin folder wins over an
/// existing project folder. `None` when neither exists.
fn find_target(session: &Session, name: &str) -> Option<(PathBuf, &'static str)> {
    let ws = &session.workspace;
    let plugin = ws.plugins_dir().join(name);
    if plugin.exists() {
        return Some((plugin, "PLUGIN"));
    }
    let app = ws.projects_dir().join(name);
    if app.exists() {
        return Some((app, "APP"));
    }
    None
}

fn restore_entry(session: &Session, entry: &BackupEntry) -> Result<()> {
    let term = session.term();
    let ws = &session.workspace;
    if let Err(e) = safety::validate_name(&entry.name) {
        ux::fail(term, &e.to_string());
        term.pause();
        return Ok(());
    }

    let (target, kind) = match find_target(session, &entry.name) {
        Some((path, kind)) => (path, Some(kind)),
        None => {
            ux::warn(term, &format!("Original project '{}' not found.", entry.name));
            term.say("Where should it be restored?");
            term.say("1) To plugins/");
            term.say("2) To my_apps/");
            term.say("0) Cancel");
            let base = match term.ask("Select choice: ").as_str() {
                "1" => ws.plugins_dir(),
                "2" => ws.projects_dir(),
                _ => return Ok(()),
            };
            fs::create_dir_all(&base)?;
            (safety::child_of(&base, &entry.name)?, None)
        }
    };

    term.say("\n🚨 RESTORE REPORT 🚨");
    term.say(&format!("📦 Backup: {}", entry.file_name));
    term.say(&format!("📂 Destination: {}", target.display()));
    if let Some(kind) = kind {
        term.say(&format!("ℹ️  Detected as: {kind}"));
    }

    if term.confirm("\nAre you sure? This will OVERWRITE current data.") {
        match backup::restore(&entry.path, &target) {
            Ok(()) => ux::success(term, "Restore successful."),
            Err(e) => ux::fail(term, &format!("Restore Error: {e:#}")),
        }
    } else {
        term.say("\nOperation cancelled.");
    }
    term.pause();
    Ok(())
}
