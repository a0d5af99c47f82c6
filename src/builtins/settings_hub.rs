use anyhow::Result;
use async_trait::async_trait;

use crate::config::Settings;
use crate::errors::ShellError;
use crate::plugin::Plugin;
use crate::session::Session;
use crate::ux::{self, Terminal};

/// Edits `config.json`: provider, model, API key and preferences.
pub struct SettingsHub;

#[async_trait]
impl Plugin for SettingsHub {
    fn id(&self) -> &str {
        "settings_hub"
    }

    fn label(&self) -> &str {
        "Global Settings Hub"
    }

    fn icon(&self) -> &str {
        "⚙️"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let Some(mut settings) = load_or_default(session) else {
                return Ok(());
            };
            let term = session.term();
            term.clear();
            let active = settings.active_provider.clone();
            let model = settings.models.get(&active).map(String::as_str).unwrap_or("Not set");
            ux::heading(term, "⚙️ GLOBAL SETTINGS HUB");
            term.say(&format!("ACTIVE: {} | MODEL: {}", active.to_uppercase(), model));
            term.say(&"-".repeat(35));
            term.say("1) 🚀 Guided Configuration (Provider -> Model -> Key)");
            term.say("2) 🧠 Change Active Provider");
            term.say("3) 🛠️ System Preferences");
            term.say("\n0) 🔙 Back");

            let Some(option) = term.read_line("\nSelect an option: ") else {
                return Ok(());
            };
            let changed = match option.trim() {
                "0" => return Ok(()),
                "1" => guided_setup(term, &mut settings),
                "2" => switch_provider(term, &mut settings),
                "3" => edit_preferences(term, &mut settings),
                _ => false,
            };
            if changed {
                match session.store_settings(settings) {
                    Ok(()) => tracing::info!("settings saved"),
                    Err(e) => ux::fail(session.term(), &format!("Error saving settings: {e:#}")),
                }
            }
            session.term().pause();
        }
    }
}

/// Fresh defaults when there is no file yet; `None` (after telling the
/// user) when the file exists but can't be read.
fn load_or_default(session: &Session) -> Option<Settings> {
    match Settings::load(&session.workspace.config_file()) {
        Ok(s) => Some(s),
        Err(e) => match e.downcast_ref::<ShellError>() {
            Some(ShellError::ConfigMissing(_)) => Some(Settings::default()),
            _ => {
                ux::fail(session.term(), &format!("Critical Error: Could not load configuration: {e}"));
                session.term().pause();
                None
            }
        },
    }
}

fn pick_provider(term: &dyn Terminal, settings: &Settings, prompt: &str) -> Option<String> {
    let names: Vec<String> = settings.providers().iter().map(|p| capitalize(p)).collect();
    let picked = ux::choose(term, prompt, &names)?;
    let idx = names.iter().position(|n| n == picked)?;
    settings.providers().get(idx).cloned()
}

fn guided_setup(term: &dyn Terminal, settings: &mut Settings) -> bool {
    term.say("\n--- STEP 1: Select Provider ---");
    let Some(provider) = pick_provider(term, settings, "\nSelect provider number: ") else {
        ux::fail(term, "Invalid selection.");
        return false;
    };

    term.say(&format!("\n--- STEP 2: Set Model for {} ---", provider.to_uppercase()));
    term.say("Enter manually (e.g., gpt-4o, claude-3-5-sonnet, etc.)");
    let current = settings.models.get(&provider).cloned().unwrap_or_else(|| "Not set".into());
    let model = term.ask(&format!("Model (current: {current}): "));
    if !model.is_empty() {
        settings.models.insert(provider.clone(), model);
    }

    term.say("\n--- STEP 3: API Key ---");
    let key = term.ask(&format!("Enter API Key for {provider}: "));
    if !key.is_empty() {
        settings.api_keys.insert(provider.clone(), key);
    }

    settings.active_provider = provider.clone();
    ux::success(term, &format!("{} configured and activated.", provider.to_uppercase()));
    true
}

fn switch_provider(term: &dyn Terminal, settings: &mut Settings) -> bool {
    term.say("\n--- 🧠 SELECT ACTIVE AI ---");
    match pick_provider(term, settings, "\nSelect the provider to activate: ") {
        Some(provider) => {
            ux::success(term, &format!("Active provider changed to: {}", provider.to_uppercase()));
            settings.active_provider = provider;
            true
        }
        None => {
            ux::fail(term, "Invalid selection.");
            false
        }
    }
}

fn edit_preferences(term: &dyn Terminal, settings: &mut Settings) -> bool {
    let prefs = &mut settings.preferences;
    term.say("\n--- 🛠️ SYSTEM PREFERENCES ---");
    term.say(&format!(
        "1) Backup before Evolution: {}",
        if prefs.backup_before_evolve { "YES" } else { "NO" }
    ));
    term.say(&format!("2) Follow-up changes per session: {}", prefs.max_followups));
    term.say("0) Back");
    match term.ask("\nSelect preference number: ").as_str() {
        "1" => {
            prefs.backup_before_evolve = !prefs.backup_before_evolve;
            ux::success(term, "Preference updated.");
            true
        }
        "2" => match term.ask("New limit: ").parse::<usize>() {
            Ok(n) => {
                prefs.max_followups = n;
                ux::success(term, "Preference updated.");
                true
            }
            Err(_) => {
                ux::fail(term, "Not a number.");
                false
            }
        },
        _ => false,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
