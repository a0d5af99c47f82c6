use std::collections::HashSet;

use colored::Colorize;

use crate::plugin::{self, DynPlugin, PluginRegistry};
use crate::session::Session;
use crate::ux;

/// Menu sections in display order. Membership is by exact label match.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "🚀 CREATION & AI",
        &["App Creator & Editor", "Auto-Evolve (create functionality)", "Agent Mode (Total control)"],
    ),
    ("🗂️ APPs MANAGEMENT", &["APPs Manager", "Visual List", "Delete Apps", "Smart Import-Export Hub"]),
    ("🧠 SYSTEM & SECURITY", &["Time Machine (Restore)", "Uninstaller Functionality"]),
    ("⚙️ SETTINGS", &["Global Settings Hub", "System Health"]),
    ("ℹ️ HELP", &["Help"]),
];

pub const OTHERS: &str = "📂 OTHERS / UTILITIES";

pub struct MenuEntry {
    pub key: usize,
    pub plugin: DynPlugin,
}

pub struct MenuSection {
    pub title: &'static str,
    pub entries: Vec<MenuEntry>,
}

pub struct Menu {
    pub sections: Vec<MenuSection>,
}

impl Menu {
    /// Lays `plugins` out into the fixed categories, then everything whose
    /// label none of them claimed under [`OTHERS`]. Keys run from 1.
    pub fn build(plugins: &[DynPlugin]) -> Menu {
        let mut sections = Vec::new();
        let mut next_key = 1;
        let mut displayed: HashSet<&str> = HashSet::new();

        for &(title, labels) in CATEGORIES {
            let mut entries = Vec::new();
            for label in labels.iter() {
                if let Some(p) = plugins.iter().find(|p| p.label() == *label) {
                    entries.push(MenuEntry { key: next_key, plugin: p.clone() });
                    displayed.insert(p.label());
                    next_key += 1;
                }
            }
            if !entries.is_empty() {
                sections.push(MenuSection { title, entries });
            }
        }

        let others: Vec<MenuEntry> = plugins
            .iter()
            .filter(|p| !displayed.contains(p.label()))
            .map(|p| {
                let entry = MenuEntry { key: next_key, plugin: p.clone() };
                next_key += 1;
                entry
            })
            .collect();
        if !others.is_empty() {
            sections.push(MenuSection { title: OTHERS, entries: others });
        }

        Menu { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn get(&self, key: usize) -> Option<&DynPlugin> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter())
            .find(|e| e.key == key)
            .map(|e| &e.plugin)
    }

    pub fn render(&self, term: &dyn ux::Terminal) {
        term.say(&"==========================================".bold().to_string());
        term.say(&"      🚀 ACORNIX          ".bold().to_string());
        term.say(&"==========================================".bold().to_string());
        for section in &self.sections {
            term.say(&format!("\n {}", section.title.bold()));
            for e in &section.entries {
                term.say(&format!("   {}) {} {}", e.key, e.plugin.icon(), e.plugin.label()));
            }
        }
        term.say("\n------------------------------------------");
        term.say(" 0) ❌ EXIT");
        term.say("------------------------------------------");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Exit,
    Entry(usize),
    Invalid,
}

pub fn parse_choice(input: &str, menu_len: usize) -> Choice {
    match input.trim().parse::<usize>() {
        Ok(0) => Choice::Exit,
        Ok(n) if n <= menu_len => Choice::Entry(n),
        _ => Choice::Invalid,
    }
}

enum State {
    Rendering,
    AwaitingChoice(Menu),
    Dispatching(DynPlugin),
    ErrorDisplayed(String),
    Exit,
}

/// The main loop. Returns when the user picks 0 or stdin closes; plugin
/// failures are shown and the menu comes back.
pub async fn run(registry: &PluginRegistry, session: &mut Session) -> anyhow::Result<()> {
    let mut state = State::Rendering;
    loop {
        state = match state {
            State::Rendering => {
                session.term().clear();
                session.reload_settings();
                let found = plugin::discover(registry, &session.workspace.plugins_dir());
                tracing::debug!(plugins = ?found.labels(), "plugins discovered");
                for err in &found.errors {
                    ux::warn(session.term(), &format!("Error loading {}: {}", err.entry, err.reason));
                }
                let menu = Menu::build(&found.plugins);
                menu.render(session.term());
                State::AwaitingChoice(menu)
            }
            State::AwaitingChoice(menu) => {
                let prompt = format!("\nSelect an option (1-{} or 0): ", menu.len());
                let Some(input) = session.term().read_line(&prompt) else {
                    break;
                };
                match parse_choice(&input, menu.len()) {
                    Choice::Exit => State::Exit,
                    Choice::Entry(key) => match menu.get(key) {
                        Some(p) => State::Dispatching(p.clone()),
                        None => State::Rendering,
                    },
                    Choice::Invalid => {
                        ux::warn(
                            session.term(),
                            &format!("Invalid selection. Please choose a number between 0 and {}.", menu.len()),
                        );
                        session.term().linger();
                        State::Rendering
                    }
                }
            }
            State::Dispatching(plugin) => {
                tracing::info!(id = plugin.id(), on_disk = plugin.on_disk(), "dispatching plugin");
                match plugin.run(session).await {
                    Ok(()) => State::Rendering,
                    Err(e) => {
                        tracing::error!(id = plugin.id(), error = %e, "plugin failed");
                        State::ErrorDisplayed(format!("{e:#}"))
                    }
                }
            }
            State::ErrorDisplayed(message) => {
                ux::fail(session.term(), &format!("Critical Error running plugin: {message}"));
                let _ = session.term().read_line("\nPress Enter to return to main menu...");
                State::Rendering
            }
            State::Exit => break,
        };
    }
    session.term().say("\nGoodbye, creator! Shutdown complete.");
    Ok(())
}
