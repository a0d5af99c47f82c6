use anyhow::Result;
use async_trait::async_trait;

use crate::config::{BACKUPS_DIR, DEFAULT_PREVIEW_PORT, PLUGINS_DIR, PROJECTS_DIR};
use crate::plugin::{Plugin, MANIFEST_FILE};
use crate::response::{CODE_MARKER, SUGGESTION_MARKER};
use crate::session::Session;
use crate::ux;

pub struct Help;

const TOPICS: [&str; 6] = [
    "🏗️ Web App Creator & Editor",
    "🧬 Auto-Evolve & System Growth",
    "🧠 Agent Mode (Total Control)",
    "🗂️ Project & App Management",
    "🧩 Writing Your Own Plugins",
    "💡 General Tips & Shortcuts",
];

fn topic_text(idx: usize) -> Vec<String> {
    match idx {
        0 => vec![
            "- PURPOSE: Creates Single Page Applications (HTML/CSS/JS).".into(),
            format!("- USAGE: Provide a project name and an idea. The AI answers with {CODE_MARKER}"),
            format!("  and {SUGGESTION_MARKER} sections."),
            format!("- STORAGE: Files are saved in '{PROJECTS_DIR}/<name>/index.html'."),
            format!("- PREVIEW: If the local server (port {DEFAULT_PREVIEW_PORT}) is off, you will be"),
            "  offered to start it and the app opens in your browser.".into(),
            "- FOLLOW-UPS: Accept the suggestion with 'y' or type your own change.".into(),
        ],
        1 => vec![
            "- PURPOSE: Writes new plugins or improves existing ones.".into(),
            "- CONTEXT: The AI is shown the workspace's .py/.json/.toml files first.".into(),
            format!("- OUTPUT: New plugins land in '{PLUGINS_DIR}/<name>/' with main.py and {MANIFEST_FILE}."),
            format!("- SAFETY: A zip backup goes to '{BACKUPS_DIR}/' before any rewrite."),
            "  Use 'Time Machine' if something breaks.".into(),
        ],
        2 => vec![
            "- PURPOSE: A flexible mode for system tasks.".into(),
            "- USAGE: Type any command. The agent answers with a Python script".into(),
            format!("  that is saved to '{PROJECTS_DIR}/agent_task/main.py' and executed."),
            "- WARNING: Scripts run with your permissions. Read before you accept.".into(),
        ],
        3 => vec![
            format!("- APPS MANAGER: Lists projects in '{PROJECTS_DIR}/', opens them in the"),
            "  browser, or runs 'main.py' when there is no index.html.".into(),
            format!("- VISUAL LIST: Builds a launcher page in '{PROJECTS_DIR}/.visual_list/' and opens it."),
            "- DELETE APPS: Removes project folders after confirmation.".into(),
            "- TIME MACHINE: Restores any backup over its plugin or project.".into(),
        ],
        4 => vec![
            format!("- Drop '{PLUGINS_DIR}/<id>.toml' or '{PLUGINS_DIR}/<id>/{MANIFEST_FILE}'."),
            "- Keys: label (menu text), icon (optional), run (command line).".into(),
            "- Folder plugins run with their folder as working directory.".into(),
            "- New plugins appear the next time the menu is drawn.".into(),
        ],
        _ => vec![
            format!("- WORKING DIRECTORY: Your creations live in '{PROJECTS_DIR}/'."),
            format!("- FORMATS: Replies rely on the {CODE_MARKER} tag. Do not rename it."),
            "- BROWSER: termux-open-url, xdg-open or open is used, whichever exists.".into(),
            "- LOGGING: Run with -v or set RUST_LOG=debug for diagnostics.".into(),
            format!("- MANUAL SERVER: acornix serve --port {DEFAULT_PREVIEW_PORT}"),
        ],
    }
}

#[async_trait]
impl Plugin for Help {
    fn id(&self) -> &str {
        "help"
    }

    fn label(&self) -> &str {
        "Help"
    }

    fn icon(&self) -> &str {
        "📘"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let term = session.term();
        loop {
            term.clear();
            ux::heading(term, "🚀 MANUAL");
            term.say("\nThis system is composed of dynamic modules (plugins).");
            term.say("Select a section to learn more:");
            for (i, t) in TOPICS.iter().enumerate() {
                term.say(&format!("{}) {}", i + 1, t));
            }
            term.say("\n0) 🔙 Back to Main Menu");

            let Some(choice) = term.read_line("\nSelect a topic: ") else {
                return Ok(());
            };
            let idx = match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(n) if n <= TOPICS.len() => n - 1,
                _ => continue,
            };
            term.clear();
            ux::heading(term, &TOPICS[idx].to_uppercase());
            for line in topic_text(idx) {
                term.say(&line);
            }
            let _ = term.read_line("\n\n[Press Enter to return to Help Menu]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ScriptedProviders};

    #[tokio::test]
    async fn shows_a_topic_then_returns() {
        let (_dir, mut session, out) = testing::session(&["5", "", "9", "0"], ScriptedProviders::default());
        Help.run(&mut session).await.unwrap();
        let transcript = out.transcript();
        assert!(transcript.contains("WRITING YOUR OWN PLUGINS"));
        assert!(transcript.contains("plugins/<id>/plugin.toml"));
    }

    #[test]
    fn every_topic_has_text() {
        for i in 0..TOPICS.len() {
            assert!(!topic_text(i).is_empty());
        }
    }
}
