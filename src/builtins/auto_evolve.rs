use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;

use crate::artifact::{self, SCRIPT_ENTRY};
use crate::context;
use crate::plugin::manifest::Manifest;
use crate::plugin::{Plugin, MANIFEST_FILE};
use crate::prompt;
use crate::response;
use crate::safety;
use crate::session::Session;
use crate::ux;

/// Per-file cap for the workspace snapshot sent as context.
const CONTEXT_FILE_BYTES: usize = 16 * 1024;

/// Grows the shell: writes new folder plugins or rewrites existing ones.
pub struct AutoEvolve;

#[async_trait]
impl Plugin for AutoEvolve {
    fn id(&self) -> &str {
        "auto_evolve"
    }

    fn label(&self) -> &str {
        "Auto-Evolve (create functionality)"
    }

    fn icon(&self) -> &str {
        "🧬"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            term.clear();
            ux::heading(term, "🧬 SYSTEM EVOLUTION (AUTO-EVOLVE)");
            term.say("1) Create New Plugin (As Folder)");
            term.say("2) Fix / Improve Existing Plugin");
            term.say("0) 🔙 Back");
            let Some(mode) = term.read_line("\nSelect mode: ") else {
                return Ok(());
            };
            match mode.trim() {
                "0" => return Ok(()),
                "1" => create_plugin(session).await?,
                "2" => improve_plugin(session).await?,
                _ => {}
            }
        }
    }
}

fn evolve_system_prompt(root: &Path) -> String {
    let blobs = context::snapshot_files(root, CONTEXT_FILE_BYTES);
    let total: usize = blobs.iter().map(|b| b.bytes).sum();
    tracing::debug!(root = %root.display(), files = blobs.len(), bytes = total, "project context scanned");
    prompt::system_prompt_evolve(&context::render(&blobs))
}

/// Generated plugin code: first fenced block if any, minus trailing prose.
fn clean_generated(reply: &str) -> String {
    response::strip_chatter(&response::extract_fenced(reply, "python"))
}

async fn create_plugin(session: &Session) -> Result<()> {
    let term = session.term();
    let ws = &session.workspace;
    let name = term.ask("\n📝 New Plugin Name (or 0 to cancel): ");
    if name.is_empty() || name == "0" {
        return Ok(());
    }
    let task = term.ask("⚙️ What should it do?: ");

    let folder = safety::sanitize_folder_name(&name);
    let plugins_dir = ws.plugins_dir();
    fs::create_dir_all(&plugins_dir)?;
    let plugin_dir = safety::child_of(&plugins_dir, &folder)?;

    let system = evolve_system_prompt(&ws.root);
    term.say(&format!("\n🧠 Programming {folder}/{SCRIPT_ENTRY}..."));
    let Some(reply) = session.ask(&prompt::new_plugin_prompt(&name, &task), &system).await else {
        term.pause();
        return Ok(());
    };
    let code = clean_generated(&reply);
    if code.is_empty() {
        ux::warn(term, "The AI returned no code; nothing was installed.");
        term.pause();
        return Ok(());
    }

    fs::create_dir_all(&plugin_dir)?;
    let script = plugin_dir.join(SCRIPT_ENTRY);
    artifact::write_atomic(&script, &code)?;
    let manifest = Manifest {
        label: name.clone(),
        icon: None,
        run: Some(format!("{} {SCRIPT_ENTRY}", ws.interpreter)),
    };
    artifact::write_atomic(&plugin_dir.join(MANIFEST_FILE), &toml::to_string(&manifest)?)?;
    tracing::info!(plugin = %folder, "plugin installed");
    ux::success(term, &format!("Plugin installed at: {}", script.display()));
    term.pause();
    Ok(())
}

async fn improve_plugin(session: &Session) -> Result<()> {
    let term = session.term();
    let ws = &session.workspace;
    let plugins_dir = ws.plugins_dir();
    fs::create_dir_all(&plugins_dir)?;
    let folders = folder_plugins(&plugins_dir)?;
    if folders.is_empty() {
        term.say("\n🚫 No folder plugins to improve.");
        term.pause();
        return Ok(());
    }

    term.say("\n--- SELECT PLUGIN TO IMPROVE ---");
    let Some(name) = ux::choose(term, "\nChoice: ", &folders) else {
        return Ok(());
    };
    let plugin_dir = safety::child_of(&plugins_dir, name)?;
    let target = plugin_dir.join(SCRIPT_ENTRY);
    if !target.is_file() {
        ux::warn(term, &format!("'{name}' has no {SCRIPT_ENTRY} to improve."));
        term.pause();
        return Ok(());
    }

    super::backup_before_change(session, &plugin_dir);
    let old_code = fs::read_to_string(&target)?;
    let issue = term.ask("\n🛠️ Improvement task: ");
    if issue.is_empty() || issue == "0" {
        return Ok(());
    }

    term.say(&format!("\n🧠 Thinking and improving {name}..."));
    let system = evolve_system_prompt(&ws.root);
    if let Some(reply) = session.ask(&prompt::improve_plugin_prompt(&old_code, &issue), &system).await {
        let code = clean_generated(&reply);
        if code.is_empty() {
            ux::warn(term, "The AI returned no code; nothing was changed.");
        } else {
            artifact::write_atomic(&target, &code)?;
            ux::success(term, &format!("Updated: {}", target.display()));
        }
    }
    term.pause();
    Ok(())
}

fn folder_plugins(plugins_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(plugins_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || name == "__pycache__" || !entry.file_type()?.is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ManifestPlugin;
    use crate::testing::{self, ScriptedProviders};

    #[tokio::test]
    async fn creates_a_folder_plugin_with_manifest() {
        let providers =
            ScriptedProviders::new(["```python\nimport os\nprint('sunny')\n```\nHere is your plugin."]);
        let prompts = providers.prompts.clone();
        let (dir, mut session, out) =
            testing::session(&["1", "Weather Station", "show the weather", "", "0"], providers);
        std::fs::create_dir_all(dir.path().join("my_apps/tool")).unwrap();
        std::fs::write(dir.path().join("my_apps/tool/main.py"), "print('tool')").unwrap();

        AutoEvolve.run(&mut session).await.unwrap();

        let plugin_dir = dir.path().join("plugins/weather_station");
        assert_eq!(std::fs::read_to_string(plugin_dir.join("main.py")).unwrap(), "import os\nprint('sunny')");
        let plugin = ManifestPlugin::load("weather_station", &plugin_dir.join(MANIFEST_FILE)).unwrap().unwrap();
        assert_eq!(plugin.label(), "Weather Station");
        assert_eq!(plugin.command(), "true main.py");
        assert!(out.transcript().contains("Plugin installed at"));

        let sent = prompts.lock();
        assert_eq!(sent[0].0, "Create a new plugin named 'Weather Station' that does: show the weather.");
        assert!(sent[0].1.contains("FILE: ./my_apps/tool/main.py"));
    }

    #[tokio::test]
    async fn improve_strips_chatter_and_keeps_a_backup() {
        let providers = ScriptedProviders::new(["import time\nprint(time.time())\nNotes: uses the time module"]);
        let (dir, mut session, _out) = testing::session(&["2", "1", "show seconds", "", "0"], providers);
        let clock = dir.path().join("plugins/clock");
        std::fs::create_dir_all(&clock).unwrap();
        std::fs::write(clock.join("main.py"), "print('tick')").unwrap();
        std::fs::write(clock.join(MANIFEST_FILE), "label = \"Clock\"\nrun = \"true main.py\"\n").unwrap();

        AutoEvolve.run(&mut session).await.unwrap();

        assert_eq!(std::fs::read_to_string(clock.join("main.py")).unwrap(), "import time\nprint(time.time())");
        let backups = crate::backup::list(&dir.path().join("backups")).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].name, "clock");
    }

    #[tokio::test]
    async fn failed_generation_installs_nothing() {
        let (dir, mut session, _out) =
            testing::session(&["1", "broken", "anything", "", "0"], ScriptedProviders::failing("offline"));
        AutoEvolve.run(&mut session).await.unwrap();
        assert!(!dir.path().join("plugins/broken").exists());
    }
}
