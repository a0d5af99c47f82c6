use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;

use crate::plugin::Plugin;
use crate::safety;
use crate::session::Session;
use crate::ux;

/// Removes installed plugins from the plugins folder. Built-ins live in the
/// binary and never show up here.
pub struct Uninstaller;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Installed {
    name: String,
    is_dir: bool,
}

fn installed(plugins_dir: &Path) -> Result<Vec<Installed>> {
    fs::create_dir_all(plugins_dir)?;
    let mut items = Vec::new();
    for entry in fs::read_dir(plugins_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || name == "__pycache__" {
            continue;
        }
        items.push(Installed { is_dir: entry.path().is_dir(), name });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

#[async_trait]
impl Plugin for Uninstaller {
    fn id(&self) -> &str {
        "uninstaller"
    }

    fn label(&self) -> &str {
        "Uninstaller Functionality"
    }

    fn icon(&self) -> &str {
        "🧹"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            let plugins_dir = session.workspace.plugins_dir();
            term.clear();
            ux::heading(term, "🧹 UNINSTALLER UTILITY");

            let items = installed(&plugins_dir)?;
            if items.is_empty() {
                term.say("\n🚫 No plugins found in the 'plugins/' directory.");
                term.pause();
                return Ok(());
            }
            term.say("\nCurrently installed plugins:\n");
            for (i, it) in items.iter().enumerate() {
                let tag = if it.is_dir { "[FOLDER]" } else { "[FILE]  " };
                term.say(&format!("{}) {} {}", i + 1, tag, it.name));
            }
            term.say(&format!("{}) 🔄 Refresh List", items.len() + 1));
            term.say("0) 🔙 Back\n");

            let Some(choice) = term.read_line("Select the plugin number to uninstall (or 0): ") else {
                return Ok(());
            };
            let target = match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(n) if n <= items.len() => &items[n - 1],
                _ => continue,
            };

            if !term.confirm(&format!("\nUninstall '{}'? This action is permanent.", target.name)) {
                term.say("\n🔙 Operation cancelled.");
                term.pause();
                continue;
            }

            let removed = safety::child_of(&plugins_dir, &target.name)
                .map_err(anyhow::Error::from)
                .and_then(|path| {
                    if target.is_dir {
                        fs::remove_dir_all(&path)?;
                    } else {
                        fs::remove_file(&path)?;
                    }
                    Ok(())
                });
            match removed {
                Ok(()) => {
                    tracing::info!(plugin = %target.name, "plugin uninstalled");
                    ux::success(term, &format!("'{}' uninstalled.", target.name));
                }
                Err(e) => ux::fail(term, &format!("Error uninstalling '{}': {e:#}", target.name)),
            }
            term.pause();
        }
    }
}
