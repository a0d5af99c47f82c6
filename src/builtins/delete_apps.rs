use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;

use crate::plugin::Plugin;
use crate::safety;
use crate::session::Session;
use crate::ux;

pub struct DeleteApps;

#[async_trait]
impl Plugin for DeleteApps {
    fn id(&self) -> &str {
        "delete_apps"
    }

    fn label(&self) -> &str {
        "Delete Apps"
    }

    fn icon(&self) -> &str {
        "🗑️"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            let base = session.workspace.projects_dir();
            term.clear();
            ux::heading(term, "🗑️ DELETE APPS MANAGER");
            term.say(&format!("Base Directory: {}\n", base.display()));

            let projects = session.workspace.projects()?;
            if projects.is_empty() {
                term.say("🚫 No projects found in the directory.");
                term.pause();
                return Ok(());
            }
            for (i, p) in projects.iter().enumerate() {
                term.say(&format!("{}) {}", i + 1, p));
            }
            term.say(&format!("{}) 🔄 Refresh List", projects.len() + 1));
            term.say("0) ❌ Back");

            let Some(choice) = term.read_line("\nEnter the project number to delete (or 0 to exit): ") else {
                return Ok(());
            };
            let project = match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(n) if n <= projects.len() => &projects[n - 1],
                _ => continue,
            };

            let path = match safety::child_of(&base, project) {
                Ok(p) => p,
                Err(e) => {
                    ux::fail(term, &format!("{e}. Operation cancelled."));
                    term.pause();
                    continue;
                }
            };
            if term.confirm(&format!("\nAre you sure you want to delete '{project}'?")) {
                match fs::remove_dir_all(&path) {
                    Ok(()) => {
                        tracing::info!(project = %project, "project deleted");
                        ux::success(term, &format!("Project '{project}' deleted successfully."));
                    }
                    Err(e) => ux::fail(term, &format!("Error deleting project: {e}")),
                }
            } else {
                term.say("\n🔙 Operation cancelled.");
            }
            term.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ScriptedProviders};

    fn two_projects(root: &std::path::Path) {
        for p in ["alpha", "beta"] {
            std::fs::create_dir_all(root.join("my_apps").join(p)).unwrap();
        }
    }

    #[tokio::test]
    async fn deletes_only_after_confirmation() {
        let (dir, mut session, _out) = testing::session(&["2", "n", "", "2", "y", "", "0"], ScriptedProviders::default());
        two_projects(dir.path());
        DeleteApps.run(&mut session).await.unwrap();
        assert!(dir.path().join("my_apps/alpha").exists());
        assert!(!dir.path().join("my_apps/beta").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn refuses_symlinks_out_of_the_projects_folder() {
        let (dir, mut session, out) = testing::session(&["1", "", "0"], ScriptedProviders::default());
        let outside = dir.path().join("precious");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::create_dir_all(dir.path().join("my_apps")).unwrap();
        std::os::unix::fs::symlink(&outside, dir.path().join("my_apps/link")).unwrap();

        DeleteApps.run(&mut session).await.unwrap();
        assert!(outside.exists());
        assert!(out.transcript().contains("escapes its base directory"));
    }
}
