use anyhow::Result;
use async_trait::async_trait;

use crate::artifact::{self, SCRIPT_ENTRY, WEB_ENTRY};
use crate::exec;
use crate::pipeline;
use crate::plugin::Plugin;
use crate::preview;
use crate::safety;
use crate::session::Session;
use crate::ux;

const EXAMPLE_PROJECT: &str = "example_app";
const EXAMPLE_HTML: &str = "<!doctype html><html><head><title>Example</title></head>\
<body><h1>Example App</h1><p>Ready to build!</p></body></html>";

/// Browses `my_apps/` and launches a project.
pub struct AppsManager;

#[async_trait]
impl Plugin for AppsManager {
    fn id(&self) -> &str {
        "apps_manager"
    }

    fn label(&self) -> &str {
        "APPs Manager"
    }

    fn icon(&self) -> &str {
        "🗂️"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            let ws = &session.workspace;
            term.clear();
            ux::heading(term, "🗂️ APPs MANAGER");
            term.say(&format!("Base folder: {}\n", ws.projects_dir().display()));
            let projects = ws.projects()?;

            if projects.is_empty() {
                term.say("🚫 No projects found in the current folder.");
                term.say("1) Create an example project");
                term.say("0) Back");
                match term.read_line("\nSelect an option: ").as_deref().map(str::trim) {
                    None | Some("0") => return Ok(()),
                    Some("1") => {
                        let dir = safety::child_of(&ws.projects_dir(), EXAMPLE_PROJECT)?;
                        artifact::write_atomic(&dir.join(WEB_ENTRY), EXAMPLE_HTML)?;
                        ux::success(term, "Example project created successfully.");
                        term.pause();
                    }
                    Some(_) => {}
                }
                continue;
            }

            for (i, p) in projects.iter().enumerate() {
                term.say(&format!("{}) {}", i + 1, p));
            }
            let refresh = projects.len() + 1;
            term.say(&format!("{refresh}) 🔄 Refresh"));
            term.say("0) 🔙 Back");

            let Some(choice) = term.read_line("\nSelect a project to open (or 0): ") else {
                return Ok(());
            };
            let idx = match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(n) if n <= projects.len() => n - 1,
                _ => continue,
            };
            open_project(session, &projects[idx])?;
        }
    }
}

fn open_project(session: &Session, project: &str) -> Result<()> {
    let term = session.term();
    let ws = &session.workspace;
    let dir = safety::child_of(&ws.projects_dir(), project)?;

    if dir.join(WEB_ENTRY).is_file() {
        if !pipeline::ensure_preview_server(term, ws) {
            return Ok(());
        }
        let url = preview::project_url(ws.preview_port, project);
        term.say(&format!("\n🌍 Opening project at: {url}"));
        if let Err(e) = term.open_url(&url) {
            ux::warn(term, &format!("{e:#}"));
        }
        let _ = term.read_line("\nPress Enter to return to manager...");
        return Ok(());
    }

    ux::warn(term, &format!("'{WEB_ENTRY}' not found in this project."));
    let script = dir.join(SCRIPT_ENTRY);
    if !script.is_file() {
        term.say(&format!("🚫 No valid entry point ({WEB_ENTRY} or {SCRIPT_ENTRY}) found."));
        term.pause();
        return Ok(());
    }
    if term.confirm(&format!("Would you like to run '{SCRIPT_ENTRY}' instead?")) {
        term.say(&format!("🚀 Executing {project}/{SCRIPT_ENTRY}...\n"));
        match exec::run_script(&ws.interpreter, &script, &ws.root) {
            Ok(status) if !status.success() => ux::warn(term, &format!("Script exited with {status}")),
            Ok(_) => {}
            Err(e) => ux::fail(term, &format!("{e:#}")),
        }
        let _ = term.read_line("\nExecution finished. Press Enter...");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ScriptedProviders};

    #[tokio::test]
    async fn empty_folder_offers_an_example_project() {
        // create example, pause, open it, decline server, back
        let (dir, mut session, out) = testing::session(&["1", "", "1", "n", "0"], ScriptedProviders::default());
        AppsManager.run(&mut session).await.unwrap();

        let index = dir.path().join("my_apps/example_app/index.html");
        assert!(std::fs::read_to_string(index).unwrap().contains("Example App"));
        assert!(out.transcript().contains("Local server is currently OFF"));
        assert!(out.opened().is_empty());
    }

    #[tokio::test]
    async fn runs_script_projects() {
        let (dir, mut session, out) = testing::session(&["1", "y", "", "0"], ScriptedProviders::default());
        std::fs::create_dir_all(dir.path().join("my_apps/tool")).unwrap();
        std::fs::write(dir.path().join("my_apps/tool/main.py"), "print(1)").unwrap();

        AppsManager.run(&mut session).await.unwrap();
        let transcript = out.transcript();
        assert!(transcript.contains("Executing tool/main.py"));
        assert!(transcript.contains("Execution finished"));
    }

    #[tokio::test]
    async fn refresh_and_junk_redraw_the_list() {
        let (dir, mut session, out) = testing::session(&["2", "abc", "0"], ScriptedProviders::default());
        std::fs::create_dir_all(dir.path().join("my_apps/only")).unwrap();
        AppsManager.run(&mut session).await.unwrap();
        assert_eq!(out.transcript().matches("1) only").count(), 3);
    }
}
