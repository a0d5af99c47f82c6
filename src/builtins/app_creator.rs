use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;

use crate::artifact::{self, WEB_ENTRY};
use crate::pipeline;
use crate::plugin::Plugin;
use crate::prompt;
use crate::response;
use crate::safety;
use crate::session::Session;
use crate::ux;

/// Creates web apps from an idea, or edits an existing app's `index.html`.
pub struct AppCreator;

#[async_trait]
impl Plugin for AppCreator {
    fn id(&self) -> &str {
        "app_creator"
    }

    fn label(&self) -> &str {
        "App Creator & Editor"
    }

    fn icon(&self) -> &str {
        "🏗️"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        loop {
            let term = session.term();
            term.clear();
            ux::heading(term, "🏗️ WEB APP CREATOR & EDITOR");
            term.say("1) ✨ Create New Web App");
            term.say("2) 🛠️ Improve/Fix Existing App");
            term.say("0) 🔙 Back");
            let Some(choice) = term.read_line("\nSelect an option: ") else {
                return Ok(());
            };
            match choice.trim() {
                "0" => return Ok(()),
                "1" => create(session).await?,
                "2" => improve(session).await?,
                _ => {}
            }
        }
    }
}

async fn create(session: &Session) -> Result<()> {
    let term = session.term();
    let name = term.ask("\n📝 Project Name (folder name): ");
    if name.is_empty() {
        return Ok(());
    }
    if let Err(e) = safety::validate_name(&name) {
        ux::fail(term, &e.to_string());
        term.pause();
        return Ok(());
    }
    let idea = term.ask(&format!("🎨 What should I build for '{name}'?: "));

    term.say(&format!("\n🧠 Programming '{name}' from scratch..."));
    let reply = session.ask(&idea, &prompt::system_prompt_web_creator()).await;
    let outcome = pipeline::process_response(session, reply, &name).await;
    tracing::info!(project = %name, ?outcome, "app creation finished");
    term.pause();
    Ok(())
}

async fn improve(session: &Session) -> Result<()> {
    let term = session.term();
    let projects = session.workspace.projects()?;
    if projects.is_empty() {
        term.say("\n🚫 You haven't created any apps yet.");
        term.pause();
        return Ok(());
    }

    term.say("\n--- SELECT APP TO IMPROVE ---");
    let Some(app) = ux::choose(term, "\nSelection number: ", &projects) else {
        return Ok(());
    };
    let app_dir = safety::child_of(&session.workspace.projects_dir(), app)?;
    let index = app_dir.join(WEB_ENTRY);
    if !index.is_file() {
        ux::warn(term, &format!("Could not find '{WEB_ENTRY}' in {app}."));
        term.pause();
        return Ok(());
    }

    super::backup_before_change(session, &app_dir);
    let old_code = fs::read_to_string(&index)?;

    term.say(&format!("\nEditing: {app}"));
    let request = term.ask("🛠️ What changes or improvements do you need?: ");
    if request.is_empty() || request == "0" {
        return Ok(());
    }

    term.say(&format!("\n🧠 Applying changes to {app}..."));
    let reply = session
        .ask(&prompt::edit_prompt(&old_code, &request), prompt::system_prompt_web_editor())
        .await;
    if let Some(reply) = reply {
        let code = response::extract_fenced(&reply, "html");
        if code.is_empty() {
            ux::warn(term, "The AI returned no code; nothing was changed.");
        } else {
            artifact::write_atomic(&index, &code)?;
            ux::success(term, &format!("App successfully updated: {}", index.display()));
        }
    }
    term.pause();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ScriptedProviders};

    #[tokio::test]
    async fn creates_a_web_app_from_an_idea() {
        let providers = ScriptedProviders::new(["---CODIGO---\n<html>todo</html>"]);
        let prompts = providers.prompts.clone();
        // menu, name, idea, decline server, pause, back
        let (dir, mut session, out) =
            testing::session(&["1", "todo", "a todo list", "n", "", "0"], providers);
        AppCreator.run(&mut session).await.unwrap();

        let index = dir.path().join("my_apps/todo/index.html");
        assert_eq!(std::fs::read_to_string(index).unwrap(), "<html>todo</html>");
        assert_eq!(prompts.lock()[0].0, "a todo list");
        assert_eq!(out.opened(), vec!["http://localhost:1/my_apps/todo/index.html".to_string()]);
    }

    #[tokio::test]
    async fn rejects_names_with_separators() {
        let (dir, mut session, out) = testing::session(&["1", "../evil", "", "0"], ScriptedProviders::default());
        AppCreator.run(&mut session).await.unwrap();
        assert!(out.transcript().contains("invalid project name"));
        assert!(!dir.path().join("evil").exists());
    }

    #[tokio::test]
    async fn improve_backs_up_then_overwrites_index() {
        let providers = ScriptedProviders::new(["Sure!\n```html\n<html>red</html>\n```\nEnjoy."]);
        let prompts = providers.prompts.clone();
        let (dir, mut session, _out) = testing::session(&["2", "1", "make it red", "", "0"], providers);
        let app = dir.path().join("my_apps/demo");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("index.html"), "<html>plain</html>").unwrap();

        AppCreator.run(&mut session).await.unwrap();

        assert_eq!(std::fs::read_to_string(app.join("index.html")).unwrap(), "<html>red</html>");
        let sent = prompts.lock();
        assert!(sent[0].0.contains("<html>plain</html>"));
        assert!(sent[0].0.contains("TASK: make it red"));
        assert_eq!(sent[0].1, prompt::system_prompt_web_editor());
        let backups = crate::backup::list(&dir.path().join("backups")).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].name, "demo");
    }

    #[tokio::test]
    async fn improve_without_index_leaves_project_alone() {
        let (dir, mut session, out) = testing::session(&["2", "1", "", "0"], ScriptedProviders::default());
        std::fs::create_dir_all(dir.path().join("my_apps/tool")).unwrap();
        std::fs::write(dir.path().join("my_apps/tool/main.py"), "print(1)").unwrap();

        AppCreator.run(&mut session).await.unwrap();
        assert!(out.transcript().contains("Could not find 'index.html' in tool"));
        assert!(!dir.path().join("backups").exists());
    }
}
