//! AI reply → artifact → preview/run → follow-up change, repeated until the
//! user stops or the follow-up cap is reached.

use std::path::PathBuf;

use crate::artifact::{self, Artifact, ArtifactKind};
use crate::config::Workspace;
use crate::exec;
use crate::preview;
use crate::prompt;
use crate::response::{self, ParsedResponse};
use crate::session::Session;
use crate::ux::{self, Terminal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The provider gave nothing back.
    NoResponse,
    /// The reply had no code marker; nothing was written.
    NoCode,
    Failed(String),
    Completed { path: PathBuf, rounds: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    Done,
    Change(String),
}

/// Asks what to do with `suggestion`: `y` takes it, `n` or nothing stops,
/// anything else is the user's own change.
pub fn offer_followup(term: &dyn Terminal, suggestion: Option<&str>) -> Followup {
    let Some(suggestion) = suggestion else {
        return Followup::Done;
    };
    term.say(&format!("\n🤖 [ASSISTANT SUGGESTS]: {suggestion}"));
    term.say("💡 (Type 'y' to accept, 'n' to exit, or type your OWN IMPROVEMENT directly)");
    let input = term.ask("👉 Your choice: ");
    match input.to_lowercase().as_str() {
        "" | "n" => {
            term.say("👍 Returning to menu.");
            Followup::Done
        }
        "y" => Followup::Change(suggestion.to_string()),
        _ => Followup::Change(input),
    }
}

/// Offers to start the preview server when nothing answers on its port.
/// True when a server is (or was just) started.
pub fn ensure_preview_server(term: &dyn Terminal, ws: &Workspace) -> bool {
    if preview::is_server_active(ws.preview_port) {
        return true;
    }
    term.say("\n🤖 [ASSISTANT]: Local server is currently OFF.");
    if !term.confirm("👉 Would you like to start it?") {
        return false;
    }
    term.say(&format!("📡 Starting server in background (Port {})...", ws.preview_port));
    match preview::spawn_detached(ws) {
        Ok(()) => true,
        Err(e) => {
            ux::fail(term, &format!("{e:#}"));
            false
        }
    }
}

/// Web artifacts get previewed, scripts get run in the foreground.
pub fn launch(session: &Session, artifact: &Artifact) {
    let term = session.term();
    let ws = &session.workspace;
    match artifact.kind {
        ArtifactKind::Web => {
            ux::success(term, &format!("Project saved in: {}", artifact.path.display()));
            ensure_preview_server(term, ws);
            let url = preview::project_url(ws.preview_port, &artifact.project);
            term.say(&format!("🌍 Opening: {url}"));
            if let Err(e) = term.open_url(&url) {
                ux::warn(term, &format!("{e:#}"));
            }
        }
        ArtifactKind::Script => {
            term.say(&format!("\n🚀 Executing script at: {}", artifact.path.display()));
            match exec::run_script(&ws.interpreter, &artifact.path, &ws.root) {
                Ok(status) if !status.success() => ux::warn(term, &format!("Script exited with {status}")),
                Ok(_) => {}
                Err(e) => ux::fail(term, &format!("{e:#}")),
            }
        }
    }
}

/// Drives one generation session for `project`, starting from `response`.
pub async fn process_response(session: &Session, response: Option<String>, project: &str) -> Outcome {
    let term = session.term();
    let max_followups = session.preferences().max_followups;
    let mut current = response;
    let mut rounds = 0usize;

    loop {
        let Some(text) = current.take() else {
            return Outcome::NoResponse;
        };

        let ParsedResponse { code, suggestion } = match response::parse(&text) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(project, "reply without code marker");
                ux::warn(term, &format!("{}.", capitalize(&e.to_string())));
                return Outcome::NoCode;
            }
        };

        let written = match artifact::write(&session.workspace.projects_dir(), project, &code) {
            Ok(a) => a,
            Err(e) => {
                ux::fail(term, &format!("Could not save project: {e:#}"));
                return Outcome::Failed(e.to_string());
            }
        };
        rounds += 1;
        launch(session, &written);

        if suggestion.is_some() && rounds > max_followups {
            ux::warn(term, &format!("Reached the limit of {max_followups} follow-up changes for this session."));
            return Outcome::Completed { path: written.path, rounds };
        }
        let change = match offer_followup(term, suggestion.as_deref()) {
            Followup::Done => return Outcome::Completed { path: written.path, rounds },
            Followup::Change(change) => change,
        };

        term.say(&format!("\n🧠 Applying: '{change}'..."));
        current = session
            .ask(&prompt::followup_prompt(&code, &change), &prompt::system_prompt_followup())
            .await;
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
