use anyhow::Result;
use async_trait::async_trait;

use crate::pipeline::{self, Outcome};
use crate::plugin::Plugin;
use crate::prompt;
use crate::session::Session;
use crate::ux;

/// Project folder every agent script is written to.
pub const AGENT_PROJECT: &str = "agent_task";

pub struct AgentMode;

#[async_trait]
impl Plugin for AgentMode {
    fn id(&self) -> &str {
        "agent_mode"
    }

    fn label(&self) -> &str {
        "Agent Mode (Total control)"
    }

    fn icon(&self) -> &str {
        "🧠"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let term = session.term();
        term.clear();
        ux::heading(term, "🧠 AGENT MODE (TOTAL CONTROL)");
        term.say("Type your command or task for the system (e.g., 'Clean temp files', 'Organize my apps')");

        let order = term.ask("\n👉 Command: ");
        if order.is_empty() || order == "0" {
            return Ok(());
        }

        term.say("\n🧠 Agent is thinking...");
        let reply = session.ask(&order, &prompt::system_prompt_agent()).await;
        match pipeline::process_response(session, reply, AGENT_PROJECT).await {
            Outcome::NoResponse => {
                ux::fail(term, "Error: Could not get a response from the AI.");
                term.pause();
            }
            outcome => tracing::info!(?outcome, "agent task finished"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ScriptedProviders};

    #[tokio::test]
    async fn writes_and_runs_the_agent_script() {
        let providers = ScriptedProviders::new(["---CODIGO---\n```python\nprint('ok')\n```"]);
        let prompts = providers.prompts.clone();
        let (dir, mut session, out) = testing::session(&["list my files"], providers);

        AgentMode.run(&mut session).await.unwrap();

        let script = dir.path().join("my_apps/agent_task/main.py");
        assert_eq!(std::fs::read_to_string(script).unwrap(), "print('ok')");
        assert_eq!(prompts.lock()[0], ("list my files".to_string(), prompt::system_prompt_agent()));
        assert!(out.transcript().contains("Executing script"));
    }

    #[tokio::test]
    async fn empty_command_makes_no_call() {
        let providers = ScriptedProviders::default();
        let prompts = providers.prompts.clone();
        let (_dir, mut session, _out) = testing::session(&[""], providers);
        AgentMode.run(&mut session).await.unwrap();
        assert!(prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn no_reply_is_reported() {
        let (_dir, mut session, out) = testing::session(&["do it", ""], ScriptedProviders::failing("down"));
        AgentMode.run(&mut session).await.unwrap();
        assert!(out.transcript().contains("Could not get a response"));
    }
}
