use crate::config::{Preferences, Settings, Workspace};
use crate::errors::ShellError;
use crate::provider::ProviderSource;
use crate::ux::{self, Terminal};

/// Handle every plugin runs against: the workspace layout, the settings
/// loaded at the last reload point, the terminal, and the provider factory.
pub struct Session {
    pub workspace: Workspace,
    settings: Option<Settings>,
    term: Box<dyn Terminal>,
    providers: Box<dyn ProviderSource>,
}

impl Session {
    pub fn new(workspace: Workspace, term: Box<dyn Terminal>, providers: Box<dyn ProviderSource>) -> Self {
        Self { workspace, settings: None, term, providers }
    }

    pub fn term(&self) -> &dyn Terminal {
        self.term.as_ref()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn preferences(&self) -> Preferences {
        self.settings.as_ref().map(|s| s.preferences.clone()).unwrap_or_default()
    }

    /// Re-reads `config.json`. A missing or broken file leaves the session
    /// without settings; AI calls then fail with a configuration error.
    pub fn reload_settings(&mut self) {
        match Settings::load(&self.workspace.config_file()) {
            Ok(s) => self.settings = Some(s),
            Err(e) => {
                match e.downcast_ref::<ShellError>() {
                    Some(ShellError::ConfigMissing(_)) => tracing::debug!("{e}"),
                    _ => tracing::warn!(error = %e, "could not load settings"),
                }
                self.settings = None;
            }
        }
    }

    /// Persists `settings` and makes them current.
    pub fn store_settings(&mut self, settings: Settings) -> anyhow::Result<()> {
        settings.save(&self.workspace.config_file())?;
        self.settings = Some(settings);
        Ok(())
    }

    /// Sends one prompt to the active provider. Every failure is reported to
    /// the user and collapses to `None`.
    pub async fn ask(&self, prompt: &str, system_prompt: &str) -> Option<String> {
        let provider = match self.providers.provider(self.settings.as_ref()) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "provider configuration");
                ux::fail(self.term(), &format!("Error: {e}"));
                return None;
            }
        };

        let spinner = self.term.busy("Thinking...");
        let result = provider.complete(prompt, system_prompt).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match result {
            Ok(text) => {
                tracing::info!(provider = provider.name(), bytes = text.len(), "AI reply received");
                Some(text)
            }
            Err(e) => {
                tracing::error!(provider = provider.name(), error = %e, "AI call failed");
                ux::fail(self.term(), &format!("{} API Error: {e:#}", provider.name()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ConfiguredProviders;
    use crate::testing::{self, ScriptedProviders, ScriptedTerminal};

    #[tokio::test]
    async fn ask_without_config_reports_and_returns_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let term = ScriptedTerminal::new(Vec::<String>::new());
        let out = term.handle();
        let mut session = Session::new(
            ws.clone(),
            Box::new(term),
            Box::new(ConfiguredProviders { config_path: ws.config_file() }),
        );
        session.reload_settings();
        assert!(session.settings().is_none());
        assert_eq!(session.ask("p", "s").await, None);
        assert!(out.transcript().contains("config.json not found"));
    }

    #[tokio::test]
    async fn ask_with_missing_key_aborts() {
        let dir = tempfile::TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        Settings::default().save(&ws.config_file()).unwrap();
        let term = ScriptedTerminal::new(Vec::<String>::new());
        let out = term.handle();
        let mut session = Session::new(
            ws.clone(),
            Box::new(term),
            Box::new(ConfiguredProviders { config_path: ws.config_file() }),
        );
        session.reload_settings();
        assert_eq!(session.ask("p", "s").await, None);
        assert!(out.transcript().contains("missing configuration for openai"));
    }

    #[tokio::test]
    async fn provider_failure_collapses_to_none() {
        let (_dir, session, out) = testing::session(&[], ScriptedProviders::failing("timed out"));
        assert_eq!(session.ask("p", "s").await, None);
        assert!(out.transcript().contains("timed out"));
    }

    #[tokio::test]
    async fn settings_are_only_read_at_reload() {
        let (_dir, mut session, _out) = testing::session(&[], ScriptedProviders::default());
        let mut s = Settings::default();
        s.preferences.max_followups = 3;
        s.save(&session.workspace.config_file()).unwrap();
        assert_eq!(session.preferences().max_followups, crate::config::DEFAULT_MAX_FOLLOWUPS);
        session.reload_settings();
        assert_eq!(session.preferences().max_followups, 3);
    }
}
