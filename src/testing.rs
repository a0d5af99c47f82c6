//! Test doubles for the terminal and the provider factory.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::config::{Settings, Workspace};
use crate::errors::ShellError;
use crate::provider::{DynProvider, Provider, ProviderSource};
use crate::session::Session;
use crate::ux::Terminal;

/// Feeds queued answers to prompts and records everything shown.
pub struct ScriptedTerminal {
    inputs: Mutex<VecDeque<String>>,
    output: Arc<Mutex<Vec<String>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTerminal {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(Into::into).collect()),
            output: Arc::default(),
            opened: Arc::default(),
        }
    }

    pub fn transcript(&self) -> String {
        self.output.lock().join("\n")
    }

    pub fn handle(&self) -> TerminalHandle {
        TerminalHandle { output: self.output.clone(), opened: self.opened.clone() }
    }
}

/// Read side of a [`ScriptedTerminal`] after it has been moved into a session.
#[derive(Clone)]
pub struct TerminalHandle {
    output: Arc<Mutex<Vec<String>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl TerminalHandle {
    pub fn transcript(&self) -> String {
        self.output.lock().join("\n")
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl Terminal for ScriptedTerminal {
    fn clear(&self) {}

    fn say(&self, line: &str) {
        self.output.lock().push(line.to_string());
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        self.output.lock().push(prompt.to_string());
        self.inputs.lock().pop_front()
    }

    fn open_url(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Replies with queued responses, recording each prompt it was given.
#[derive(Clone, Default)]
pub struct ScriptedProviders {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    pub prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedProviders {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect())),
            prompts: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        let s = Self::default();
        s.replies.lock().push_back(Err(message.to_string()));
        s
    }
}

struct ScriptedProvider(ScriptedProviders);

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.0.prompts.lock().push((prompt.to_string(), system_prompt.to_string()));
        match self.0.replies.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

impl ProviderSource for ScriptedProviders {
    fn provider(&self, _settings: Option<&Settings>) -> Result<DynProvider, ShellError> {
        Ok(Box::new(ScriptedProvider(self.clone())))
    }
}

/// A session rooted in a fresh temp dir. Scripts run through `true` and the
/// preview check targets a port nothing listens on.
pub fn session(inputs: &[&str], providers: ScriptedProviders) -> (TempDir, Session, TerminalHandle) {
    let dir = TempDir::new().unwrap();
    let mut workspace = Workspace::new(dir.path());
    workspace.preview_port = 1;
    workspace.interpreter = "true".into();
    let term = ScriptedTerminal::new(inputs.iter().copied());
    let handle = term.handle();
    let session = Session::new(workspace, Box::new(term), Box::new(providers));
    (dir, session, handle)
}
