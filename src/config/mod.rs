use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::errors::ShellError;

pub const CONFIG_FILE: &str = "config.json";
pub const PROJECTS_DIR: &str = "my_apps";
pub const PLUGINS_DIR: &str = "plugins";
pub const BACKUPS_DIR: &str = "backups";
pub const DEFAULT_PREVIEW_PORT: u16 = 8080;
pub const DEFAULT_MAX_FOLLOWUPS: usize = 20;

/// Wire format families the shell can talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    pub fn key(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(ShellError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub backup_before_evolve: bool,
    #[serde(default = "default_max_followups")]
    pub max_followups: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { backup_before_evolve: true, max_followups: DEFAULT_MAX_FOLLOWUPS }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_followups() -> usize {
    DEFAULT_MAX_FOLLOWUPS
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_provider")]
    pub active_provider: String,
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub models: BTreeMap<String, String>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Per-provider base URL overrides (proxies, self-hosted gateways).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, String>,
}

fn default_provider() -> String {
    "openai".into()
}

impl Default for Settings {
    fn default() -> Self {
        let mut api_keys = BTreeMap::new();
        api_keys.insert("openai".to_string(), String::new());
        api_keys.insert("anthropic".to_string(), String::new());
        let mut models = BTreeMap::new();
        models.insert("openai".to_string(), "gpt-4o-mini".to_string());
        models.insert("anthropic".to_string(), "claude-3-5-sonnet".to_string());
        Self {
            active_provider: default_provider(),
            api_keys,
            models,
            preferences: Preferences::default(),
            endpoints: BTreeMap::new(),
        }
    }
}

/// Everything a provider needs, resolved from [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl Settings {
    /// Reads `path`. A missing file is reported as [`ShellError::ConfigMissing`].
    pub fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Err(ShellError::ConfigMissing(path.to_path_buf()).into());
        }
        let text = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)
            .map_err(|e| ShellError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("failed to save {}", path.display()))
    }

    /// Resolves the active provider. Both a key and a model must be present.
    pub fn active(&self) -> Result<ProviderSettings, ShellError> {
        let kind: ProviderKind = self.active_provider.parse()?;
        let name = self.active_provider.trim().to_lowercase();
        let api_key = self.api_keys.get(&name).map(|s| s.trim()).unwrap_or_default();
        let model = self.models.get(&name).map(|s| s.trim()).unwrap_or_default();
        if api_key.is_empty() || model.is_empty() {
            return Err(ShellError::MissingProviderSetting(name));
        }
        let endpoint = self
            .endpoints
            .get(&name)
            .cloned()
            .unwrap_or_else(|| kind.default_endpoint().to_string());
        Ok(ProviderSettings { kind, api_key: api_key.to_string(), model: model.to_string(), endpoint })
    }

    /// Provider names known to this file, in stable order.
    pub fn providers(&self) -> Vec<String> {
        self.api_keys.keys().cloned().collect()
    }
}

/// On-disk layout the shell operates on.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub preview_port: u16,
    pub interpreter: String,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), preview_port: DEFAULT_PREVIEW_PORT, interpreter: "python".into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(PLUGINS_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    /// Sorted project folder names (symlinked folders included, hidden ones
    /// skipped). A missing projects dir is created.
    pub fn projects(&self) -> Result<Vec<String>> {
        let dir = self.projects_dir();
        fs::create_dir_all(&dir)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') && entry.path().is_dir() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err.downcast_ref::<ShellError>(), Some(ShellError::ConfigMissing(_))));
    }

    #[test]
    fn loads_minimal_file_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"active_provider":"anthropic","api_keys":{"anthropic":"k"},"models":{"anthropic":"m"}}"#,
        )
        .unwrap();
        let s = Settings::load(&path).unwrap();
        assert!(s.preferences.backup_before_evolve);
        assert_eq!(s.preferences.max_followups, DEFAULT_MAX_FOLLOWUPS);
        let active = s.active().unwrap();
        assert_eq!(active.kind, ProviderKind::Anthropic);
        assert_eq!(active.endpoint, "https://api.anthropic.com");
    }

    #[test]
    fn active_requires_key_and_model() {
        let mut s = Settings::default();
        assert!(matches!(s.active(), Err(ShellError::MissingProviderSetting(p)) if p == "openai"));
        s.api_keys.insert("openai".into(), "sk-test".into());
        assert_eq!(s.active().unwrap().model, "gpt-4o-mini");
        s.models.remove("openai");
        assert!(s.active().is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let s = Settings { active_provider: "gemini".into(), ..Settings::default() };
        assert!(matches!(s.active(), Err(ShellError::UnknownProvider(_))));
    }

    #[test]
    fn projects_skips_files_and_hidden_folders() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        let apps = ws.projects_dir();
        for d in ["zeta", "alpha", ".visual_list"] {
            std::fs::create_dir_all(apps.join(d)).unwrap();
        }
        std::fs::write(apps.join("stray.html"), "").unwrap();
        assert_eq!(ws.projects().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn save_then_load_keeps_endpoint_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut s = Settings::default();
        s.endpoints.insert("openai".into(), "http://127.0.0.1:9".into());
        s.preferences.backup_before_evolve = false;
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }
}
