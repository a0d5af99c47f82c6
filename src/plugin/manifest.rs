use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs_err as fs;
use serde::{Deserialize, Serialize};

use super::{Plugin, DEFAULT_ICON};
use crate::exec;
use crate::session::Session;

pub const MANIFEST_FILE: &str = "plugin.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

/// A plugin backed by an external command, run with its folder as cwd.
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    id: String,
    label: String,
    icon: String,
    command: String,
    dir: PathBuf,
}

impl ManifestPlugin {
    /// `Ok(None)` when the manifest parses but declares nothing to run.
    pub fn load(id: &str, manifest_path: &Path) -> Result<Option<Self>> {
        let text = fs::read_to_string(manifest_path)?;
        let manifest: Manifest = toml::from_str(&text)
            .with_context(|| format!("invalid manifest {}", manifest_path.display()))?;
        let Some(command) = manifest.run.filter(|r| !r.trim().is_empty()) else {
            return Ok(None);
        };
        let dir = manifest_path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Some(Self {
            id: id.to_string(),
            label: manifest.label,
            icon: manifest.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            command,
            dir,
        }))
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Plugin for ManifestPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn on_disk(&self) -> bool {
        true
    }

    async fn run(&self, _session: &mut Session) -> Result<()> {
        tracing::info!(id = %self.id, command = %self.command(), "running plugin");
        exec::run_command_line(self.command(), &self.dir)
    }
}
