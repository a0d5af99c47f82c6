//! Plugins: what the main menu lists and dispatches to.
//!
//! Built-in plugins are registered in code. Extra plugins are picked up from
//! the plugins folder on every menu redraw, so dropping a manifest in there
//! makes it show up without restarting. Two on-disk shapes are recognised:
//!
//! - `plugins/<id>.toml`
//! - `plugins/<id>/plugin.toml`
//!
//! A manifest names a `label`, an optional `icon`, and the `run` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use fs_err as fs;

use crate::session::Session;

pub mod manifest;

pub use manifest::{ManifestPlugin, MANIFEST_FILE};

pub const DEFAULT_ICON: &str = "🧩";

const SKIPPED_ENTRIES: [&str; 3] = ["__pycache__", "__init__.toml", "target"];

#[async_trait]
pub trait Plugin: Send + Sync {
    /// Module identity: the registration name, or the file stem / folder name.
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    fn icon(&self) -> &str {
        DEFAULT_ICON
    }

    /// True for plugins that live in the plugins folder.
    fn on_disk(&self) -> bool {
        false
    }

    async fn run(&self, session: &mut Session) -> Result<()>;
}

pub type DynPlugin = Arc<dyn Plugin>;

#[derive(Default)]
pub struct PluginRegistry {
    builtins: Vec<DynPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: DynPlugin) {
        self.builtins.retain(|p| p.id() != plugin.id());
        self.builtins.push(plugin);
    }

    pub fn builtins(&self) -> &[DynPlugin] {
        &self.builtins
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub entry: String,
    pub reason: String,
}

pub struct Discovery {
    pub plugins: Vec<DynPlugin>,
    pub errors: Vec<LoadError>,
}

impl Discovery {
    pub fn labels(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.label()).collect()
    }
}

/// Built-ins plus every valid manifest under `plugins_root`, sorted by
/// label (case-insensitive). A broken entry is reported and skipped.
pub fn discover(registry: &PluginRegistry, plugins_root: &Path) -> Discovery {
    let mut plugins: Vec<DynPlugin> = registry.builtins().to_vec();
    let mut errors = Vec::new();

    if let Err(e) = scan(plugins_root, &mut plugins, &mut errors) {
        tracing::warn!(root = %plugins_root.display(), error = %e, "cannot scan plugins folder");
        errors.push(LoadError { entry: plugins_root.display().to_string(), reason: format!("{e:#}") });
    }

    plugins.sort_by(|a, b| {
        a.label()
            .to_lowercase()
            .cmp(&b.label().to_lowercase())
            .then_with(|| a.id().cmp(b.id()))
    });
    Discovery { plugins, errors }
}

fn scan(root: &Path, plugins: &mut Vec<DynPlugin>, errors: &mut Vec<LoadError>) -> Result<()> {
    fs::create_dir_all(root)?;
    let mut entries: Vec<_> = fs::read_dir(root)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || SKIPPED_ENTRIES.contains(&name.as_str()) {
            continue;
        }
        let path = entry.path();
        let (id, manifest_path) = if path.is_dir() {
            let candidate = path.join(MANIFEST_FILE);
            if !candidate.is_file() {
                continue;
            }
            (name.clone(), candidate)
        } else if let Some(stem) = name.strip_suffix(".toml") {
            (stem.to_string(), path.clone())
        } else {
            continue;
        };

        match ManifestPlugin::load(&id, &manifest_path) {
            Ok(Some(plugin)) => {
                tracing::debug!(%id, label = plugin.label(), "plugin loaded");
                plugins.push(Arc::new(plugin));
            }
            Ok(None) => tracing::debug!(%id, "manifest has no run command; not a plugin"),
            Err(e) => {
                tracing::warn!(entry = %name, error = %e, "error loading plugin");
                errors.push(LoadError { entry: name, reason: format!("{e:#}") });
            }
        }
    }
    Ok(())
}
