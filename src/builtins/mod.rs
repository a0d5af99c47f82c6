//! Plugins that ship with the shell.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backup;
use crate::plugin::PluginRegistry;
use crate::session::Session;
use crate::ux;

mod agent_mode;
mod app_creator;
mod apps_manager;
mod auto_evolve;
mod delete_apps;
mod help;
mod settings_hub;
mod time_machine;
mod uninstaller;
mod visual_list;

pub use agent_mode::AgentMode;
pub use app_creator::AppCreator;
pub use apps_manager::AppsManager;
pub use auto_evolve::AutoEvolve;
pub use delete_apps::DeleteApps;
pub use help::Help;
pub use settings_hub::SettingsHub;
pub use time_machine::TimeMachine;
pub use uninstaller::Uninstaller;
pub use visual_list::VisualList;

pub fn registry() -> PluginRegistry {
    let mut reg = PluginRegistry::new();
    reg.register(Arc::new(AppCreator));
    reg.register(Arc::new(AutoEvolve));
    reg.register(Arc::new(AgentMode));
    reg.register(Arc::new(AppsManager));
    reg.register(Arc::new(VisualList));
    reg.register(Arc::new(DeleteApps));
    reg.register(Arc::new(TimeMachine));
    reg.register(Arc::new(Uninstaller));
    reg.register(Arc::new(SettingsHub));
    reg.register(Arc::new(Help));
    reg
}

/// Zips `dir` into the backups folder before it gets rewritten, unless the
/// user switched that off. A failed backup is reported but does not block
/// the edit.
pub(crate) fn backup_before_change(session: &Session, dir: &Path) -> Option<PathBuf> {
    if !session.preferences().backup_before_evolve {
        tracing::debug!(dir = %dir.display(), "backup disabled by preference");
        return None;
    }
    match backup::create(&session.workspace.backups_dir(), dir) {
        Ok(archive) => {
            session.term().say(&format!("🛡️  Security backup created: {}", archive.display()));
            Some(archive)
        }
        Err(e) => {
            ux::warn(session.term(), &format!("Failed to create backup: {e:#}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::menu::{Menu, CATEGORIES};
    use crate::plugin;
    use crate::testing::{self, ScriptedProviders};

    #[test]
    fn every_builtin_lands_in_a_category() {
        let dir = tempfile::TempDir::new().unwrap();
        let found = plugin::discover(&registry(), dir.path());
        assert_eq!(found.plugins.len(), 10);
        let categorised: Vec<&str> = CATEGORIES.iter().flat_map(|(_, labels)| labels.iter().copied()).collect();
        for p in &found.plugins {
            assert!(categorised.contains(&p.label()), "{} has no category", p.label());
        }
        let menu = Menu::build(&found.plugins);
        assert_eq!(menu.get(1).unwrap().label(), "App Creator & Editor");
        assert_eq!(menu.get(5).unwrap().label(), "Visual List");
        assert_eq!(menu.get(10).unwrap().label(), "Help");
    }

    #[test]
    fn backup_respects_preference() {
        let (dir, mut session, _out) = testing::session(&[], ScriptedProviders::default());
        let app = dir.path().join("my_apps/demo");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("index.html"), "<html></html>").unwrap();

        assert!(backup_before_change(&session, &app).is_some());

        let mut s = Settings::default();
        s.preferences.backup_before_evolve = false;
        session.store_settings(s).unwrap();
        assert!(backup_before_change(&session, &app).is_none());
        assert_eq!(backup::list(&session.workspace.backups_dir()).unwrap().len(), 1);
    }
}
