//! Browser launcher page listing every runnable project.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::artifact::{self, SCRIPT_ENTRY, WEB_ENTRY};
use crate::config::{Workspace, PROJECTS_DIR};
use crate::pipeline;
use crate::plugin::Plugin;
use crate::preview;
use crate::session::Session;
use crate::ux;

/// Hidden folder under `my_apps/` holding the generated page.
pub const LAUNCHER_DIR: &str = ".visual_list";

pub struct VisualList;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct LauncherApp {
    name: String,
    /// None for script-only projects.
    url: Option<String>,
}

/// Projects with a web or script entry point, in name order.
fn launchable(ws: &Workspace) -> Result<Vec<LauncherApp>> {
    let base = ws.projects_dir();
    let mut apps = Vec::new();
    for name in ws.projects()? {
        let dir = base.join(&name);
        if dir.join(WEB_ENTRY).is_file() {
            apps.push(LauncherApp { url: Some(preview::project_url(ws.preview_port, &name)), name });
        } else if dir.join(SCRIPT_ENTRY).is_file() {
            apps.push(LauncherApp { name, url: None });
        }
    }
    Ok(apps)
}

fn render_launcher(apps: &[LauncherApp]) -> Result<String> {
    // `<` is escaped so a project name can never close the script tag.
    let data = serde_json::to_string(apps)?.replace('<', "\\u003c");
    Ok(LAUNCHER_TEMPLATE.replace("{{COUNT}}", &apps.len().to_string()).replace("{{APPS}}", &data))
}

#[async_trait]
impl Plugin for VisualList {
    fn id(&self) -> &str {
        "visual_list"
    }

    fn label(&self) -> &str {
        "Visual List"
    }

    fn icon(&self) -> &str {
        "📱"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let term = session.term();
        let ws = &session.workspace;
        term.clear();
        ux::heading(term, "📱 VISUAL LAUNCHER");

        let apps = launchable(ws)?;
        if apps.is_empty() {
            term.say(&format!("🚫 No applications found in: {}", ws.projects_dir().display()));
            let _ = term.read_line("\nPress Enter to return...");
            return Ok(());
        }

        let page = ws.projects_dir().join(LAUNCHER_DIR).join(WEB_ENTRY);
        if let Err(e) = artifact::write_atomic(&page, &render_launcher(&apps)?) {
            ux::fail(term, &format!("Could not write launcher file: {e:#}"));
            let _ = term.read_line("\nPress Enter to return...");
            return Ok(());
        }
        tracing::debug!(apps = apps.len(), page = %page.display(), "launcher written");

        if !pipeline::ensure_preview_server(term, ws) {
            term.say(&format!("Launcher saved at: {}", page.display()));
            return Ok(());
        }
        let url = preview::workspace_url(ws.preview_port, &format!("{PROJECTS_DIR}/{LAUNCHER_DIR}/{WEB_ENTRY}"));
        term.say(&format!("🌐 Opening Launcher: {url}"));
        term.say("\n💡 TIP: Add this page to your Home Screen to use it like a native app!");
        if let Err(e) = term.open_url(&url) {
            ux::warn(term, &format!("{e:#}. Open it manually at: {url}"));
        }
        let _ = term.read_line("\n👉 Press [ENTER] to return to Acornix...");
        Ok(())
    }
}

const LAUNCHER_TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1"/>
<meta name="mobile-web-app-capable" content="yes">
<meta name="theme-color" content="#0a0a0c">
<title>Acornix Launcher</title>
<style>
  * { box-sizing: border-box; }
  body { margin: 0; background: #0a0a0c; color: #fff; min-height: 100vh;
         font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; }
  header { position: sticky; top: 0; padding: 20px; background: rgba(10, 10, 12, 0.8);
           backdrop-filter: blur(15px); border-bottom: 1px solid rgba(255, 255, 255, 0.05); }
  header h1 { margin: 0 0 12px; font-size: 26px; }
  header span { color: #8e8e93; font-size: 14px; margin-left: 8px; }
  input { width: 100%; padding: 12px 16px; border: none; border-radius: 12px; outline: none;
          background: rgba(255, 255, 255, 0.06); color: #fff; font-size: 16px; }
  main { display: grid; grid-template-columns: repeat(auto-fill, minmax(80px, 1fr)); gap: 20px 15px; padding: 20px; }
  .app { display: flex; flex-direction: column; align-items: center; cursor: pointer; }
  .app:active { transform: scale(0.92); }
  .icon { width: 70px; height: 70px; border-radius: 18px; display: flex; align-items: center;
          justify-content: center; font-size: 28px; font-weight: bold; margin-bottom: 8px; }
  .icon.script { background: #2c2c2e; color: #ffcc00; border: 1px solid rgba(255, 255, 255, 0.1); }
  .name { font-size: 12px; width: 100%; text-align: center; overflow: hidden;
          white-space: nowrap; text-overflow: ellipsis; }
  #empty { display: none; text-align: center; color: #8e8e93; margin-top: 50px; }
</style>
</head>
<body>
<header>
  <h1>App Library<span>{{COUNT}} Apps</span></h1>
  <input id="search" type="text" placeholder="Search applications..." autocomplete="off">
</header>
<main id="grid"></main>
<div id="empty">No apps found matching your search.</div>
<script>
const APPS = {{APPS}};
const GRADIENTS = [
  "linear-gradient(135deg, #FF0080, #FF8C00)",
  "linear-gradient(135deg, #00C9FF, #92FE9D)",
  "linear-gradient(135deg, #f12711, #f5af19)",
  "linear-gradient(135deg, #654ea3, #eaafc8)",
  "linear-gradient(135deg, #1CB5E0, #000851)",
  "linear-gradient(135deg, #FC466B, #3F5EFB)",
  "linear-gradient(135deg, #00b09b, #96c93d)",
];

function hash(s) {
  let h = 0;
  for (const c of s) h = c.charCodeAt(0) + ((h << 5) - h);
  return Math.abs(h);
}

const grid = document.getElementById("grid");
for (const app of APPS) {
  const card = document.createElement("div");
  card.className = "app";
  card.dataset.name = app.name.toLowerCase();
  const icon = document.createElement("div");
  const name = document.createElement("div");
  name.className = "name";
  name.textContent = app.name;
  if (app.url) {
    icon.className = "icon";
    icon.textContent = app.name.charAt(0).toUpperCase();
    icon.style.background = GRADIENTS[hash(app.name) % GRADIENTS.length];
    card.onclick = () => { window.location.href = app.url; };
  } else {
    icon.className = "icon script";
    icon.textContent = "py";
    name.style.color = "#8e8e93";
    card.onclick = () => alert("'" + app.name + "' is a Python script.\nRun it from the terminal using Acornix.");
  }
  card.append(icon, name);
  grid.append(card);
}

document.getElementById("search").addEventListener("input", (e) => {
  const term = e.target.value.toLowerCase();
  let visible = 0;
  for (const card of grid.children) {
    const show = card.dataset.name.includes(term);
    card.style.display = show ? "flex" : "none";
    if (show) visible++;
  }
  document.getElementById("empty").style.display = visible === 0 ? "block" : "none";
});
</script>
</body>
</html>
"##;
