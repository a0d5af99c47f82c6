use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::services::ServeDir;

use crate::config::{Workspace, PROJECTS_DIR};

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// One-shot TCP connect probe; whatever answers on the port counts.
pub fn is_server_active(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok()
}

/// URL of a workspace-relative path on the preview server.
pub fn workspace_url(port: u16, rel_path: &str) -> String {
    format!("http://localhost:{port}/{}", rel_path.trim_start_matches('/'))
}

pub fn project_url(port: u16, project: &str) -> String {
    workspace_url(port, &format!("{PROJECTS_DIR}/{project}/index.html"))
}

/// Starts `acornix serve` for the workspace as a background process that
/// outlives the menu.
pub fn spawn_detached(ws: &Workspace) -> Result<()> {
    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let root = std::path::absolute(&ws.root).unwrap_or_else(|_| ws.root.clone());
    let child = Command::new(exe)
        .arg("--root")
        .arg(&root)
        .arg("serve")
        .arg("--port")
        .arg(ws.preview_port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to start preview server")?;
    tracing::info!(pid = child.id(), port = ws.preview_port, "preview server started");
    std::thread::sleep(Duration::from_secs(1));
    Ok(())
}

/// Static file server over `root`, bound to localhost only.
pub async fn serve(root: &Path, port: u16) -> Result<()> {
    let app = axum::Router::new().fallback_service(ServeDir::new(root));
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("cannot bind 127.0.0.1:{port}"))?;
    tracing::info!(root = %root.display(), port, "serving");
    axum::serve(listener, app).await?;
    Ok(())
}
