use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err as fs;
use tempfile::NamedTempFile;

use crate::safety;

pub const WEB_ENTRY: &str = "index.html";
pub const SCRIPT_ENTRY: &str = "main.py";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Web,
    Script,
}

impl ArtifactKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Web => WEB_ENTRY,
            ArtifactKind::Script => SCRIPT_ENTRY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub project: String,
    pub path: PathBuf,
}

/// Substring heuristic: an HTML root tag or doctype anywhere means web.
pub fn classify(code: &str) -> ArtifactKind {
    let lower = code.to_lowercase();
    if lower.contains("<html") || lower.contains("<!doctype") {
        ArtifactKind::Web
    } else {
        ArtifactKind::Script
    }
}

/// Writes `code` as `<projects_root>/<project>/{index.html|main.py}`.
pub fn write(projects_root: &Path, project: &str, code: &str) -> Result<Artifact> {
    let project = safety::validate_name(project)?.to_string();
    let kind = classify(code);
    let dir = projects_root.join(&project);
    fs::create_dir_all(&dir)?;
    let path = dir.join(kind.file_name());
    write_atomic(&path, code)?;
    tracing::info!(path = %path.display(), kind = ?kind, bytes = code.len(), "artifact written");
    Ok(Artifact { kind, project, path })
}

/// Temp file in the same directory, then rename over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let tmp = NamedTempFile::new_in(parent)?;
    fs::write(tmp.path(), contents)?;
    tmp.persist(path)?;
    Ok(())
}
