use fs_err as fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Files the evolve prompt shows the model so it knows how plugins look.
const CONTEXT_EXTENSIONS: [&str; 3] = ["py", "json", "toml"];
const SKIPPED_DIRS: [&str; 6] = ["__pycache__", "backups", "temp_exports", "temp_imports", "target", "node_modules"];
const SEPARATOR: &str = "------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub path: String,
    pub bytes: usize,
    pub truncated: bool,
    pub content: String,
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0
        && entry.file_type().is_dir()
        && (name.starts_with('.') || SKIPPED_DIRS.contains(&&*name))
}

/// Reads the first `max_bytes` of every context file under `root`, in path
/// order. `config.json` is left out: it holds API keys.
pub fn snapshot_files(root: &Path, max_bytes: usize) -> Vec<FileBlob> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| !is_skipped(e));
    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CONTEXT_EXTENSIONS.contains(&ext));
        if !wanted || entry.file_name() == crate::config::CONFIG_FILE {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");
        match read_prefix(path, max_bytes) {
            Ok((content, bytes, truncated)) => out.push(FileBlob { path: rel, bytes, truncated, content }),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable context file"),
        }
    }
    out
}

/// All blobs as one text block, each headed by its path.
pub fn render(blobs: &[FileBlob]) -> String {
    let mut out = String::new();
    for b in blobs {
        out.push_str(&format!("{SEPARATOR}\nFILE: ./{}\n{SEPARATOR}\n", b.path));
        out.push_str(&b.content);
        if b.truncated {
            out.push_str("\n[... truncated ...]");
        }
        out.push_str("\n\n");
    }
    out
}

fn read_prefix(path: &Path, max_bytes: usize) -> anyhow::Result<(String, usize, bool)> {
    let data = fs::read(path)?;
    let bytes = data.len();
    let truncated = bytes > max_bytes;
    let slice = if truncated { &data[..max_bytes] } else { &data[..] };
    let content = String::from_utf8_lossy(slice).into_owned();
    Ok((content, bytes, truncated))
}
