use std::path::{Component, Path, PathBuf};

use crate::errors::ShellError;

/// A project or plugin name must be a single normal path component.
pub fn validate_name(name: &str) -> Result<&str, ShellError> {
    let trimmed = name.trim();
    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(seg)), None) if seg.to_str() == Some(trimmed) => Ok(trimmed),
        _ => Err(ShellError::InvalidName(name.to_string())),
    }
}

/// Joins `name` onto `base`, refusing anything that would land outside it.
pub fn child_of(base: &Path, name: &str) -> Result<PathBuf, ShellError> {
    let name = validate_name(name)?;
    let candidate = base.join(name);
    if !is_within_root(&candidate, base) {
        return Err(ShellError::PathEscape(candidate));
    }
    Ok(candidate)
}

/// Canonical containment check. Symlinks pointing elsewhere fail it.
pub fn is_within_root(candidate: &Path, root: &Path) -> bool {
    let abs_root = match std::fs::canonicalize(root) {
        Ok(p) => p,
        Err(_) => return false,
    };
    match std::fs::canonicalize(candidate) {
        Ok(abs_candidate) => abs_candidate.starts_with(&abs_root),
        // Not created yet: the lexical check in validate_name already holds.
        Err(_) => candidate.parent().and_then(|p| std::fs::canonicalize(p).ok()) == Some(abs_root),
    }
}

/// Lowercase alphanumerics with underscores; used for generated folder names.
pub fn sanitize_folder_name(name: &str) -> String {
    let clean: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase()
        .replace(' ', "_");
    if clean.is_empty() { "new_plugin".to_string() } else { clean }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn names_must_be_single_components() {
        assert_eq!(validate_name(" demo ").unwrap(), "demo");
        for bad in ["", "  ", "..", ".", "a/b", "../x", "/etc"] {
            assert!(validate_name(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn child_of_accepts_new_and_existing() {
        let dir = TempDir::new().unwrap();
        assert!(child_of(dir.path(), "fresh").is_ok());
        std::fs::create_dir(dir.path().join("there")).unwrap();
        assert_eq!(child_of(dir.path(), "there").unwrap(), dir.path().join("there"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_base_is_rejected() {
        let base = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), base.path().join("link")).unwrap();
        assert!(matches!(child_of(base.path(), "link"), Err(ShellError::PathEscape(_))));
    }

    #[test]
    fn sanitizes_folder_names() {
        assert_eq!(sanitize_folder_name("My Cool Tool!"), "my_cool_tool");
        assert_eq!(sanitize_folder_name("!!!"), "new_plugin");
    }
}
