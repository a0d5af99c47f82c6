use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime};
use fs_err as fs;
use regex::Regex;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A `<name>_<YYYYMMDD_HHMMSS>.zip` file in the backups folder. Later
/// backups taken within the same second carry a `-<seq>` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub name: String,
    pub created: Option<NaiveDateTime>,
    pub seq: u32,
    pub size: u64,
}

impl BackupEntry {
    pub fn display_date(&self) -> String {
        match self.created {
            Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
            None => "Unknown date".to_string(),
        }
    }
}

fn name_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<name>.+)_(?P<ts>\d{8}_\d{6})(?:-(?P<seq>\d+))?\.zip$").ok()).as_ref()
}

/// Splits a backup file name into project name, timestamp and same-second
/// sequence. Files that don't follow the pattern keep their stem as the name.
pub fn parse_file_name(file_name: &str) -> (String, Option<NaiveDateTime>, u32) {
    if let Some(caps) = name_pattern().and_then(|re| re.captures(file_name)) {
        let ts = NaiveDateTime::parse_from_str(&caps["ts"], TIMESTAMP_FORMAT).ok();
        let seq = caps.name("seq").and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        return (caps["name"].to_string(), ts, seq);
    }
    (file_name.trim_end_matches(".zip").to_string(), None, 0)
}

/// Claims a fresh archive file. Existing backups are never reopened for
/// writing.
fn create_archive(backups_dir: &Path, name: &str, stamp: &str) -> Result<(PathBuf, fs::File)> {
    for seq in 0u32.. {
        let file_name = match seq {
            0 => format!("{name}_{stamp}.zip"),
            n => format!("{name}_{stamp}-{n}.zip"),
        };
        let target = backups_dir.join(file_name);
        match fs::OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => return Ok((target, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e).with_context(|| format!("failed to create {}", target.display())),
        }
    }
    Err(anyhow!("no free backup name for {name}_{stamp}"))
}

/// Zips `source` into `backups_dir/<folder>_<timestamp>.zip`.
pub fn create(backups_dir: &Path, source: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| anyhow!("cannot back up {}", source.display()))?
        .to_string_lossy()
        .to_string();
    fs::create_dir_all(backups_dir)?;
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let (target, file) = create_archive(backups_dir, &name, &stamp)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source)?;
        let rel_name = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        if entry.file_type().is_dir() {
            zip.add_directory(rel_name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(rel_name, options)?;
            let mut data = Vec::new();
            fs::File::open(entry.path())?.read_to_end(&mut data)?;
            zip.write_all(&data)?;
        }
    }
    zip.finish()?;
    tracing::info!(archive = %target.display(), "backup created");
    Ok(target)
}

/// Backups in `backups_dir`, most recent first. Missing folder = none.
pub fn list(backups_dir: &Path) -> Result<Vec<BackupEntry>> {
    if !backups_dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(backups_dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.ends_with(".zip") || !entry.file_type()?.is_file() {
            continue;
        }
        let (name, created, seq) = parse_file_name(&file_name);
        out.push(BackupEntry { size: entry.metadata()?.len(), path: entry.path(), file_name, name, created, seq });
    }
    out.sort_by(|a, b| {
        b.created.cmp(&a.created).then_with(|| b.seq.cmp(&a.seq)).then_with(|| b.file_name.cmp(&a.file_name))
    });
    Ok(out)
}

/// Replaces `target` with the archive's contents.
pub fn restore(archive: &Path, target: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("failed to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(file).with_context(|| format!("not a zip archive: {}", archive.display()))?;
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;
    zip.extract(target).with_context(|| format!("failed to unpack {}", archive.display()))?;
    tracing::info!(archive = %archive.display(), target = %target.display(), "backup restored");
    Ok(())
}
