use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_hex<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f_u8]);
    }
    format!("{:x}", hasher.finalize())
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn discover_json_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !root.exists() {
        return Ok(found);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(directory) = pending.pop() {
        let entries = fs::read_dir(&directory)
            .with_context(|| format!("failed to read {}", directory.display()))?;

        for entry in entries {
            let entry = entry
                .with_context(|| format!("failed to read entry in {}", directory.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);
            if file_type.is_file() && is_json {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

pub fn chapters_dir(corpus_root: &Path) -> PathBuf {
    corpus_root.join("chapters")
}

pub fn chapter_path(corpus_root: &Path, book: &str, chapter_id: &str) -> PathBuf {
    chapters_dir(corpus_root)
        .join(book)
        .join(format!("{chapter_id}.json"))
}

pub fn book_for_chapter_path(path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_separates_parts() {
        assert_ne!(sha256_hex(["ab", "c"]), sha256_hex(["a", "bc"]));
        assert_eq!(sha256_hex(["x"]), sha256_hex(["x"]));
    }

    #[test]
    fn discover_json_files_walks_nested_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("chapters").join("mn");
        fs::create_dir_all(&nested).expect("create nested");
        fs::write(nested.join("b.json"), "{}").expect("write b");
        fs::write(nested.join("a.json"), "{}").expect("write a");
        fs::write(nested.join("notes.txt"), "x").expect("write txt");

        let files = discover_json_files(&temp.path().join("chapters")).expect("discover");
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.json"));
        assert_eq!(book_for_chapter_path(&files[0]), "mn");

        assert!(
            discover_json_files(&temp.path().join("missing"))
                .expect("missing root")
                .is_empty()
        );
    }
}
