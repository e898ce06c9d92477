use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::sync::{Cell, DB_SCHEMA_VERSION, SqliteStore, Store, default_db_path};
use crate::util::{chapters_dir, discover_json_files};

#[derive(Debug, Clone, Deserialize)]
struct ManifestHead {
    run_id: String,
    command: String,
    status: String,
    updated_at: String,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.corpus_root.join("manifests");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.corpus_root));

    info!(corpus_root = %args.corpus_root.display(), "status requested");

    let chapter_files = discover_json_files(&chapters_dir(&args.corpus_root))?;
    info!(chapters = chapter_files.len(), "chapter documents");

    let latest = latest_manifests(&manifest_dir)?;
    if latest.is_empty() {
        warn!(path = %manifest_dir.display(), "no run manifests found");
    }
    for manifest in latest.values() {
        info!(
            command = %manifest.command,
            run_id = %manifest.run_id,
            status = %manifest.status,
            updated_at = %manifest.updated_at,
            "latest run"
        );
    }

    if db_path.exists() {
        let mut store = SqliteStore::open_read_only(&db_path)?;
        let chapters = table_count(&mut store, "chapters");
        let sections = table_count(&mut store, "sections");
        let schema_version = stored_schema_version(&mut store);

        info!(
            path = %db_path.display(),
            chapters,
            sections,
            schema_version = %schema_version,
            "store status"
        );
        if schema_version != DB_SCHEMA_VERSION {
            warn!(
                found = %schema_version,
                expected = DB_SCHEMA_VERSION,
                "store schema version differs; the next sync migrates it"
            );
        }
    } else {
        warn!(path = %db_path.display(), "store file missing");
    }

    Ok(())
}

fn latest_manifests(manifest_dir: &Path) -> Result<BTreeMap<String, ManifestHead>> {
    let mut latest = BTreeMap::<String, ManifestHead>::new();

    for path in discover_json_files(manifest_dir)? {
        let raw =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let manifest = match serde_json::from_slice::<ManifestHead>(&raw) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable manifest");
                continue;
            }
        };

        let newer = latest
            .get(&manifest.command)
            .is_none_or(|current| manifest.updated_at > current.updated_at);
        if newer {
            latest.insert(manifest.command.clone(), manifest);
        }
    }

    Ok(latest)
}

fn table_count(store: &mut dyn Store, table: &str) -> i64 {
    match query_count(store, &format!("SELECT COUNT(*) FROM {table}")) {
        Ok(count) => count,
        Err(err) => {
            warn!(table, error = %format!("{err:#}"), "row count query failed");
            0
        }
    }
}

fn stored_schema_version(store: &mut dyn Store) -> String {
    match store.execute(
        "SELECT value FROM metadata WHERE key = 'db_schema_version'",
        &[],
    ) {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.first())
            .and_then(Cell::as_text)
            .unwrap_or_default(),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "schema version query failed");
            String::new()
        }
    }
}

fn query_count(store: &mut dyn Store, sql: &str) -> Result<i64> {
    let rows = store.execute(sql, &[])?;
    Ok(rows
        .first()
        .and_then(|row| row.first())
        .and_then(Cell::as_i64)
        .unwrap_or(0))
}
