use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql, params_from_iter};
use tracing::{debug, info, warn};

use crate::cli::{SyncArgs, VerifyMode};
use crate::config::{PipelineConfig, SyncConfig};
use crate::error::PipelineError;
use crate::model::{Chapter, Section};
use crate::report::{IssueKind, RunReport};
use crate::util::{chapters_dir, discover_json_files, ensure_directory, now_utc_string, sha256_hex};

mod cell;
mod projection;
mod reconciler;
mod run;
mod schema;
mod store;
mod verify;

pub(crate) use cell::Cell;
pub(crate) use schema::DB_SCHEMA_VERSION;
pub(crate) use store::{SqliteStore, Store};
pub(crate) use run::default_db_path;
pub use run::run;

use projection::{ChapterProjection, SectionProjection};
use reconciler::{ChapterSyncOutcome, ConsistencyReconciler, SyncOptions, load_snapshot, section_key};
use schema::ensure_schema;
use store::{ScriptStore, Statement};
use verify::{Mismatch, sample_keys, verify_sections};
