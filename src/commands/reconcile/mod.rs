use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::cli::ReconcileArgs;
use crate::model::{Chapter, Language, NumberRange, Section};
use crate::report::{IssueKind, RunReport};
use crate::util::{book_for_chapter_path, chapters_dir, discover_json_files, write_json_pretty};

mod chapter;
mod duplicates;
mod gaps;
mod ranges;
mod run;
mod vagga;

pub(crate) use chapter::{ReconcileOutcome, backup_path, reconcile_chapter, record_outcome};
pub use run::run;

use duplicates::{RemovedSection, has_duplicates, remove_duplicates};
use gaps::find_gaps;
use ranges::derive_ranges;
use vagga::dedup_vaggas;
