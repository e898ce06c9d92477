use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::NormalizeArgs;
use crate::config::{PipelineConfig, SuffixRules};
use crate::error::PipelineError;
use crate::model::Chapter;
use crate::report::RunReport;
use crate::util::{chapters_dir, discover_json_files, write_json_pretty};

mod run;
mod text;
mod walk;

pub use run::run;
pub(crate) use text::{NormalizeStats, TextNormalizer};
pub(crate) use walk::{normalize_chapter, normalize_value};
