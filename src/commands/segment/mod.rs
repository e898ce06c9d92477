use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::cli::SegmentArgs;
use crate::commands::normalize::{TextNormalizer, normalize_chapter};
use crate::commands::reconcile::{backup_path, reconcile_chapter, record_outcome};
use crate::config::{PipelineConfig, SegmenterConfig, fold};
use crate::error::PipelineError;
use crate::model::{AbsorbedPart, BookManifest, Chapter, ChapterEntry, LangText, Language, Section};
use crate::report::{IssueKind, RunReport};
use crate::util::{chapter_path, discover_json_files, write_json_pretty};

mod block;
mod channels;
mod machine;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use block::extract_chapter_block;
use channels::{BookTexts, SegmentedChapter, segment_chapter};
use machine::{ChannelSection, ChannelSegments, LineClassifier, segment_channel};
