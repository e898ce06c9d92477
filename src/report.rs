use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MalformedDocument,
    MissingChapterMarker,
    DuplicateSectionNumber,
    StructuralGap,
    UnicodeAnomaly,
    StoreUnavailable,
    SyncMismatch,
    SectionWriteFailed,
    SectionCountDivergence,
    ChannelDivergence,
    DuplicateChapterId,
    OrphanRow,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedDocument => "malformed_document",
            Self::MissingChapterMarker => "missing_chapter_marker",
            Self::DuplicateSectionNumber => "duplicate_section_number",
            Self::StructuralGap => "structural_gap",
            Self::UnicodeAnomaly => "unicode_anomaly",
            Self::StoreUnavailable => "store_unavailable",
            Self::SyncMismatch => "sync_mismatch",
            Self::SectionWriteFailed => "section_write_failed",
            Self::SectionCountDivergence => "section_count_divergence",
            Self::ChannelDivergence => "channel_divergence",
            Self::DuplicateChapterId => "duplicate_chapter_id",
            Self::OrphanRow => "orphan_row",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueRecord {
    pub kind: IssueKind,
    pub unit: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitCounts {
    pub processed: usize,
    pub fixed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub command: String,
    pub started_at: String,
    started_compact: String,
    categories: BTreeMap<String, UnitCounts>,
    issues: Vec<IssueRecord>,
    notes: Vec<String>,
}

impl RunReport {
    pub fn new(command: &str) -> Self {
        let started_ts = Utc::now();
        let started_compact = utc_compact_string(started_ts);
        Self {
            run_id: format!("run-{started_compact}"),
            command: command.to_string(),
            started_at: now_utc_string(),
            started_compact,
            categories: BTreeMap::new(),
            issues: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn processed(&mut self, category: &str) {
        self.counts_mut(category).processed += 1;
    }

    pub fn fixed(&mut self, category: &str, count: usize) {
        self.counts_mut(category).fixed += count;
    }

    pub fn skipped(&mut self, category: &str) {
        self.counts_mut(category).skipped += 1;
    }

    pub fn failed(&mut self, category: &str) {
        self.counts_mut(category).failed += 1;
    }

    pub fn counts(&self, category: &str) -> UnitCounts {
        self.categories.get(category).copied().unwrap_or_default()
    }

    pub fn record(&mut self, kind: IssueKind, unit: impl Into<String>, detail: impl Into<String>) {
        let unit = unit.into();
        let detail = detail.into();
        warn!(kind = kind.as_str(), unit = %unit, detail = %detail, "issue recorded");
        self.issues.push(IssueRecord { kind, unit, detail });
    }

    pub fn record_error(&mut self, unit: impl Into<String>, error: &PipelineError) {
        self.record(error.kind(), unit, error.to_string());
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    pub fn default_manifest_path(&self, corpus_root: &Path) -> PathBuf {
        corpus_root.join("manifests").join(format!(
            "{}_run_{}.json",
            self.command, self.started_compact
        ))
    }

    pub fn finish(self, manifest_path: &Path) -> Result<RunManifest> {
        for (category, counts) in &self.categories {
            info!(
                category = %category,
                processed = counts.processed,
                fixed = counts.fixed,
                skipped = counts.skipped,
                failed = counts.failed,
                "run summary"
            );
        }

        let mut issue_counts = BTreeMap::<IssueKind, usize>::new();
        for issue in &self.issues {
            *issue_counts.entry(issue.kind).or_insert(0) += 1;
        }

        let failed_units = self.categories.values().map(|counts| counts.failed).sum::<usize>();
        let status = if failed_units > 0 || !self.issues.is_empty() {
            "completed_with_issues"
        } else {
            "completed"
        };

        let manifest = RunManifest {
            manifest_version: 1,
            run_id: self.run_id,
            command: self.command,
            status: status.to_string(),
            started_at: self.started_at,
            updated_at: now_utc_string(),
            summary: self.categories,
            issue_counts,
            issues: self.issues,
            notes: self.notes,
        };

        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), status = %manifest.status, "wrote run manifest");

        Ok(manifest)
    }

    fn counts_mut(&mut self, category: &str) -> &mut UnitCounts {
        self.categories.entry(category.to_string()).or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub summary: BTreeMap<String, UnitCounts>,
    pub issue_counts: BTreeMap<IssueKind, usize>,
    pub issues: Vec<IssueRecord>,
    pub notes: Vec<String>,
}
