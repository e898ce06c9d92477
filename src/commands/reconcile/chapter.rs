use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ReconcileOutcome {
    pub removed: Vec<RemovedSection>,
    pub ranges_derived: usize,
    pub gaps: Vec<NumberRange>,
    pub vaggas_cleared: usize,
    pub backup: Option<PathBuf>,
}

impl ReconcileOutcome {
    pub(crate) fn changed(&self) -> bool {
        !self.removed.is_empty() || self.ranges_derived > 0 || self.vaggas_cleared > 0
    }
}

pub(crate) fn backup_path(corpus_root: &Path, run_id: &str, book: &str, chapter_id: &str) -> PathBuf {
    corpus_root
        .join("backups")
        .join(run_id)
        .join(book)
        .join(format!("{chapter_id}.json"))
}

pub(crate) fn reconcile_chapter(
    chapter: &mut Chapter,
    backup: Option<&Path>,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    if has_duplicates(&chapter.sections) {
        if let Some(path) = backup {
            write_json_pretty(path, &*chapter)?;
            info!(chapter_id = %chapter.id, path = %path.display(), "wrote pre-removal backup");
            outcome.backup = Some(path.to_path_buf());
        }

        outcome.removed = remove_duplicates(&mut chapter.sections);
        for removed in &outcome.removed {
            info!(
                chapter_id = %chapter.id,
                number = removed.number,
                title = %removed.title,
                "removed duplicate section"
            );
        }
    }

    outcome.ranges_derived = derive_ranges(&mut chapter.sections);
    outcome.gaps = find_gaps(&chapter.sections);
    outcome.vaggas_cleared = dedup_vaggas(&mut chapter.sections);

    Ok(outcome)
}

pub(crate) fn record_outcome(report: &mut RunReport, chapter_id: &str, outcome: &ReconcileOutcome) {
    for removed in &outcome.removed {
        report.record(
            IssueKind::DuplicateSectionNumber,
            chapter_id,
            format!("removed duplicate section {} ({})", removed.number, removed.title),
        );
    }
    for gap in &outcome.gaps {
        let detail = if gap.start == gap.end {
            format!("section {} missing", gap.start)
        } else {
            format!("sections {gap} missing")
        };
        report.record(IssueKind::StructuralGap, chapter_id, detail);
    }

    report.fixed("duplicate_sections", outcome.removed.len());
    report.fixed("number_ranges", outcome.ranges_derived);
    report.fixed("vaggas", outcome.vaggas_cleared);
}
