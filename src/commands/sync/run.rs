use super::*;

pub(crate) const DEFAULT_DB_FILENAME: &str = "canon.sqlite";

pub(crate) fn default_db_path(corpus_root: &Path) -> PathBuf {
    corpus_root.join(DEFAULT_DB_FILENAME)
}

pub fn run(args: SyncArgs, config: &PipelineConfig) -> Result<()> {
    let options = resolve_options(&args, &config.sync)?;
    if args.verify_only && args.emit_sql.is_some() {
        bail!("--verify-only reads the store and cannot be combined with --emit-sql");
    }

    let mut report = RunReport::new("sync");
    let manifest_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| report.default_manifest_path(&args.corpus_root));
    let root = chapters_dir(&args.corpus_root);
    let files = discover_json_files(&root)?;

    info!(
        root = %root.display(),
        files = files.len(),
        batch_size = options.batch_size,
        verify = options.verify.as_str(),
        verify_only = args.verify_only,
        run_id = %report.run_id,
        "starting sync"
    );

    let chapters = load_chapters(&files, &mut report);

    if let Some(script_path) = &args.emit_sql {
        if let Some(parent) = script_path.parent() {
            ensure_directory(parent)?;
        }
        let file = File::create(script_path)
            .with_context(|| format!("failed to create sql script: {}", script_path.display()))?;

        let mut store = ScriptStore::new(BufWriter::new(file));
        ensure_schema(&mut store)?;
        sync_chapters(&mut store, &chapters, options, false, &mut report)?;
        let statements = store.statements();
        store.into_inner()?;

        info!(path = %script_path.display(), statements, "wrote sql script");
        report.note(format!(
            "emitted {statements} statements to {}; verification skipped",
            script_path.display()
        ));
        report.finish(&manifest_path)?;
        return Ok(());
    }

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.corpus_root));
    let opened = if args.verify_only {
        SqliteStore::open_read_only(&db_path)
    } else {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }
        SqliteStore::open(&db_path)
    };
    let mut store = match opened {
        Ok(store) => store,
        Err(err) => {
            report.record_error(db_path.display().to_string(), &err);
            report.finish(&manifest_path)?;
            return Err(anyhow::Error::new(err).context("sync aborted"));
        }
    };

    if args.verify_only {
        report.note("verify only: no statements were written");
    } else {
        ensure_schema(&mut store)?;
    }
    sync_chapters(&mut store, &chapters, options, args.verify_only, &mut report)?;

    report.finish(&manifest_path)?;
    Ok(())
}

pub(crate) fn resolve_options(args: &SyncArgs, config: &SyncConfig) -> Result<SyncOptions> {
    let options = SyncOptions {
        batch_size: args.batch_size.unwrap_or(config.batch_size),
        verify: args.verify.unwrap_or(config.verify),
        verify_sample: args.verify_sample.unwrap_or(config.verify_sample),
    };
    if options.batch_size == 0 {
        bail!("batch size must be at least 1");
    }
    Ok(options)
}

fn load_chapters(files: &[PathBuf], report: &mut RunReport) -> Vec<Chapter> {
    let mut chapters = Vec::with_capacity(files.len());
    for path in files {
        match Chapter::load(path) {
            Ok(chapter) => chapters.push(chapter),
            Err(err) => {
                report.processed("chapters");
                report.failed("chapters");
                report.record_error(path.display().to_string(), &err);
            }
        }
    }
    chapters
}

pub(crate) fn sync_chapters(
    store: &mut dyn Store,
    chapters: &[Chapter],
    options: SyncOptions,
    verify_only: bool,
    report: &mut RunReport,
) -> Result<()> {
    let target = store.describe();
    let mut reconciler = ConsistencyReconciler::new(store, options);

    for chapter in chapters {
        report.processed("chapters");
        let result = if verify_only {
            reconciler.check_drift(chapter)
        } else {
            reconciler.sync_chapter(chapter)
        };
        let outcome =
            result.with_context(|| format!("failed to sync chapter {} to {target}", chapter.id))?;

        info!(
            chapter_id = %chapter.id,
            sections = chapter.sections.len(),
            written = outcome.sections_written,
            unchanged = outcome.sections_unchanged,
            failed = outcome.failures.len(),
            orphans = outcome.orphans.len(),
            verified = outcome.verified,
            mismatches = outcome.mismatches.len(),
            "synced chapter"
        );
        record_sync_outcome(report, chapter, &outcome);
    }

    Ok(())
}

pub(crate) fn record_sync_outcome(
    report: &mut RunReport,
    chapter: &Chapter,
    outcome: &ChapterSyncOutcome,
) {
    for _ in &chapter.sections {
        report.processed("sections");
    }
    report.fixed("sections", outcome.sections_written);
    for _ in 0..outcome.sections_unchanged {
        report.skipped("sections");
    }
    for failure in &outcome.failures {
        report.failed("sections");
        let unit = match failure {
            PipelineError::SectionWriteFailed { key, .. } => key.clone(),
            _ => chapter.id.clone(),
        };
        report.record_error(unit, failure);
    }

    for number in &outcome.orphans {
        report.record(
            IssueKind::OrphanRow,
            section_key(&chapter.id, *number),
            "stored row has no counterpart in the document; left in place",
        );
    }
    for mismatch in &outcome.mismatches {
        report.record(IssueKind::SyncMismatch, mismatch.key.clone(), mismatch.describe());
    }

    if outcome.chapter_written || outcome.sections_written > 0 {
        report.fixed("chapters", 1);
    }
    if !outcome.failures.is_empty() || !outcome.mismatches.is_empty() {
        report.failed("chapters");
    }
}
