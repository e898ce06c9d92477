use super::*;

pub fn run(args: NormalizeArgs, config: &PipelineConfig) -> Result<()> {
    let mut report = RunReport::new("normalize");
    let normalizer = TextNormalizer::new(&config.rules)?;
    let root = chapters_dir(&args.corpus_root);
    let files = discover_json_files(&root)?;

    info!(
        root = %root.display(),
        files = files.len(),
        dry_run = args.dry_run,
        run_id = %report.run_id,
        "starting normalize"
    );

    let mut totals = NormalizeStats::default();
    for path in &files {
        report.processed("chapter_files");

        let mut value = match load_document_value(path) {
            Ok(value) => value,
            Err(err) => {
                report.failed("chapter_files");
                report.record_error(path.display().to_string(), &err);
                continue;
            }
        };

        let mut stats = NormalizeStats::default();
        normalize_value(&normalizer, &mut value, &mut stats);
        totals.absorb(&stats);

        report.fixed("unicode_anomalies", stats.unicode_fixes());
        report.fixed("numeric_prefixes", stats.prefixes_stripped);

        if stats.total_fixes() == 0 {
            continue;
        }

        report.fixed("chapter_files", 1);
        info!(
            path = %path.display(),
            joiner_fixes = stats.joiner_fixes,
            joiner_runs_collapsed = stats.joiner_runs_collapsed,
            prefixes_stripped = stats.prefixes_stripped,
            "normalized chapter document"
        );

        if !args.dry_run {
            write_json_pretty(path, &value)?;
        }
    }

    if args.dry_run {
        report.note("dry run: no chapter documents were rewritten");
    }

    info!(
        strings = totals.strings_visited,
        unicode_fixes = totals.unicode_fixes(),
        prefixes_stripped = totals.prefixes_stripped,
        "normalize completed"
    );

    let manifest_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| report.default_manifest_path(&args.corpus_root));
    report.finish(&manifest_path)?;

    Ok(())
}

pub(crate) fn load_document_value(path: &Path) -> std::result::Result<Value, PipelineError> {
    let raw = fs::read_to_string(path).map_err(|err| PipelineError::malformed(path, err))?;
    let value = serde_json::from_str::<Value>(&raw).map_err(|err| PipelineError::malformed(path, err))?;

    if !value.is_object() {
        warn!(path = %path.display(), "chapter document is not a JSON object");
    }

    Ok(value)
}
