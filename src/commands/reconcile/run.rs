use super::*;

pub fn run(args: ReconcileArgs) -> Result<()> {
    let mut report = RunReport::new("reconcile");
    let root = chapters_dir(&args.corpus_root);
    let files = discover_json_files(&root)?;

    info!(
        root = %root.display(),
        files = files.len(),
        dry_run = args.dry_run,
        run_id = %report.run_id,
        "starting reconcile"
    );

    for path in &files {
        report.processed("chapters");

        let mut chapter = match Chapter::load(path) {
            Ok(chapter) => chapter,
            Err(err) => {
                report.failed("chapters");
                report.record_error(path.display().to_string(), &err);
                continue;
            }
        };

        let book = book_for_chapter_path(path);
        let backup = (!args.dry_run)
            .then(|| backup_path(&args.corpus_root, &report.run_id, &book, &chapter.id));
        let outcome = reconcile_chapter(&mut chapter, backup.as_deref())?;
        record_outcome(&mut report, &chapter.id, &outcome);

        if !outcome.changed() {
            continue;
        }

        report.fixed("chapters", 1);
        if !args.dry_run {
            write_json_pretty(path, &chapter)?;
            info!(chapter_id = %chapter.id, path = %path.display(), "rewrote reconciled chapter");
        }
    }

    if args.dry_run {
        report.note("dry run: no chapter documents or backups were written");
    }

    let manifest_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| report.default_manifest_path(&args.corpus_root));
    report.finish(&manifest_path)?;

    Ok(())
}
