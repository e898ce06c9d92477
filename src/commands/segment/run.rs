use super::*;

pub fn run(args: SegmentArgs, config: &PipelineConfig) -> Result<()> {
    let mut report = RunReport::new("segment");
    let normalizer = TextNormalizer::new(&config.rules)?;
    let classifier = LineClassifier::new(&normalizer)?;
    let books_root = args.corpus_root.join("books");
    let manifests = discover_json_files(&books_root)?;

    info!(
        root = %books_root.display(),
        manifests = manifests.len(),
        run_id = %report.run_id,
        "starting segment"
    );
    if manifests.is_empty() {
        warn!(root = %books_root.display(), "no book manifests found");
    }

    let mut seen_ids = HashSet::<String>::new();
    for path in &manifests {
        report.processed("books");

        let manifest = match load_book_manifest(path) {
            Ok(manifest) => manifest,
            Err(err) => {
                report.failed("books");
                report.record_error(path.display().to_string(), &err);
                continue;
            }
        };

        if !args.books.is_empty() && !args.books.contains(&manifest.book) {
            report.skipped("books");
            continue;
        }

        let texts = match load_book_texts(&args.corpus_root, &manifest, &mut report) {
            Ok(texts) => texts,
            Err(err) => {
                report.failed("books");
                report.record_error(manifest.book.clone(), &err);
                continue;
            }
        };

        info!(
            collection = %manifest.collection,
            book = %manifest.book,
            chapters = manifest.chapters.len(),
            "segmenting book"
        );

        for (position, entry) in manifest.chapters.iter().enumerate() {
            report.processed("chapters");
            let next = manifest.chapters.get(position + 1);

            let segmented = match segment_chapter(
                &classifier,
                &texts,
                &manifest.book,
                entry,
                next,
                position,
                &config.segmenter,
            ) {
                Ok(segmented) => segmented,
                Err(err) => {
                    report.failed("chapters");
                    report.record_error(format!("{}#{}", manifest.book, entry.marker.pali), &err);
                    continue;
                }
            };

            let SegmentedChapter {
                mut chapter,
                issues,
                ignored_lines,
            } = segmented;

            if !seen_ids.insert(chapter.id.clone()) {
                report.skipped("chapters");
                report.record(
                    IssueKind::DuplicateChapterId,
                    chapter.id.clone(),
                    format!(
                        "chapter marker '{}' derives an id already used in this run",
                        entry.marker.pali
                    ),
                );
                continue;
            }

            for (kind, detail) in issues {
                report.record(kind, chapter.id.clone(), detail);
            }
            if ignored_lines > 0 {
                warn!(
                    chapter_id = %chapter.id,
                    ignored_lines,
                    "lines outside any section were ignored"
                );
            }

            let backup =
                backup_path(&args.corpus_root, &report.run_id, &manifest.book, &chapter.id);
            let outcome = reconcile_chapter(&mut chapter, Some(&backup))?;
            record_outcome(&mut report, &chapter.id, &outcome);

            let stats = normalize_chapter(&normalizer, &mut chapter)?;
            report.fixed("unicode_anomalies", stats.unicode_fixes());
            report.fixed("numeric_prefixes", stats.prefixes_stripped);

            let output = chapter_path(&args.corpus_root, &manifest.book, &chapter.id);
            write_json_pretty(&output, &chapter)?;
            report.fixed("chapters", 1);

            info!(
                chapter_id = %chapter.id,
                sections = chapter.sections.len(),
                path = %output.display(),
                "wrote chapter document"
            );
        }
    }

    let manifest_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| report.default_manifest_path(&args.corpus_root));
    report.finish(&manifest_path)?;

    Ok(())
}

pub(crate) fn load_book_manifest(path: &Path) -> Result<BookManifest, PipelineError> {
    let raw = fs::read_to_string(path).map_err(|err| PipelineError::malformed(path, err))?;
    let manifest: BookManifest =
        serde_json::from_str(&raw).map_err(|err| PipelineError::malformed(path, err))?;

    if manifest.book.trim().is_empty() {
        return Err(PipelineError::malformed(path, "book slug is empty"));
    }
    if manifest.chapters.is_empty() {
        warn!(path = %path.display(), book = %manifest.book, "book manifest lists no chapters");
    }

    Ok(manifest)
}

fn load_book_texts(
    corpus_root: &Path,
    manifest: &BookManifest,
    report: &mut RunReport,
) -> Result<BookTexts, PipelineError> {
    let read = |relative: &Path| {
        let path = corpus_root.join(relative);
        fs::read_to_string(&path).map_err(|err| PipelineError::malformed(path, err))
    };

    let mut texts = BookTexts {
        pali: read(manifest.sources.pali.as_path())?,
        ..BookTexts::default()
    };

    for language in [Language::English, Language::Sinhala] {
        let Some(relative) = manifest.sources.get(language) else {
            continue;
        };
        match read(relative.as_path()) {
            Ok(text) => match language {
                Language::English => texts.english = Some(text),
                Language::Sinhala => texts.sinhala = Some(text),
                Language::Pali => {}
            },
            Err(err) => report.record_error(manifest.book.clone(), &err),
        }
    }

    Ok(texts)
}
