use super::*;

const UPSERT_CHAPTER_SQL: &str = "
    INSERT INTO chapters(
      id, title_pali, title_english, title_sinhala, footer_pali, footer_english, footer_sinhala
    )
    VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
      title_pali=excluded.title_pali,
      title_english=excluded.title_english,
      title_sinhala=excluded.title_sinhala,
      footer_pali=excluded.footer_pali,
      footer_english=excluded.footer_english,
      footer_sinhala=excluded.footer_sinhala
    ";

const UPSERT_SECTION_SQL: &str = "
    INSERT INTO sections(
      chapter_id, section_number, number_range, vagga, vagga_english, vagga_sinhala,
      pali_title, english_title, sinhala_title, pali, english, sinhala
    )
    VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(chapter_id, section_number) DO UPDATE SET
      number_range=excluded.number_range,
      vagga=excluded.vagga,
      vagga_english=excluded.vagga_english,
      vagga_sinhala=excluded.vagga_sinhala,
      pali_title=excluded.pali_title,
      english_title=excluded.english_title,
      sinhala_title=excluded.sinhala_title,
      pali=excluded.pali,
      english=excluded.english,
      sinhala=excluded.sinhala
    ";

const SELECT_CHAPTER_SQL: &str = "
    SELECT title_pali, title_english, title_sinhala, footer_pali, footer_english, footer_sinhala
    FROM chapters
    WHERE id = ?1
    ";

const SELECT_SECTIONS_SQL: &str = "
    SELECT section_number, number_range, vagga, vagga_english, vagga_sinhala,
           pali_title, english_title, sinhala_title, pali, english, sinhala
    FROM sections
    WHERE chapter_id = ?1
    ORDER BY section_number
    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncOptions {
    pub batch_size: usize,
    pub verify: VerifyMode,
    pub verify_sample: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StoreSnapshot {
    pub chapter: Option<ChapterProjection>,
    pub sections: BTreeMap<u32, SectionProjection>,
}

pub(crate) fn section_key(chapter_id: &str, number: u32) -> String {
    format!("{chapter_id}#{number}")
}

pub(crate) fn load_snapshot(store: &mut dyn Store, chapter_id: &str) -> Result<StoreSnapshot> {
    let id = [Cell::from(chapter_id)];

    let chapter = store
        .execute(SELECT_CHAPTER_SQL, &id)
        .with_context(|| format!("failed to read chapter row {chapter_id}"))?
        .first()
        .map(|row| ChapterProjection::from_row(row));

    let mut sections = BTreeMap::new();
    for row in store
        .execute(SELECT_SECTIONS_SQL, &id)
        .with_context(|| format!("failed to read section rows of {chapter_id}"))?
    {
        let Some(number) = row.first().and_then(Cell::as_u32) else {
            warn!(chapter_id = %chapter_id, "skipping stored section with unreadable number");
            continue;
        };
        sections.insert(number, SectionProjection::from_row(&row[1..]));
    }

    Ok(StoreSnapshot { chapter, sections })
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SyncState {
    fingerprints: HashMap<(String, u32), String>,
}

impl SyncState {
    pub(crate) fn from_snapshot(chapter_id: &str, snapshot: &StoreSnapshot) -> Self {
        Self {
            fingerprints: snapshot
                .sections
                .iter()
                .map(|(number, projection)| {
                    ((chapter_id.to_string(), *number), projection.fingerprint())
                })
                .collect(),
        }
    }

    pub(crate) fn is_current(&self, chapter_id: &str, number: u32, fingerprint: &str) -> bool {
        self.fingerprints
            .get(&(chapter_id.to_string(), number))
            .is_some_and(|stored| stored == fingerprint)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChapterSyncOutcome {
    pub chapter_written: bool,
    pub sections_written: usize,
    pub sections_unchanged: usize,
    pub failures: Vec<PipelineError>,
    pub orphans: Vec<u32>,
    pub mismatches: Vec<Mismatch>,
    pub verified: usize,
}

pub(crate) struct ConsistencyReconciler<'s> {
    store: &'s mut dyn Store,
    options: SyncOptions,
}

impl<'s> ConsistencyReconciler<'s> {
    pub(crate) fn new(store: &'s mut dyn Store, options: SyncOptions) -> Self {
        Self { store, options }
    }

    pub(crate) fn sync_chapter(&mut self, chapter: &Chapter) -> Result<ChapterSyncOutcome> {
        let mut outcome = ChapterSyncOutcome::default();
        let readback = self.store.supports_readback();
        let snapshot = if readback {
            load_snapshot(self.store, &chapter.id)?
        } else {
            StoreSnapshot::default()
        };
        let state = SyncState::from_snapshot(&chapter.id, &snapshot);

        let mut statements = Vec::new();
        let chapter_projection = ChapterProjection::from_chapter(chapter);
        if snapshot.chapter.as_ref() != Some(&chapter_projection) {
            let mut params = vec![Cell::from(chapter.id.as_str())];
            params.extend(chapter_projection.cells());
            statements.push(Statement {
                key: chapter.id.clone(),
                sql: UPSERT_CHAPTER_SQL.to_string(),
                params,
            });
        }

        let mut queued = BTreeSet::new();
        for section in &chapter.sections {
            if !queued.insert(section.number) {
                warn!(
                    chapter_id = %chapter.id,
                    number = section.number,
                    "section number appears twice; only the first is synced"
                );
                continue;
            }

            let projection = SectionProjection::from_section(section);
            if state.is_current(&chapter.id, section.number, &projection.fingerprint()) {
                outcome.sections_unchanged += 1;
                continue;
            }

            let mut params = vec![Cell::from(chapter.id.as_str()), Cell::from(section.number)];
            params.extend(projection.cells());
            statements.push(Statement {
                key: section_key(&chapter.id, section.number),
                sql: UPSERT_SECTION_SQL.to_string(),
                params,
            });
        }

        outcome.orphans = snapshot
            .sections
            .keys()
            .filter(|number| !queued.contains(*number))
            .copied()
            .collect();

        let failed_keys = self.write(&statements, &mut outcome.failures);
        for statement in &statements {
            if failed_keys.contains(&statement.key) {
                continue;
            }
            if statement.sql == UPSERT_CHAPTER_SQL {
                outcome.chapter_written = true;
            } else {
                outcome.sections_written += 1;
            }
        }

        if readback && self.options.verify != VerifyMode::Off {
            let written = statements
                .iter()
                .filter(|statement| statement.sql == UPSERT_SECTION_SQL)
                .filter(|statement| !failed_keys.contains(&statement.key))
                .filter_map(|statement| statement.params.get(1).and_then(Cell::as_u32))
                .collect::<Vec<u32>>();
            let targets = match self.options.verify {
                VerifyMode::Sample => sample_keys(&written, self.options.verify_sample),
                _ => written,
            };

            let verification = verify_sections(self.store, chapter, &targets)?;
            outcome.verified = verification.checked;
            outcome.mismatches = verification.mismatches;
        }

        Ok(outcome)
    }

    pub(crate) fn check_drift(&mut self, chapter: &Chapter) -> Result<ChapterSyncOutcome> {
        let numbers = chapter
            .sections
            .iter()
            .map(|section| section.number)
            .collect::<Vec<u32>>();
        let verification = verify_sections(self.store, chapter, &numbers)?;

        let known = numbers.iter().copied().collect::<BTreeSet<u32>>();
        Ok(ChapterSyncOutcome {
            orphans: verification
                .stored_numbers
                .iter()
                .filter(|number| !known.contains(*number))
                .copied()
                .collect(),
            verified: verification.checked,
            mismatches: verification.mismatches,
            ..ChapterSyncOutcome::default()
        })
    }

    fn write(
        &mut self,
        statements: &[Statement],
        failures: &mut Vec<PipelineError>,
    ) -> BTreeSet<String> {
        let mut failed_keys = BTreeSet::new();

        for batch in statements.chunks(self.options.batch_size.max(1)) {
            let Err(err) = self.store.execute_batch(batch) else {
                debug!(statements = batch.len(), "committed batch");
                continue;
            };

            warn!(
                statements = batch.len(),
                error = %format!("{err:#}"),
                "batch failed; retrying statements individually"
            );
            for statement in batch {
                if let Err(err) = self.store.execute_batch(std::slice::from_ref(statement)) {
                    failed_keys.insert(statement.key.clone());
                    failures.push(PipelineError::SectionWriteFailed {
                        key: statement.key.clone(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        failed_keys
    }
}
