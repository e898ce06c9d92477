use super::*;

pub(crate) const DB_SCHEMA_VERSION: &str = "1";

/// Columns added after the first store layout; older stores gain them on open.
const MIGRATED_COLUMNS: &[(&str, &str)] = &[
    ("chapters", "footer_pali TEXT"),
    ("chapters", "footer_english TEXT"),
    ("chapters", "footer_sinhala TEXT"),
    ("sections", "number_range TEXT"),
    ("sections", "vagga TEXT"),
    ("sections", "vagga_english TEXT"),
    ("sections", "vagga_sinhala TEXT"),
    ("sections", "pali_title TEXT"),
    ("sections", "english_title TEXT"),
    ("sections", "sinhala_title TEXT"),
];

const TABLES_SQL: &[&str] = &[
    "
    CREATE TABLE IF NOT EXISTS metadata (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS chapters (
      id TEXT PRIMARY KEY,
      title_pali TEXT,
      title_english TEXT,
      title_sinhala TEXT,
      footer_pali TEXT,
      footer_english TEXT,
      footer_sinhala TEXT
    )
    ",
    "
    CREATE TABLE IF NOT EXISTS sections (
      chapter_id TEXT NOT NULL,
      section_number INTEGER NOT NULL,
      number_range TEXT,
      vagga TEXT,
      vagga_english TEXT,
      vagga_sinhala TEXT,
      pali_title TEXT,
      english_title TEXT,
      sinhala_title TEXT,
      pali TEXT,
      english TEXT,
      sinhala TEXT,
      FOREIGN KEY(chapter_id) REFERENCES chapters(id)
    )
    ",
];

const SECTION_KEY_INDEX_SQL: &str = "
    CREATE UNIQUE INDEX IF NOT EXISTS idx_sections_chapter_number
    ON sections(chapter_id, section_number)
    ";

fn schema_statement(key: &str, sql: &str, params: Vec<Cell>) -> Statement {
    Statement {
        key: key.to_string(),
        sql: sql.to_string(),
        params,
    }
}

pub(crate) fn ensure_schema(store: &mut dyn Store) -> Result<()> {
    let tables = TABLES_SQL
        .iter()
        .map(|sql| schema_statement("schema", sql, Vec::new()))
        .collect::<Vec<Statement>>();
    store
        .execute_batch(&tables)
        .with_context(|| format!("failed to create tables on {}", store.describe()))?;

    if store.supports_readback() {
        for (table_name, column_definition) in MIGRATED_COLUMNS {
            ensure_column_exists(store, table_name, column_definition)?;
        }
        ensure_unique_section_keys(store)?;
    }

    let now = now_utc_string();
    let finishing = vec![
        schema_statement("schema", SECTION_KEY_INDEX_SQL, Vec::new()),
        schema_statement(
            "metadata",
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            vec![Cell::from(DB_SCHEMA_VERSION)],
        ),
        schema_statement(
            "metadata",
            "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            vec![Cell::from(now.as_str())],
        ),
    ];
    store
        .execute_batch(&finishing)
        .context("failed to create section key index")?;

    Ok(())
}

fn ensure_column_exists(
    store: &mut dyn Store,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let columns = store
        .execute(&pragma_sql, &[])
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;
    if columns
        .iter()
        .any(|row| row.get(1).and_then(Cell::as_text).as_deref() == Some(column_name))
    {
        return Ok(());
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    store
        .execute(&alter_sql, &[])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;
    info!(table = table_name, column = column_name, "migrated store column");

    Ok(())
}

fn ensure_unique_section_keys(store: &mut dyn Store) -> Result<()> {
    let duplicates = store.execute(
        "
        SELECT chapter_id, section_number, COUNT(*)
        FROM sections
        GROUP BY chapter_id, section_number
        HAVING COUNT(*) > 1
        ORDER BY chapter_id, section_number
        ",
        &[],
    )?;

    if duplicates.is_empty() {
        return Ok(());
    }

    let examples = duplicates
        .iter()
        .take(5)
        .map(|row| {
            format!(
                "{}#{} ({} rows)",
                row.first().and_then(Cell::as_text).unwrap_or_default(),
                row.get(1).and_then(Cell::as_text).unwrap_or_default(),
                row.get(2).and_then(Cell::as_i64).unwrap_or_default()
            )
        })
        .collect::<Vec<String>>();
    bail!(
        "cannot create unique index idx_sections_chapter_number: {} duplicate (chapter_id, section_number) keys already stored, e.g. {}",
        duplicates.len(),
        examples.join(", ")
    );
}
