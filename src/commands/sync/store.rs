use super::*;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub key: String,
    pub sql: String,
    pub params: Vec<Cell>,
}

pub(crate) trait Store {
    fn execute(&mut self, sql: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>>;

    fn execute_batch(&mut self, statements: &[Statement]) -> Result<()>;

    fn supports_readback(&self) -> bool;

    fn describe(&self) -> String;
}

pub(crate) struct SqliteStore {
    connection: Connection,
    target: String,
}

impl SqliteStore {
    pub(crate) fn open(path: &Path) -> Result<Self, PipelineError> {
        let target = path.display().to_string();
        let connection = Connection::open(path).map_err(|source| PipelineError::StoreUnavailable {
            target: target.clone(),
            source,
        })?;
        Self::configure(connection, target, true)
    }

    pub(crate) fn open_read_only(path: &Path) -> Result<Self, PipelineError> {
        let target = path.display().to_string();
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| PipelineError::StoreUnavailable {
            target: target.clone(),
            source,
        })?;
        Self::configure(connection, target, false)
    }

    pub(crate) fn open_in_memory() -> Result<Self, PipelineError> {
        let target = ":memory:".to_string();
        let connection =
            Connection::open_in_memory().map_err(|source| PipelineError::StoreUnavailable {
                target: target.clone(),
                source,
            })?;
        Self::configure(connection, target, false)
    }

    fn configure(connection: Connection, target: String, wal: bool) -> Result<Self, PipelineError> {
        let unavailable = |source| PipelineError::StoreUnavailable {
            target: target.clone(),
            source,
        };

        if wal {
            connection
                .pragma_update(None, "journal_mode", "WAL")
                .map_err(unavailable)?;
        }
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .map_err(unavailable)?;
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(unavailable)?;

        Ok(Self { connection, target })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Store for SqliteStore {
    fn execute(&mut self, sql: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>> {
        let mut statement = self
            .connection
            .prepare(sql)
            .with_context(|| format!("failed to prepare statement on {}", self.target))?;
        let column_count = statement.column_count();

        if column_count == 0 {
            statement
                .execute(params_from_iter(params.iter()))
                .with_context(|| format!("failed to execute statement on {}", self.target))?;
            return Ok(Vec::new());
        }

        let mut rows = statement.query(params_from_iter(params.iter()))?;
        let mut output = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for index in 0..column_count {
                cells.push(Cell::from(row.get_ref(index)?));
            }
            output.push(cells);
        }

        Ok(output)
    }

    fn execute_batch(&mut self, statements: &[Statement]) -> Result<()> {
        let tx = self.connection.transaction()?;
        for statement in statements {
            tx.execute(&statement.sql, params_from_iter(statement.params.iter()))
                .with_context(|| format!("write failed for {}", statement.key))?;
        }
        tx.commit()
            .with_context(|| format!("failed to commit batch on {}", self.target))?;
        Ok(())
    }

    fn supports_readback(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.target)
    }
}

pub(crate) struct ScriptStore<W: Write> {
    writer: W,
    statements: usize,
}

impl<W: Write> ScriptStore<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer,
            statements: 0,
        }
    }

    pub(crate) fn statements(&self) -> usize {
        self.statements
    }

    pub(crate) fn into_inner(mut self) -> Result<W> {
        self.writer.flush().context("failed to flush sql script")?;
        Ok(self.writer)
    }

    fn write_statement(&mut self, sql: &str, params: &[Cell]) -> Result<()> {
        writeln!(self.writer, "{};", render_statement(sql, params))
            .context("failed to write sql script")?;
        self.statements += 1;
        Ok(())
    }
}

impl<W: Write> Store for ScriptStore<W> {
    fn execute(&mut self, sql: &str, params: &[Cell]) -> Result<Vec<Vec<Cell>>> {
        let head = sql.trim_start().to_ascii_uppercase();
        if head.starts_with("SELECT") || head.starts_with("PRAGMA") {
            debug!("script store ignores reads");
            return Ok(Vec::new());
        }
        self.write_statement(sql, params)?;
        Ok(Vec::new())
    }

    fn execute_batch(&mut self, statements: &[Statement]) -> Result<()> {
        writeln!(self.writer, "BEGIN;").context("failed to write sql script")?;
        for statement in statements {
            self.write_statement(&statement.sql, &statement.params)?;
        }
        writeln!(self.writer, "COMMIT;").context("failed to write sql script")?;
        Ok(())
    }

    fn supports_readback(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "sql-script".to_string()
    }
}

/// Inlines `?N` (and bare `?`) placeholders as literals. The statement text is
/// collapsed onto one line; literal values keep their own newlines.
pub(crate) fn render_statement(sql: &str, params: &[Cell]) -> String {
    let template = sql.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_positional = 0usize;

    while let Some(ch) = chars.next() {
        if ch != '?' {
            rendered.push(ch);
            continue;
        }

        let mut digits = String::new();
        while let Some(digit) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(digit);
            chars.next();
        }

        let index = match digits.parse::<usize>() {
            Ok(number) => number.saturating_sub(1),
            Err(_) => next_positional,
        };
        next_positional = index + 1;

        match params.get(index) {
            Some(cell) => rendered.push_str(&cell.to_sql_literal()),
            None => rendered.push_str("NULL"),
        }
    }

    rendered
}
