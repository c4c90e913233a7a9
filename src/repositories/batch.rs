use sqlx::query_builder::Separated;
use sqlx::{PgConnection, Postgres, QueryBuilder};

/// Postgres rejects statements with more bind parameters than this.
pub(crate) const MAX_BIND_PARAMS: usize = 65_535;

/// Multi-row `INSERT` for one table, split into as many statements as the
/// bind-parameter limit requires.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchInsert {
    table: &'static str,
    columns: &'static [&'static str],
    max_params: usize,
}

impl BatchInsert {
    pub(crate) const fn new(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self { table, columns, max_params: MAX_BIND_PARAMS }
    }

    #[cfg(test)]
    pub(crate) const fn with_param_limit(mut self, max_params: usize) -> Self {
        self.max_params = max_params;
        self
    }

    pub(crate) fn rows_per_statement(&self) -> usize {
        (self.max_params / self.columns.len().max(1)).max(1)
    }

    /// One builder per chunk. `bind` must push exactly one value per column.
    /// Empty input yields no statements.
    pub(crate) fn statements<'args, T>(
        &self,
        rows: &'args [T],
        mut bind: impl FnMut(Separated<'_, 'args, Postgres, &'static str>, &'args T),
    ) -> Vec<QueryBuilder<'args, Postgres>> {
        rows.chunks(self.rows_per_statement())
            .map(|chunk| {
                let mut builder = QueryBuilder::<Postgres>::new(format!(
                    "INSERT INTO {} ({}) ",
                    self.table,
                    self.columns.join(", ")
                ));
                builder.push_values(chunk, &mut bind);
                builder
            })
            .collect()
    }

    pub(crate) async fn execute<'args, T>(
        &self,
        conn: &mut PgConnection,
        rows: &'args [T],
        bind: impl FnMut(Separated<'_, 'args, Postgres, &'static str>, &'args T),
    ) -> Result<u64, sqlx::Error> {
        let mut written = 0;
        for mut builder in self.statements(rows, bind) {
            written += builder.build().execute(&mut *conn).await?.rows_affected();
        }
        Ok(written)
    }
}
