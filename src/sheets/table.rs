use comfy_table::{presets, Table as TextTable};
use serde::Serialize;

/// Tabular sheet data. Cells are `None` when the source value is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Borrowed view of a single table row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    cells: &'a [Option<String>],
}

impl Table {
    /// Build a table, padding short rows with missing cells and dropping
    /// cells beyond the last column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Parse CSV text with a header line. Empty fields become missing cells.
    pub fn from_csv(content: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            None
                        } else {
                            Some(field.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(Self::new(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }

    /// Position of `name`, compared case-insensitively after trimming
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_uppercase();
        self.columns
            .iter()
            .position(|column| column.trim().to_uppercase() == wanted)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// New table holding the rows accepted by `keep`
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| row.cells.to_vec())
            .collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Projection onto `names`. Columns absent from the table are skipped.
    pub fn select(&self, names: &[&str]) -> Table {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Copy with every column name and cell passed through the given functions
    pub(crate) fn map(
        &self,
        column: impl Fn(&str) -> String,
        cell: impl Fn(&Option<String>) -> Option<String>,
    ) -> Table {
        Table {
            columns: self.columns.iter().map(|c| column(c)).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&cell).collect())
                .collect(),
        }
    }

    /// Copy with `name` set from `derive`, replacing an existing column of
    /// that name or appending a new one.
    pub(crate) fn with_column(
        &self,
        name: &str,
        derive: impl Fn(&Row<'_>) -> Option<String>,
    ) -> Table {
        let values: Vec<Option<String>> = self.rows().map(|row| derive(&row)).collect();
        let mut table = self.clone();

        let index = match table.column_index(name) {
            Some(index) => index,
            None => {
                table.columns.push(name.to_string());
                for row in &mut table.rows {
                    row.push(None);
                }
                table.columns.len() - 1
            }
        };

        for (row, value) in table.rows.iter_mut().zip(values) {
            row[index] = value;
        }

        table
    }

    /// Render as aligned plain text, one line per row, missing cells blank
    pub fn to_plain_text(&self) -> String {
        let mut text = TextTable::new();
        text.load_preset(presets::NOTHING);
        text.set_header(self.columns.clone());

        for row in &self.rows {
            text.add_row(
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_default())
                    .collect::<Vec<_>>(),
            );
        }

        text.to_string()
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> Row<'a> {
    /// Cell value of `column`; `None` when the column is absent or the cell is missing
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.table.column_index(column)?;
        self.cells.get(index)?.as_deref()
    }

    pub fn cells(&self) -> &'a [Option<String>] {
        self.cells
    }
}
