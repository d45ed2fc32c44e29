use std::collections::HashSet;

/// Text table of map features. Missing values are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TagTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Append a row given as (column, value) pairs. Columns not named stay missing, unknown columns are
    /// ignored.
    pub fn push_row<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, String)>) {
        let mut row = vec![None; self.columns.len()];
        for (column, value) in values {
            if let Some(index) = self.column_index(column) {
                row[index] = Some(value);
            }
        }
        self.rows.push(row);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Share of missing values in a column. An empty table counts as fully missing.
    pub fn missing_fraction(&self, column: &str) -> f64 {
        let Some(index) = self.column_index(column) else {
            return 1.0;
        };
        if self.rows.is_empty() {
            return 1.0;
        }
        let missing = self.rows.iter().filter(|row| row[index].is_none()).count();
        missing as f64 / self.rows.len() as f64
    }

    /// Number of distinct values in a column, missing counting as one value.
    pub fn distinct_count(&self, column: &str) -> usize {
        let Some(index) = self.column_index(column) else {
            return 0;
        };
        self.rows
            .iter()
            .map(|row| row[index].as_deref())
            .collect::<HashSet<Option<&str>>>()
            .len()
    }

    /// Keep only the named columns, in the table's own order.
    pub fn retain_columns(&mut self, keep: impl Fn(&str) -> bool) {
        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|index| keep(&self.columns[*index]))
            .collect();
        self.columns = kept.iter().map(|index| self.columns[*index].clone()).collect();
        for row in self.rows.iter_mut() {
            let kept_values: Vec<Option<String>> = kept.iter().map(|index| row[*index].take()).collect();
            *row = kept_values;
        }
    }

    pub fn retain_rows(&mut self, keep: impl Fn(&TagTable, usize) -> bool) {
        let kept: Vec<bool> = (0..self.rows.len()).map(|row| keep(self, row)).collect();
        let mut flags = kept.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(false));
    }

    /// Append a column computed from each row.
    pub fn add_column(&mut self, name: &str, value: impl Fn(&TagTable, usize) -> Option<String>) {
        let values: Vec<Option<String>> = (0..self.rows.len()).map(|row| value(self, row)).collect();
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}
