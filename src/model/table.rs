//! Table types.

use serde::{Deserialize, Serialize};

/// Cell data of a table as reported by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    /// Number of rows in the grid
    pub num_rows: usize,

    /// Number of columns in the grid
    pub num_cols: usize,

    /// Cells; spanning cells appear once at their top-left position
    pub cells: Vec<TableCell>,
}

impl TableData {
    /// Create an empty table of the given size.
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            cells: Vec::new(),
        }
    }

    /// Build a table from rows of text; the first row is marked as header.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                table.cells.push(TableCell {
                    column_header: row == 0,
                    ..TableCell::text(row, col, value)
                });
                table.num_cols = table.num_cols.max(col + 1);
            }
            table.num_rows = row + 1;
        }
        table
    }

    /// Add a cell.
    pub fn add_cell(&mut self, cell: TableCell) {
        self.num_rows = self.num_rows.max(cell.row.saturating_add(cell.row_span.max(1)));
        self.num_cols = self.num_cols.max(cell.col.saturating_add(cell.col_span.max(1)));
        self.cells.push(cell);
    }

    /// Check if the table has no cell text.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.text.trim().is_empty())
    }

    /// Dense `num_rows x num_cols` grid of cell text.
    ///
    /// Spanning cells are repeated across every position they cover.
    pub fn grid(&self) -> Vec<Vec<String>> {
        let mut grid = vec![vec![String::new(); self.num_cols]; self.num_rows];
        for cell in &self.cells {
            let row_end = cell.row.saturating_add(cell.row_span.max(1)).min(self.num_rows);
            let col_end = cell.col.saturating_add(cell.col_span.max(1)).min(self.num_cols);
            for row in grid.iter_mut().take(row_end).skip(cell.row) {
                for slot in row.iter_mut().take(col_end).skip(cell.col) {
                    *slot = cell.text.clone();
                }
            }
        }
        grid
    }

    /// Number of leading rows made up entirely of column headers.
    pub fn header_rows(&self) -> usize {
        (0..self.num_rows)
            .take_while(|&row| {
                let mut in_row = self.cells.iter().filter(|c| c.row == row).peekable();
                in_row.peek().is_some() && in_row.all(|c| c.column_header)
            })
            .count()
    }

    /// Render the grid as a GitHub-flavored Markdown table.
    ///
    /// The first row is always used as the header line since Markdown tables
    /// require one.
    pub fn to_markdown(&self) -> String {
        let grid = self.grid();
        if grid.is_empty() || self.num_cols == 0 {
            return String::new();
        }

        let mut out = String::new();
        for (i, row) in grid.iter().enumerate() {
            out.push('|');
            for cell in row {
                out.push(' ');
                out.push_str(&escape_cell(cell));
                out.push_str(" |");
            }
            out.push('\n');

            if i == 0 {
                out.push('|');
                for _ in 0..self.num_cols {
                    out.push_str(" --- |");
                }
                out.push('\n');
            }
        }
        out.pop();
        out
    }

    /// Tab-separated plain text, one line per row.
    pub fn plain_text(&self) -> String {
        self.grid()
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text
    pub text: String,

    /// 0-based start row
    pub row: usize,

    /// 0-based start column
    pub col: usize,

    /// Number of rows this cell spans
    pub row_span: usize,

    /// Number of columns this cell spans
    pub col_span: usize,

    /// Whether the loader marked this cell as a column header
    pub column_header: bool,
}

impl TableCell {
    /// Create a 1x1 cell at `(row, col)`.
    pub fn text(row: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            row,
            col,
            row_span: 1,
            col_span: 1,
            column_header: false,
        }
    }

    /// Set the column span and return self.
    pub fn col_span(mut self, span: usize) -> Self {
        self.col_span = span;
        self
    }

    /// Set the row span and return self.
    pub fn row_span(mut self, span: usize) -> Self {
        self.row_span = span;
        self
    }

    /// Mark as column header and return self.
    pub fn header(mut self) -> Self {
        self.column_header = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_empty() {
        let table = TableData::default();
        assert!(table.is_empty());
        assert_eq!(table.to_markdown(), "");
    }

    #[test]
    fn test_from_rows() {
        let table = TableData::from_rows([["Name", "Age"], ["Alice", "30"], ["Bob", "25"]]);
        assert_eq!(table.num_rows, 3);
        assert_eq!(table.num_cols, 2);
        assert_eq!(table.header_rows(), 1);
        assert_eq!(
            table.to_markdown(),
            "| Name | Age |\n| --- | --- |\n| Alice | 30 |\n| Bob | 25 |"
        );
    }

    #[test]
    fn test_spanning_cell_fills_grid() {
        let mut table = TableData::new(2, 2);
        table.add_cell(TableCell::text(0, 0, "Merged").col_span(2).header());
        table.add_cell(TableCell::text(1, 0, "a"));
        table.add_cell(TableCell::text(1, 1, "b"));

        assert_eq!(
            table.grid(),
            vec![
                vec!["Merged".to_string(), "Merged".to_string()],
                vec!["a".to_string(), "b".to_string()],
            ]
        );
        assert_eq!(table.plain_text(), "Merged\tMerged\na\tb");
    }

    #[test]
    fn test_pipe_escaped() {
        let table = TableData::from_rows([["a|b"]]);
        assert!(table.to_markdown().starts_with("| a\\|b |"));
    }
}
