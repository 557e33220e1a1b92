//! HTML table row extraction.
//!
//! The planning page is one large HTML table. [`parse_rows`] flattens it into
//! [`RowRecord`]s: one per `<tr>`, holding the trimmed text of every `<td>`
//! inside it. Parsing is permissive, so broken markup degrades to fewer or
//! shorter rows rather than an error.

use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Trimmed cell texts of one table row, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord(Vec<String>);

impl RowRecord {
    /// Creates a row from already-trimmed cell texts.
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cell text at `index`, or `""` past the end of the row.
    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    /// All cells.
    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for RowRecord {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Parses every `<tr>` of an HTML document into a [`RowRecord`].
pub fn parse_rows(html: &str) -> Vec<RowRecord> {
    let (row_selector, cell_selector) = match (Selector::parse("tr"), Selector::parse("td")) {
        (Ok(tr), Ok(td)) => (tr, td),
        _ => {
            warn!("Failed to build table selectors");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let rows: Vec<RowRecord> = document
        .select(&row_selector)
        .map(|tr| {
            tr.select(&cell_selector)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect();

    debug!(rows = rows.len(), "Parsed planning table");
    rows
}
