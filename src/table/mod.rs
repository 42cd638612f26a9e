//! Table extractor
//!
//! Status pages carry no stable ids across firmware releases, so tables are
//! located structurally: by position, by the heading of the panel that holds
//! them, or by a CSS selector. All of that lives behind [`TableLocator`] so a
//! firmware bump only means touching locator rules, not parser logic.
//!
//! "No table" and "cannot read this page" are different outcomes: a missing
//! table yields zero rows, while a missing page-level container (the locator's
//! `container`) is a [`TableError::TableNotFound`].

mod columns;
mod extract;

pub use columns::{normalize_header, Columns, HeaderedTable};
pub use extract::{extract_table, extract_table_from_str};

use thiserror::Error;

/// Table extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("page structure not recognized: no element matches {container:?}")]
    TableNotFound { container: String },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

/// How to find the target table in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorKind {
    /// The n-th `<table>` in document order (zero based)
    Index(usize),

    /// The first table after a heading with this text and before the next
    /// heading; exact (case-insensitive) matches win over substring matches
    Heading(String),

    /// The first element matching a CSS selector, or the first table inside it
    Selector(String),
}

/// A table locator plus an optional page-level container that must exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocator {
    pub kind: LocatorKind,
    pub container: Option<String>,
}

impl TableLocator {
    pub fn index(index: usize) -> Self {
        Self {
            kind: LocatorKind::Index(index),
            container: None,
        }
    }

    pub fn heading(text: &str) -> Self {
        Self {
            kind: LocatorKind::Heading(text.to_string()),
            container: None,
        }
    }

    pub fn selector(css: &str) -> Self {
        Self {
            kind: LocatorKind::Selector(css.to_string()),
            container: None,
        }
    }

    /// Requires an element matching `css` for the page to count as recognized
    pub fn within(mut self, css: &str) -> Self {
        self.container = Some(css.to_string());
        self
    }
}

/// One table row as cell texts, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Cell texts with whitespace collapsed; spanned cells are duplicated
    pub cells: Vec<String>,

    /// Row sits in `<thead>` or is made only of `<th>` cells
    pub header: bool,

    /// Number of `<td>`/`<th>` elements the row was built from
    pub source_cells: usize,
}

impl TableRow {
    /// A single cell stretched over several columns, such as
    /// "No leases in use" placeholders
    pub fn is_message_row(&self) -> bool {
        self.source_cells == 1 && self.cells.len() > 1
    }
}
