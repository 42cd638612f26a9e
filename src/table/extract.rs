use super::{LocatorKind, TableError, TableLocator, TableRow};
use scraper::{ElementRef, Html, Selector};

const MAX_SPAN: usize = 1000;

/// Extracts the rows of the table identified by `locator`
///
/// # Returns
///
/// * `Ok(rows)` - Rows in document order, header rows included and flagged;
///   empty when the table is absent
/// * `Err(TableError::TableNotFound)` - The locator's container is missing
///
/// # Example
///
/// ```
/// use pfsense_watch::table::{extract_table_from_str, TableLocator};
///
/// let html = "<table><tr><th>A</th></tr><tr><td>1</td></tr></table>";
/// let rows = extract_table_from_str(html, &TableLocator::index(0)).unwrap();
/// assert_eq!(rows.len(), 2);
/// assert!(rows[0].header);
/// ```
pub fn extract_table(document: &Html, locator: &TableLocator) -> Result<Vec<TableRow>, TableError> {
    if let Some(container) = &locator.container {
        let selector = parse_selector(container)?;
        if document.select(&selector).next().is_none() {
            return Err(TableError::TableNotFound {
                container: container.clone(),
            });
        }
    }

    let tables = parse_selector("table")?;
    let table = match &locator.kind {
        LocatorKind::Index(index) => document.select(&tables).nth(*index),
        LocatorKind::Heading(text) => find_after_heading(document, text)?,
        LocatorKind::Selector(css) => find_by_selector(document, css)?,
    };

    match table {
        Some(table) => Ok(read_rows(table)),
        None => {
            tracing::debug!("No table found for locator {:?}", locator.kind);
            Ok(Vec::new())
        }
    }
}

/// Parses `body` and extracts a table from it
pub fn extract_table_from_str(
    body: &str,
    locator: &TableLocator,
) -> Result<Vec<TableRow>, TableError> {
    let document = Html::parse_document(body);
    extract_table(&document, locator)
}

fn parse_selector(css: &str) -> Result<Selector, TableError> {
    Selector::parse(css).map_err(|_| TableError::InvalidSelector(css.to_string()))
}

fn find_by_selector<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, TableError> {
    let selector = parse_selector(css)?;
    let found = document.select(&selector).next();
    let Some(element) = found else {
        return Ok(None);
    };

    if element.value().name() == "table" {
        return Ok(Some(element));
    }
    let tables = parse_selector("table")?;
    let nested = element.select(&tables).next();
    Ok(nested)
}

fn find_after_heading<'a>(
    document: &'a Html,
    heading: &str,
) -> Result<Option<ElementRef<'a>>, TableError> {
    let selector = parse_selector("h1, h2, h3, h4, h5, h6, table")?;
    let wanted = collapse(heading).to_lowercase();

    // Pair every heading with the first table that follows it before the
    // next heading; a heading followed directly by another heading owns none.
    let mut sections: Vec<(String, Option<ElementRef<'a>>)> = Vec::new();
    for element in document.select(&selector) {
        if element.value().name() == "table" {
            if let Some((_, table)) = sections.last_mut() {
                if table.is_none() {
                    *table = Some(element);
                }
            }
        } else {
            sections.push((collapse_text(element).to_lowercase(), None));
        }
    }

    let exact = sections.iter().find(|(title, _)| *title == wanted);
    let section = exact.or_else(|| sections.iter().find(|(title, _)| title.contains(&wanted)));
    let table = section.and_then(|(_, table)| *table);
    Ok(table)
}

fn read_rows(table: ElementRef<'_>) -> Vec<TableRow> {
    let mut rows = Vec::new();
    let mut carry: Vec<Option<(String, usize)>> = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => push_row(&mut rows, &mut carry, child, false),
            section @ ("thead" | "tbody" | "tfoot") => {
                for tr in child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr")
                {
                    push_row(&mut rows, &mut carry, tr, section == "thead");
                }
            }
            _ => {}
        }
    }

    rows
}

fn push_row(
    rows: &mut Vec<TableRow>,
    carry: &mut Vec<Option<(String, usize)>>,
    tr: ElementRef<'_>,
    in_thead: bool,
) {
    let cells: Vec<ElementRef<'_>> = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect();

    if cells.is_empty() {
        return;
    }

    let all_th = cells.iter().all(|c| c.value().name() == "th");
    let mut texts = Vec::new();
    let mut column = 0;

    for cell in &cells {
        take_carried(carry, &mut texts, &mut column);

        let text = collapse_text(*cell);
        let colspan = span(cell, "colspan");
        let rowspan = span(cell, "rowspan");
        for _ in 0..colspan {
            if carry.len() <= column {
                carry.resize(column + 1, None);
            }
            if rowspan > 1 {
                carry[column] = Some((text.clone(), rowspan - 1));
            }
            texts.push(text.clone());
            column += 1;
        }
    }
    take_carried(carry, &mut texts, &mut column);

    rows.push(TableRow {
        cells: texts,
        header: in_thead || all_th,
        source_cells: cells.len(),
    });
}

/// Fills columns still covered by a rowspan from an earlier row
fn take_carried(carry: &mut [Option<(String, usize)>], texts: &mut Vec<String>, column: &mut usize) {
    while let Some(slot) = carry.get_mut(*column) {
        let Some((text, remaining)) = slot else { break };
        texts.push(text.clone());
        *remaining -= 1;
        if *remaining == 0 {
            *slot = None;
        }
        *column += 1;
    }
}

fn span(cell: &ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

fn collapse_text(element: ElementRef<'_>) -> String {
    collapse(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
