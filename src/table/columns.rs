use super::TableRow;

/// Normalizes a column heading into a snake_case field name
///
/// `"Bytes In"` becomes `bytes_in`, `"Status (Expires)"` becomes
/// `status_expires`, and a leading digit gets a `d` prefix. Icon-only
/// columns normalize to an empty string.
pub fn normalize_header(heading: &str) -> String {
    let mut name = String::with_capacity(heading.len());
    for c in heading.trim().chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('_') && !name.is_empty() {
            name.push('_');
        }
    }
    let name = name.trim_end_matches('_').to_string();

    match name.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("d{}", name),
        _ => name,
    }
}

/// Column index built from a header row
///
/// Duplicate names are suffixed `_1`, `_2`, … in order of appearance, so two
/// "Since" columns become `since` and `since_1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    names: Vec<String>,
}

impl Columns {
    pub fn from_header(cells: &[String]) -> Self {
        let mut names: Vec<String> = Vec::with_capacity(cells.len());
        for cell in cells {
            let base = normalize_header(cell);
            let mut name = base.clone();
            let mut suffix = 0;
            while !base.is_empty() && names.contains(&name) {
                suffix += 1;
                name = format!("{}_{}", base, suffix);
            }
            names.push(name);
        }
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column matching any of `aliases`
    ///
    /// Aliases are tried in order, so list the current firmware's name first.
    pub fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.names.iter().position(|name| name == alias))
    }
}

/// A table split into its header and its data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderedTable {
    pub columns: Columns,
    pub rows: Vec<Vec<String>>,
}

impl HeaderedTable {
    /// Splits extracted rows into header and data
    ///
    /// The last header row wins (pages with a grouping row above the real
    /// headings). Without any header row the first data row is used as the
    /// header. Placeholder rows made of a single spanning cell are dropped.
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        let header_pos = rows.iter().rposition(|r| r.header);
        let mut header = None;
        let mut data = Vec::new();

        for (pos, row) in rows.into_iter().enumerate() {
            if Some(pos) == header_pos {
                header = Some(row.cells);
            } else if row.header || row.is_message_row() {
                continue;
            } else if header_pos.is_none() && header.is_none() {
                header = Some(row.cells);
            } else {
                data.push(row.cells);
            }
        }

        Self {
            columns: header.map(|cells| Columns::from_header(&cells)).unwrap_or_default(),
            rows: data,
        }
    }

    /// True when the table was absent altogether
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str], header: bool) -> TableRow {
        TableRow {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            header,
            source_cells: cells.len(),
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Bytes In"), "bytes_in");
        assert_eq!(normalize_header("IP address"), "ip_address");
        assert_eq!(normalize_header("Interface and VHID"), "interface_and_vhid");
        assert_eq!(normalize_header("Status (Expires)"), "status_expires");
        assert_eq!(normalize_header("  RTTsd "), "rttsd");
        assert_eq!(normalize_header("802.1Q"), "d802_1q");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_duplicate_headers() {
        let columns = Columns::from_header(&[
            "Failover Group".to_string(),
            "Since".to_string(),
            "Since".to_string(),
            "".to_string(),
            "".to_string(),
        ]);
        assert_eq!(
            columns.names(),
            &["failover_group", "since", "since_1", "", ""]
        );
    }

    #[test]
    fn test_find_aliases_in_order() {
        let columns = Columns::from_header(&["Connected Since".to_string(), "Name".to_string()]);
        assert_eq!(columns.find(&["last_change", "connected_since"]), Some(0));
        assert_eq!(columns.find(&["name"]), Some(1));
        assert_eq!(columns.find(&["missing"]), None);
    }

    #[test]
    fn test_split_header_and_rows() {
        let table = HeaderedTable::from_rows(vec![
            row(&["Group"], true),
            row(&["Name", "Value"], true),
            row(&["a", "1"], false),
            row(&["b", "2"], false),
        ]);
        assert_eq!(table.columns.names(), &["name", "value"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_first_row_as_header_fallback() {
        let table = HeaderedTable::from_rows(vec![row(&["Name"], false), row(&["a"], false)]);
        assert_eq!(table.columns.names(), &["name"]);
        assert_eq!(table.rows, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_message_rows_dropped() {
        let placeholder = TableRow {
            cells: vec!["No leases".to_string(); 3],
            header: false,
            source_cells: 1,
        };
        let table = HeaderedTable::from_rows(vec![row(&["A", "B", "C"], true), placeholder]);
        assert!(table.rows.is_empty());
        assert!(!table.is_empty());
    }

    #[test]
    fn test_absent_table() {
        assert!(HeaderedTable::from_rows(Vec::new()).is_empty());
    }
}
