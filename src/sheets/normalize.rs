use super::table::Table;

const EMPHASIS_MARKER: &str = "**";

/// Upper-case and trim column names, trim present cell values.
/// Missing cells pass through unchanged.
pub fn normalize(table: &Table) -> Table {
    table.map(normalize_column_name, |cell| {
        cell.as_ref().map(|value| value.trim().to_string())
    })
}

/// Normalize the Extras sheet and derive the cleaned title column from
/// `title_column` when the sheet has one.
pub fn normalize_extras(table: &Table, title_column: &str) -> Table {
    let table = normalize(table);
    let title = normalize_column_name(title_column);

    if !table.has_column(&title) {
        return table;
    }

    table.with_column(&clean_column_name(&title), |row| {
        Some(clean_title(row.get(&title)))
    })
}

/// Title with every emphasis marker removed and surrounding whitespace
/// trimmed; empty for a missing value.
pub fn clean_title(value: Option<&str>) -> String {
    match value {
        Some(value) => value.replace(EMPHASIS_MARKER, "").trim().to_string(),
        None => String::new(),
    }
}

/// Name of the cleaned variant of a title column
pub fn clean_column_name(title_column: &str) -> String {
    format!("{}_CLEAN", normalize_column_name(title_column))
}

fn normalize_column_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_extras() -> Table {
        Table::new(
            vec![" titolo ".to_string(), "Categoria ".to_string()],
            vec![
                vec![Some("  **F24 credit entry** ".to_string()), Some(" Tax ".to_string())],
                vec![None, Some("HR".to_string())],
                vec![Some("Plain".to_string()), None],
            ],
        )
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title(None), "");
        assert_eq!(clean_title(Some("**F24** credit")), "F24 credit");
        assert_eq!(clean_title(Some("  ** bold **  ")), "bold");
        assert_eq!(clean_title(Some("a*****b")), "a*b");
        assert!(!clean_title(Some("x****y**z")).contains("**"));
    }

    #[test]
    fn test_normalize_columns_and_cells() {
        let table = normalize(&raw_extras());
        assert_eq!(table.columns(), &["TITOLO", "CATEGORIA"]);

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].get("CATEGORIA"), Some("Tax"));
        assert_eq!(rows[1].get("TITOLO"), None);
        assert_eq!(rows[2].get("CATEGORIA"), None);
    }

    #[test]
    fn test_normalize_extras_derives_clean_title() {
        let table = normalize_extras(&raw_extras(), "TITOLO");
        assert_eq!(table.columns(), &["TITOLO", "CATEGORIA", "TITOLO_CLEAN"]);

        let cleaned: Vec<_> = table.rows().map(|row| row.get("TITOLO_CLEAN")).collect();
        assert_eq!(cleaned, vec![Some("F24 credit entry"), Some(""), Some("Plain")]);
    }

    #[test]
    fn test_normalize_extras_without_title_column() {
        let table = Table::new(vec!["PREZZO".to_string()], vec![vec![Some("10".to_string())]]);
        let normalized = normalize_extras(&table, "TITOLO");
        assert_eq!(normalized.columns(), &["PREZZO"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&raw_extras());
        assert_eq!(normalize(&once), once);

        let once = normalize_extras(&raw_extras(), "titolo");
        assert_eq!(normalize_extras(&once, "titolo"), once);
    }
}
