use serde::Serialize;

use super::filter::contains_ignore_case;
use crate::config::{ColumnsConfig, TabConfig};
use crate::sheets::{Row, Table};

/// One priced add-on service as presented to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraItem {
    pub title: String,
    pub price: Option<String>,
    pub description: Option<String>,
    pub responsible: Option<String>,
    pub category: Option<String>,
    pub authority: Option<String>,
    pub multiplier: Option<String>,
    pub range: Option<String>,
    pub notes: Option<String>,
}

impl ExtraItem {
    pub fn from_row(row: &Row<'_>, columns: &ColumnsConfig) -> Self {
        let field = |name: &str| row.get(name).map(str::to_string);

        Self {
            title: row.get(&columns.title_clean()).unwrap_or_default().to_string(),
            price: field(columns.price.as_str()),
            description: field(columns.description.as_str()),
            responsible: field(columns.responsible.as_str()),
            category: field(columns.category.as_str()),
            authority: field(columns.authority.as_str()),
            multiplier: field(columns.multiplier.as_str()),
            range: field(columns.range.as_str()),
            notes: field(columns.notes.as_str()),
        }
    }
}

pub fn find_tab<'a>(tabs: &'a [TabConfig], id: &str) -> Option<&'a TabConfig> {
    tabs.iter().find(|tab| tab.id.eq_ignore_ascii_case(id.trim()))
}

/// Rows whose responsible party matches any keyword of `tab`
pub fn tab_rows(extras: &Table, tab: &TabConfig, columns: &ColumnsConfig) -> Table {
    if tab.responsible.is_empty() {
        return extras.clone();
    }

    extras.filter_rows(|row| {
        let responsible = row.get(&columns.responsible);
        tab.responsible
            .iter()
            .any(|keyword| contains_ignore_case(responsible, keyword))
    })
}

/// Items of `extras` shown under `tab`
pub fn extras_view(extras: &Table, tab: &TabConfig, columns: &ColumnsConfig) -> Vec<ExtraItem> {
    tab_rows(extras, tab, columns)
        .rows()
        .map(|row| ExtraItem::from_row(&row, columns))
        .collect()
}
