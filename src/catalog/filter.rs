use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::ColumnsConfig;
use crate::sheets::{Row, Table};

/// Label shown for the "no constraint" option
pub const ALL_LABEL: &str = "All";

/// A facet constraint, or one entry of a facet's option list
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Facet {
    /// No constraint
    #[default]
    All,
    Value(String),
}

impl Facet {
    /// Constraint from an optional user selection; missing or blank means no constraint
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            Some(value) if !value.is_empty() => Facet::Value(value.to_string()),
            _ => Facet::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Facet::All)
    }

    fn matches(&self, cell: Option<&str>) -> bool {
        match self {
            Facet::All => true,
            Facet::Value(value) => contains_ignore_case(cell, value),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::All => f.write_str(ALL_LABEL),
            Facet::Value(value) => f.write_str(value),
        }
    }
}

/// Serialized as `{"label": ..., "value": ...}` with a null value for [`Facet::All`]
impl Serialize for Facet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct FacetOption<'a> {
            label: String,
            value: Option<&'a str>,
        }

        let value = match self {
            Facet::All => None,
            Facet::Value(value) => Some(value.as_str()),
        };

        FacetOption {
            label: self.to_string(),
            value,
        }
        .serialize(serializer)
    }
}

/// Constraints applied to the Extras table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraQuery {
    pub category: Facet,
    pub authority: Facet,
    pub search: Vec<String>,
}

impl ExtraQuery {
    /// Query with the free-text input split into whitespace-separated tokens
    pub fn new(category: Facet, authority: Facet, search_text: &str) -> Self {
        Self {
            category,
            authority,
            search: search_text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.category.is_all() && self.authority.is_all() && self.search.is_empty()
    }
}

/// Result of filtering. `applied` tells an empty match apart from no filter.
#[derive(Debug, Clone)]
pub struct Selection {
    pub table: Table,
    pub applied: bool,
}

/// Rows of `extras` satisfying every constraint of `query`.
///
/// Facets match as case-insensitive substrings of their column. Every search
/// token must appear in the cleaned title or in the description.
pub fn filter_extras(extras: &Table, columns: &ColumnsConfig, query: &ExtraQuery) -> Selection {
    if query.is_unconstrained() {
        return Selection {
            table: extras.clone(),
            applied: false,
        };
    }

    let title_clean = columns.title_clean();
    let table = extras.filter_rows(|row| {
        query.category.matches(row.get(&columns.category))
            && query.authority.matches(row.get(&columns.authority))
            && matches_tokens(row, &query.search, &title_clean, &columns.description)
    });

    Selection {
        table,
        applied: true,
    }
}

fn matches_tokens(row: &Row<'_>, tokens: &[String], title: &str, description: &str) -> bool {
    let title = row.get(title);
    let description = row.get(description);

    tokens
        .iter()
        .all(|token| contains_ignore_case(title, token) || contains_ignore_case(description, token))
}

/// Sorted distinct comma-separated values of `column`, led by [`Facet::All`].
/// A missing column yields only [`Facet::All`].
pub fn facet_options(table: &Table, column: &str) -> Vec<Facet> {
    let values: BTreeSet<String> = table
        .rows()
        .filter_map(|row| row.get(column))
        .flat_map(|cell| cell.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

    std::iter::once(Facet::All)
        .chain(values.into_iter().map(Facet::Value))
        .collect()
}

pub(crate) fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    match haystack {
        Some(haystack) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => false,
    }
}
