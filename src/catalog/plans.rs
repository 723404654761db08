use serde::Serialize;

use super::filter::contains_ignore_case;
use crate::config::{ColumnsConfig, FeatureDetailRule};
use crate::sheets::{PricingTables, Table};

/// One feature row of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFeature {
    pub feature: String,
    /// Cell as written in the sheet
    pub raw: Option<String>,
    pub included: bool,
    /// Itemized included services for this feature, if a rule lists them
    pub details: Vec<String>,
}

/// Plan columns of the Plans sheet, in sheet order
pub fn plan_names(plans: &Table, columns: &ColumnsConfig) -> Vec<String> {
    let stem = columns.plan_feature_stem.trim().to_uppercase();

    plans
        .columns()
        .iter()
        .filter(|column| !column.to_uppercase().contains(&stem))
        .cloned()
        .collect()
}

pub fn is_included(raw: Option<&str>, marker: &str) -> bool {
    raw.is_some_and(|cell| cell.contains(marker))
}

/// Feature rows of `plan`; empty when the plan does not exist
pub fn plan_features(
    tables: &PricingTables,
    plan: &str,
    columns: &ColumnsConfig,
    rules: &[FeatureDetailRule],
) -> Vec<PlanFeature> {
    let Some(plan) = plan_names(&tables.plans, columns)
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(plan.trim()))
    else {
        return Vec::new();
    };

    tables
        .plans
        .rows()
        .map(|row| {
            let feature = row.get(&columns.plan_feature).unwrap_or_default().to_string();
            let raw = row.get(&plan);

            // Feature names match case-sensitively, included categories do not
            let details = rules
                .iter()
                .find(|rule| feature.contains(rule.feature.as_str()))
                .map(|rule| feature_details(&tables.included, rule, columns))
                .unwrap_or_default();

            PlanFeature {
                included: is_included(raw, &columns.presence_marker),
                raw: raw.map(str::to_string),
                feature,
                details,
            }
        })
        .collect()
}

/// Details of included services whose category matches any of the rule's keywords
fn feature_details(included: &Table, rule: &FeatureDetailRule, columns: &ColumnsConfig) -> Vec<String> {
    included
        .rows()
        .filter(|row| {
            let category = row.get(&columns.included_category);
            rule.categories
                .iter()
                .any(|keyword| contains_ignore_case(category, keyword))
        })
        .filter_map(|row| row.get(&columns.included_detail).map(str::to_string))
        .collect()
}
