use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    catalog::{self, ExtraItem, ExtraQuery, Facet, PlanFeature},
    config::TabConfig,
    error::AppError,
};

#[derive(Debug, Serialize)]
pub struct TabSummary {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub categories: Vec<Facet>,
    pub authorities: Vec<Facet>,
    pub tabs: Vec<TabSummary>,
}

/// GET /api/facets
pub async fn list_facets(State(state): State<AppState>) -> Result<Json<FacetsResponse>, AppError> {
    let tables = state.tables().await?;
    let config = state.config.load();

    Ok(Json(FacetsResponse {
        categories: catalog::facet_options(&tables.extras, &config.columns.category),
        authorities: catalog::facet_options(&tables.extras, &config.columns.authority),
        tabs: config
            .catalog
            .tabs
            .iter()
            .map(|tab| TabSummary {
                id: tab.id.clone(),
                label: tab.label.clone(),
            })
            .collect(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtrasParams {
    pub category: Option<String>,
    pub authority: Option<String>,
    pub q: Option<String>,
    pub tab: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtrasResponse {
    /// False when no facet or search constraint was given
    pub applied: bool,
    pub count: usize,
    pub items: Vec<ExtraItem>,
}

/// GET /api/extras
pub async fn list_extras(
    State(state): State<AppState>,
    Query(params): Query<ExtrasParams>,
) -> Result<Json<ExtrasResponse>, AppError> {
    let config = state.config.load_full();

    let unrestricted = TabConfig {
        id: "all".to_string(),
        label: catalog::ALL_LABEL.to_string(),
        responsible: Vec::new(),
    };
    let tab = match params.tab.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => catalog::find_tab(&config.catalog.tabs, id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown tab: {}", id)))?,
        None => &unrestricted,
    };

    let query = ExtraQuery::new(
        Facet::from_selection(params.category.as_deref()),
        Facet::from_selection(params.authority.as_deref()),
        params.q.as_deref().unwrap_or_default(),
    );

    let tables = state.tables().await?;
    let selection = catalog::filter_extras(&tables.extras, &config.columns, &query);
    let items = catalog::extras_view(&selection.table, tab, &config.columns);

    tracing::debug!(
        tab = %tab.id,
        category = %query.category,
        authority = %query.authority,
        tokens = query.search.len(),
        matches = items.len(),
        "Filtered extras"
    );

    Ok(Json(ExtrasResponse {
        applied: selection.applied,
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<String>,
}

/// GET /api/plans
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<PlansResponse>, AppError> {
    let tables = state.tables().await?;
    let config = state.config.load();

    Ok(Json(PlansResponse {
        plans: catalog::plan_names(&tables.plans, &config.columns),
    }))
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: String,
    pub features: Vec<PlanFeature>,
}

/// GET /api/plans/:plan
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan): Path<String>,
) -> Result<Json<PlanResponse>, AppError> {
    let tables = state.tables().await?;
    let config = state.config.load();

    let features = catalog::plan_features(
        &tables,
        &plan,
        &config.columns,
        &config.catalog.feature_details,
    );

    Ok(Json(PlanResponse { plan, features }))
}
