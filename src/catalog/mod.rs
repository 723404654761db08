//! Catalog views over the loaded pricing tables
//!
//! - filter: facet and free-text filtering of extras, facet option lists
//! - view: typed extra items and responsible-party tabs
//! - plans: plan matrix with inclusion flags and itemized details

pub mod filter;
pub mod plans;
pub mod view;

pub use filter::{facet_options, filter_extras, ExtraQuery, Facet, Selection, ALL_LABEL};
pub use plans::{plan_features, plan_names, PlanFeature};
pub use view::{extras_view, find_tab, ExtraItem};
