//! Loading of the pricing spreadsheet
//!
//! - table: in-memory tabular data with case-insensitive column lookup
//! - fetcher: CSV export download and parsing
//! - normalize: column/cell clean-up and derived columns
//! - cache: time-bounded snapshot of the three sheets

pub mod cache;
pub mod fetcher;
pub mod normalize;
pub mod table;

pub use cache::{PricingTables, SheetNames, TableCache};
pub use fetcher::{GoogleSheetsFetcher, RetrievalError, SheetSource};
pub use normalize::{clean_title, normalize, normalize_extras};
pub use table::{Row, Table};
