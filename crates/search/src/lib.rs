//! Safe landing search.
//!
//! # Invariants
//! - The blocking and non-blocking searches share one column scan, so the
//!   same column data and the same random samples give the same answer.
//! - Attempts are bounded; running out is a normal result, never a panic.
//! - The blocking search never fetches; the non-blocking one never blocks.

mod column;
mod config;
mod safe;
mod vertical;

pub use column::{ColumnVerdict, ColumnView, ResidentColumn, scan_column};
pub use config::{SearchConfig, VerticalSearchConfig};
pub use safe::{SafeLocation, SafeLocationSearch, SearchError};
pub use vertical::find_safe_y;

pub fn crate_info() -> &'static str {
    "warpgate-search v0.1.0"
}
