//! Pure projections of a filtered view: grouped totals for the charts,
//! the sorted/paginated table, CSV export and the period comparison.

pub mod aggregate;
pub mod table;
pub mod trend;
