/// Data layer: core types, loading, classification and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read sheet → RawTable → validated InvestmentRow
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  ordered keyword rules → SubSegment
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<InvestmentRecord>, label index per axis
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply axis selections → filtered indices
///   └──────────┘
/// ```

pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
