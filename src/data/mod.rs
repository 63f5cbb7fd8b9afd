/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .xlsm / .xlsb / .ods
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse first sheet → FacilityTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ FacilityTable  │  columns, rows, distinct values
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  tier == t, then variable == v → subset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  column projection → styled .xlsx bytes
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
