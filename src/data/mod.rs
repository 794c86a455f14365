//! Data layer: subject table, loading, filtering and audiometric logic.
//!
//! Architecture:
//! ```text
//!  full export .csv        exported .csv
//!        │                      │
//!        ▼                      ▼
//!   ┌───────────────────────────────┐
//!   │  loader   │ clean / read → ColumnStore
//!   └───────────────────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  predicates applied in order → narrower ColumnStore
//!   └──────────┘
//!        │  one subject
//!        ▼
//!   ┌────────────┐     ┌──────────┐
//!   │ audiogram  │ ──▶ │ coupling │  matrix / coupling / vent per ear
//!   └────────────┘     └──────────┘
//! ```

pub mod audiogram;
pub mod coupling;
pub mod filter;
pub mod filter_file;
pub mod loader;
pub mod model;
pub mod profile;
pub mod sample;
pub mod schema;
