//! Fact Gathering
//!
//! The collector, its query catalog, and the flattening of ZAPI records
//! into the nested fact structure handed back to the caller.
//!
//! ```text
//! ┌──────────────┐   request    ┌──────────────┐
//! │   Catalog    │─────────────▶│ ZapiSession  │
//! │ (descriptor) │              └──────┬───────┘
//! └──────┬───────┘                     │ results
//!        │                             ▼
//!        │                      ┌──────────────┐
//!        └─────────────────────▶│  normalize   │──▶ FactTable ──▶ FactSet
//!            key / attribute    └──────────────┘
//! ```

pub mod catalog;
pub mod collector;
pub mod flatten;
pub mod report;
pub mod table;

pub use catalog::{CatalogEntry, QueryDescriptor, UniqueKey, CATALOG};
pub use collector::{normalize, FactCollector};
pub use report::{GatherFailure, GatherResult, State};
pub use table::{FactSet, FactTable};
