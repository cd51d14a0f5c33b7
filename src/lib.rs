//! ONTAP Facts - read-only information gathering for NetApp clusters
//!
//! Queries an ONTAP cluster over its ZAPI management interface and flattens
//! the replies into one nested fact structure for automation tooling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              Fact Collector                                  │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │     Catalog     │  │   Normalizer    │  │   Interface Group Lookup    │  │
//! │  │  (13 queries)   │  │ (key + flatten) │  │   (derived from ports)      │  │
//! │  └────────┬────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! │           └────────────────────┼─────────────────────────┘                  │
//! │                    ┌───────────┴───────────┐                                │
//! │                    │    ZapiSession port   │                                │
//! │                    └───────────┬───────────┘                                │
//! ├────────────────────────────────┼────────────────────────────────────────────┤
//! │                    ┌───────────┴───────────┐                                │
//! │                    │  ZAPI HTTP(S) client  │                                │
//! │                    │  (XML envelope, auth) │                                │
//! │                    └───────────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`facts`]: Catalog, collector, flattening and result documents
//! - [`zapi`]: ZAPI element tree, HTTP client and connection configuration
//! - [`domain`]: Session port
//! - [`error`]: Error types and handling

pub mod domain;
pub mod error;
pub mod facts;
pub mod zapi;

// Re-export commonly used types
pub use domain::ports::ZapiSession;

pub use error::{Error, Result};

pub use facts::{
    CatalogEntry, FactCollector, FactSet, FactTable, GatherFailure, GatherResult,
    QueryDescriptor, State, UniqueKey, CATALOG,
};

pub use zapi::{Transport, ZapiClient, ZapiConfig, ZapiElement};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
