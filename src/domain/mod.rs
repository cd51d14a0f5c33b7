//! Domain layer - port definitions
//!
//! This module defines the trait the ZAPI adapters implement,
//! following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
