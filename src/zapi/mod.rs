//! ZAPI Adapter
//!
//! Provides the production [`ZapiSession`](crate::domain::ports::ZapiSession):
//! - Element tree for requests and replies
//! - HTTP(S) client for the cluster management servlet
//! - Connection configuration

pub mod client;
pub mod config;
pub mod element;

pub use client::*;
pub use config::*;
pub use element::*;
