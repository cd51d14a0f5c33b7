//! Domain Ports - Trait seams between the fact collector and the cluster
//!
//! The collector only ever talks to a [`ZapiSession`]. The HTTP client in
//! [`crate::zapi`] is the production adapter; tests plug in canned sessions.

use crate::error::Result;
use crate::zapi::ZapiElement;
use async_trait::async_trait;

// =============================================================================
// ZAPI Session Port
// =============================================================================

/// Port for issuing ZAPI calls against one cluster
#[async_trait]
pub trait ZapiSession: Send + Sync {
    /// Send a call and wait for its `results` element
    ///
    /// Returns [`Error::Zapi`](crate::Error::Zapi) when the cluster answers
    /// with `status="failed"`, and a transport error when no answer arrives.
    async fn invoke(&self, request: &ZapiElement) -> Result<ZapiElement>;

    /// Human readable description of the remote end, used in logs
    fn endpoint(&self) -> String;
}
