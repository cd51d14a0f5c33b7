//! ZAPI HTTP Client
//!
//! Sends ZAPI calls to the cluster management servlet over HTTP(S) with
//! basic authentication and unwraps the `results` element of each reply.

use crate::domain::ports::ZapiSession;
use crate::error::{Error, Result};
use crate::zapi::config::ZapiConfig;
use crate::zapi::element::ZapiElement;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};

/// Namespace of the ONTAP admin API
pub const ZAPI_NAMESPACE: &str = "http://www.netapp.com/filer/admin";

// =============================================================================
// ZAPI Client
// =============================================================================

/// Session against one cluster management endpoint
pub struct ZapiClient {
    config: ZapiConfig,
    url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for ZapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZapiClient")
            .field("url", &self.url)
            .field("username", &self.config.username)
            .finish()
    }
}

impl ZapiClient {
    /// Create a new client
    ///
    /// Fails with [`Error::Setup`] before any call is attempted if the
    /// configuration is incomplete or the HTTP stack cannot be initialized.
    pub fn new(config: ZapiConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        if config.https && !config.validate_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Setup(format!("HTTP client initialization failed: {}", e)))?;

        let url = config.url();
        info!(
            "ZAPI session to {} ({}, ONTAPI {})",
            url,
            config.transport(),
            config.api_version()
        );

        Ok(Self { config, url, http })
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &ZapiConfig {
        &self.config
    }

    /// Wrap a call in the `<netapp>` envelope
    pub fn envelope(&self, request: &ZapiElement) -> Result<String> {
        build_envelope(&self.config.api_version(), request)
    }
}

#[async_trait]
impl ZapiSession for ZapiClient {
    async fn invoke(&self, request: &ZapiElement) -> Result<ZapiElement> {
        let body = self.envelope(request)?;
        debug!("ZAPI request {}: {}", request.name(), body);

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let text = response.text().await?;
        debug!("ZAPI response {}: {} bytes", request.name(), text.len());

        parse_results(&text)
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// Build the request document for one call
pub fn build_envelope(api_version: &str, request: &ZapiElement) -> Result<String> {
    let mut envelope = ZapiElement::new("netapp");
    envelope.set_attribute("version", api_version);
    envelope.set_attribute("xmlns", ZAPI_NAMESPACE);
    envelope.add_child_elem(request.clone());
    envelope.to_document()
}

/// Extract the `results` element from a reply document
///
/// `status="failed"` becomes [`Error::Zapi`] carrying the cluster's errno
/// and reason.
pub fn parse_results(xml: &str) -> Result<ZapiElement> {
    let root = ZapiElement::parse(xml)?;
    if root.name() != "netapp" {
        return Err(Error::MalformedResponse(format!(
            "expected <netapp> root, found <{}>",
            root.name()
        )));
    }

    let results = root
        .into_child_by_name("results")
        .ok_or_else(|| Error::MalformedResponse("missing <results> element".into()))?;

    match results.attribute("status") {
        Some("passed") => Ok(results),
        Some("failed") => Err(Error::Zapi {
            errno: results.attribute("errno").unwrap_or("unknown").to_string(),
            reason: results.attribute("reason").unwrap_or("no reason given").to_string(),
        }),
        Some(other) => Err(Error::MalformedResponse(format!(
            "unknown results status {}",
            other
        ))),
        None => Err(Error::MalformedResponse("results without status".into())),
    }
}
