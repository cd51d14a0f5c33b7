//! ZAPI Connection Configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default ONTAPI minor version sent in the request envelope
pub const DEFAULT_ONTAPI_MINOR: u32 = 110;

/// Default page size for iterator calls
pub const DEFAULT_MAX_RECORDS: u32 = 1024;

// =============================================================================
// Transport
// =============================================================================

/// Transport used to reach the management LIF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Https,
}

impl Transport {
    /// URL scheme
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Https => "https",
        }
    }

    /// Port used when none is configured
    pub fn default_port(&self) -> u16 {
        match self {
            Transport::Http => 80,
            Transport::Https => 443,
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Http => write!(f, "HTTP"),
            Transport::Https => write!(f, "HTTPS"),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a ZAPI session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZapiConfig {
    /// Cluster management hostname or address
    pub hostname: String,
    /// Login user
    pub username: String,
    /// Login password
    #[serde(skip_serializing)]
    pub password: String,
    /// Use HTTPS instead of HTTP
    pub https: bool,
    /// Verify the server certificate (HTTPS only)
    pub validate_certs: bool,
    /// Override the transport default port
    pub http_port: Option<u16>,
    /// ONTAPI minor version
    pub ontapi: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// `max-records` sent with every iterator call
    pub max_records: u32,
}

impl Default for ZapiConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            username: String::new(),
            password: String::new(),
            https: false,
            validate_certs: true,
            http_port: None,
            ontapi: None,
            timeout_secs: 60,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl ZapiConfig {
    /// Load a configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| Error::Configuration(format!("Invalid configuration: {}", e)))
    }

    /// Selected transport
    pub fn transport(&self) -> Transport {
        if self.https {
            Transport::Https
        } else {
            Transport::Http
        }
    }

    /// Effective port
    pub fn port(&self) -> u16 {
        self.http_port
            .unwrap_or_else(|| self.transport().default_port())
    }

    /// Effective ONTAPI version string, e.g. `1.110`
    pub fn api_version(&self) -> String {
        format!("1.{}", self.ontapi.unwrap_or(DEFAULT_ONTAPI_MINOR))
    }

    /// Full servlet URL
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}/servlets/netapp.servlets.admin.XMLrequest_filer",
            self.transport().scheme(),
            self.hostname,
            self.port()
        )
    }

    /// Check that a session can be established from this configuration
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::Setup("hostname is required".into()));
        }
        if self.username.is_empty() {
            return Err(Error::Setup("username is required".into()));
        }
        if self.password.is_empty() {
            return Err(Error::Setup("password is required".into()));
        }
        if self.max_records == 0 {
            return Err(Error::Configuration("max_records must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("timeout must be positive".into()));
        }
        Ok(())
    }
}
