//! ONTAP Facts
//!
//! Gathers configuration facts from a NetApp ONTAP cluster over ZAPI and
//! prints them as a single JSON (or YAML) document on stdout.
//!
//! ```text
//! ontap-facts --hostname na-vsim --username admin --password ****
//! {
//!   "state": "info",
//!   "changed": false,
//!   "ontap_facts": { "aggregate_info": {...}, "volume_info": {...}, ... }
//! }
//! ```

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ontap_facts::{
    FactCollector, GatherFailure, GatherResult, Result, State, ZapiClient, ZapiConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// ONTAP Facts - read-only fact gathering for NetApp ONTAP clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML file with connection settings; flags and env override it
    #[arg(long, env = "ONTAP_CONFIG")]
    config: Option<PathBuf>,

    /// Cluster management hostname or address
    #[arg(long, env = "ONTAP_HOSTNAME")]
    hostname: Option<String>,

    /// Login user
    #[arg(long, env = "ONTAP_USERNAME")]
    username: Option<String>,

    /// Login password
    #[arg(long, env = "ONTAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use HTTPS (default: false)
    #[arg(long, env = "ONTAP_HTTPS")]
    https: Option<bool>,

    /// Verify the server certificate (default: true)
    #[arg(long, env = "ONTAP_VALIDATE_CERTS")]
    validate_certs: Option<bool>,

    /// Port, defaults to 80 for HTTP and 443 for HTTPS
    #[arg(long, env = "ONTAP_HTTP_PORT")]
    http_port: Option<u16>,

    /// ONTAPI minor version (default: 110)
    #[arg(long, env = "ONTAP_ONTAPI")]
    ontapi: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, env = "ONTAP_TIMEOUT")]
    timeout: Option<u64>,

    /// max-records sent with iterator calls
    #[arg(long, env = "ONTAP_MAX_RECORDS")]
    max_records: Option<u32>,

    /// Requested state
    #[arg(long, value_enum, default_value_t = State::Info)]
    state: State,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let code = match run(&args).await {
        Ok(result) => emit(args.output, &result, 0),
        Err(e) => {
            error!("Fact gathering failed: {}", e);
            emit(args.output, &GatherFailure::from(&e), e.exit_code())
        }
    };

    std::process::exit(code);
}

async fn run(args: &Args) -> Result<GatherResult> {
    let config = build_config(args)?;
    let max_records = config.max_records;

    info!("Starting ONTAP fact gathering");
    info!("  Version: {}", ontap_facts::VERSION);
    info!("  State: {}", args.state);

    let client = ZapiClient::new(config)?;
    let collector = FactCollector::new(client).with_max_records(max_records);
    let facts = collector.collect_all().await?;

    Ok(GatherResult::new(args.state, facts))
}

/// Layer CLI/env values over the optional config file
fn build_config(args: &Args) -> Result<ZapiConfig> {
    let mut config = match &args.config {
        Some(path) => ZapiConfig::from_yaml_file(path)?,
        None => ZapiConfig::default(),
    };

    if let Some(hostname) = &args.hostname {
        config.hostname = hostname.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(https) = args.https {
        config.https = https;
    }
    if let Some(validate_certs) = args.validate_certs {
        config.validate_certs = validate_certs;
    }
    if args.http_port.is_some() {
        config.http_port = args.http_port;
    }
    if args.ontapi.is_some() {
        config.ontapi = args.ontapi;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(max_records) = args.max_records {
        config.max_records = max_records;
    }

    Ok(config)
}

// =============================================================================
// Output
// =============================================================================

fn render<T: Serialize>(format: OutputFormat, document: &T) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Yaml => serde_yaml::to_string(document)?,
    })
}

/// Print a document to stdout and return the exit code to use
fn emit<T: Serialize>(format: OutputFormat, document: &T, code: i32) -> i32 {
    match render(format, document) {
        Ok(text) => {
            println!("{}", text);
            code
        }
        Err(e) => {
            error!("Cannot render output: {}", e);
            1
        }
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = ["hyper=warn", "reqwest=warn", "rustls=warn"]
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(
            EnvFilter::from_default_env().add_directive(level.into()),
            |filter, directive| filter.add_directive(directive),
        );

    // stdout carries the result document
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hostname: from-file\nusername: admin\npassword: pw\nmax_records: 200").unwrap();

        let args = Args::parse_from([
            "ontap-facts",
            "--config",
            file.path().to_str().unwrap(),
            "--hostname",
            "from-flag",
            "--https",
            "true",
        ]);

        let config = build_config(&args).unwrap();
        assert_eq!(config.hostname, "from-flag");
        assert_eq!(config.username, "admin");
        assert!(config.https);
        assert_eq!(config.max_records, 200);
        assert_eq!(args.state, State::Info);
    }

    #[test]
    fn test_render_yaml() {
        let failure = GatherFailure {
            failed: true,
            msg: "boom".into(),
        };

        let text = render(OutputFormat::Yaml, &failure).unwrap();
        assert!(text.contains("failed: true"));
        assert!(text.contains("msg: boom"));
    }
}
