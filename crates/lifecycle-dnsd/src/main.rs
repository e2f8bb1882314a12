// # lifecycle-dnsd - Lifecycle DNS Runner
//
// Handles exactly one instance lifecycle event and exits.
//
// This binary is a THIN integration layer: it reads configuration, wires
// the registered zone service and instance directory into a
// `LifecycleEngine`, hands it one event and reports the outcome. All DNS
// logic lives in lifecycle-dns-core.
//
// ## Invocation
//
// ```bash
// lifecycle-dnsd running i-0abc123        # event from arguments
// lifecycle-dnsd < event.json             # event envelope from stdin
// ```
//
// The rendered change result goes to stdout. Logs and audit lines go to
// stderr.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Zone
// - `LDNS_ZONE_ID`: Zone holding the placeholder records (required)
// - `LDNS_DOMAIN_NAME`: Suffix appended to host names (optional)
//
// ### Zone Service
// - `LDNS_ZONE_PROVIDER`: Zone service type (cloudflare)
// - `LDNS_CLOUDFLARE_API_TOKEN`: API token
// - `LDNS_MODE`: `dry-run` to look records up without changing them
//
// ### Instance Directory
// - `LDNS_DIRECTORY_TYPE`: Directory type (file)
// - `LDNS_INVENTORY_PATH`: Path to the JSON inventory (for file)
//
// ### Logging
// - `LDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Exit Codes
//
// - 0: Change submitted
// - 1: Configuration error
// - 2: Invocation failed (directory, zone service, missing record)
// - 3: Invalid event input (unrecognized state, malformed payload)

use anyhow::Result;
use lifecycle_dns_core::config::{
    InstanceDirectoryConfig, LifecycleDnsConfig, ZoneConfig, ZoneServiceConfig,
};
use lifecycle_dns_core::{Error, LifecycleEngine, LifecycleEvent, ServiceRegistry, reporter};
use std::env;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the outcomes of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LdnsExitCode {
    /// Change submitted
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// A collaborator failed or the zone holds no placeholder
    InvocationFailure = 2,
    /// The event itself cannot be acted on
    InvalidEvent = 3,
}

impl LdnsExitCode {
    /// Classify an engine error
    fn for_error(err: &Error) -> Self {
        match err {
            e if e.is_input_error() => LdnsExitCode::InvalidEvent,
            Error::Config(_) => LdnsExitCode::ConfigError,
            _ => LdnsExitCode::InvocationFailure,
        }
    }
}

impl From<LdnsExitCode> for ExitCode {
    fn from(code: LdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    zone_id: String,
    domain_name: Option<String>,
    zone_provider: String,
    cloudflare_api_token: Option<String>,
    dry_run: bool,
    directory_type: String,
    inventory_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            zone_id: lookup("LDNS_ZONE_ID").unwrap_or_default(),
            domain_name: non_empty("LDNS_DOMAIN_NAME"),
            zone_provider: non_empty("LDNS_ZONE_PROVIDER")
                .unwrap_or_else(|| "cloudflare".to_string()),
            cloudflare_api_token: lookup("LDNS_CLOUDFLARE_API_TOKEN"),
            dry_run: lookup("LDNS_MODE")
                .unwrap_or_default()
                .eq_ignore_ascii_case("dry-run"),
            directory_type: non_empty("LDNS_DIRECTORY_TYPE")
                .unwrap_or_else(|| "file".to_string()),
            inventory_path: non_empty("LDNS_INVENTORY_PATH"),
            log_level: lookup("LDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    ///
    /// Runs before any collaborator is created, so a bad environment never
    /// reaches the network.
    fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            anyhow::bail!(
                "LDNS_ZONE_ID is required. \
                Set it via: export LDNS_ZONE_ID=your_zone_id"
            );
        }

        if let Some(domain) = &self.domain_name {
            lifecycle_dns_core::config::validate_domain_name(domain.trim_end_matches('.'))?;
        }

        match self.zone_provider.as_str() {
            "cloudflare" => {
                let token = self.cloudflare_api_token.as_deref().unwrap_or_default();
                if token.is_empty() {
                    anyhow::bail!(
                        "LDNS_CLOUDFLARE_API_TOKEN is required when LDNS_ZONE_PROVIDER=cloudflare. \
                        Set it via: export LDNS_CLOUDFLARE_API_TOKEN=your_token"
                    );
                }

                // Check for obvious placeholder tokens (common mistake)
                let token_lower = token.to_lowercase();
                if token_lower.contains("your_token")
                    || token_lower.contains("replace_me")
                    || token_lower == "token"
                {
                    anyhow::bail!(
                        "LDNS_CLOUDFLARE_API_TOKEN appears to be a placeholder. \
                        Use an actual API token from Cloudflare."
                    );
                }
            }
            _ => anyhow::bail!(
                "LDNS_ZONE_PROVIDER '{}' is not supported. \
                Supported zone services: cloudflare",
                self.zone_provider
            ),
        }

        match self.directory_type.as_str() {
            "file" => {
                if self.inventory_path.is_none() {
                    anyhow::bail!(
                        "LDNS_INVENTORY_PATH is required when LDNS_DIRECTORY_TYPE=file. \
                        Set it via: export LDNS_INVENTORY_PATH=/var/lib/lifecycle-dns/inventory.json"
                    );
                }
            }
            _ => anyhow::bail!(
                "LDNS_DIRECTORY_TYPE '{}' is not supported. \
                Supported types: file",
                self.directory_type
            ),
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    /// Build the library configuration
    fn to_lifecycle_config(&self) -> LifecycleDnsConfig {
        LifecycleDnsConfig {
            zone: ZoneConfig::new(self.zone_id.trim(), self.domain_name.as_deref()),
            zone_service: ZoneServiceConfig::Cloudflare {
                api_token: self.cloudflare_api_token.clone().unwrap_or_default(),
                dry_run: self.dry_run,
            },
            instance_directory: InstanceDirectoryConfig::File {
                path: self.inventory_path.clone().unwrap_or_default(),
            },
        }
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "LDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Where the event comes from
#[derive(Debug, PartialEq, Eq)]
enum EventSource {
    /// `<state> <instance-id>` on the command line
    Args { state: String, instance_id: String },
    /// JSON envelope on stdin
    Stdin,
}

impl EventSource {
    fn from_args(args: &[String]) -> std::result::Result<Self, Error> {
        match args {
            [] => Ok(EventSource::Stdin),
            [state, instance_id] => Ok(EventSource::Args {
                state: state.clone(),
                instance_id: instance_id.clone(),
            }),
            _ => Err(Error::invalid_event(
                "usage: lifecycle-dnsd [<state> <instance-id>] (or the event JSON on stdin)",
            )),
        }
    }

    async fn read(self) -> std::result::Result<LifecycleEvent, Error> {
        match self {
            EventSource::Args { state, instance_id } => Ok(LifecycleEvent::new(instance_id, state)),
            EventSource::Stdin => {
                let mut payload = String::new();
                if let Err(e) = tokio::io::stdin().read_to_string(&mut payload).await {
                    let err = Error::from(e);
                    reporter::report_rejected_payload(&payload, &err);
                    return Err(err);
                }
                parse_payload(&payload)
            }
        }
    }
}

/// Parse a raw event payload, auditing it when it is refused
fn parse_payload(raw: &str) -> std::result::Result<LifecycleEvent, Error> {
    LifecycleEvent::from_json(raw).inspect_err(|e| reporter::report_rejected_payload(raw, e))
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    // Load and validate configuration from environment
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return LdnsExitCode::ConfigError.into();
    }

    // Initialize tracing; stdout is reserved for the result
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LdnsExitCode::ConfigError.into();
    }

    let source = match EventSource::from_args(&args) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return LdnsExitCode::InvalidEvent.into();
        }
    };

    // One event, no internal concurrency
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LdnsExitCode::InvocationFailure.into();
        }
    };

    rt.block_on(run(config, source)).into()
}

/// Handle one event
async fn run(config: Config, source: EventSource) -> LdnsExitCode {
    info!("Starting lifecycle-dnsd for zone {}", config.zone_id);

    let registry = ServiceRegistry::new();
    lifecycle_dns_core::directory::register(&registry);

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare zone service");
        lifecycle_dns_provider_cloudflare::register(&registry);
    }

    if config.dry_run {
        warn!("Running in DRY-RUN mode - no changes will be made");
    }

    let engine = match LifecycleEngine::from_config(&config.to_lifecycle_config(), &registry) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to build engine: {}", e);
            return LdnsExitCode::ConfigError;
        }
    };

    let event = match source.read().await {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to read event: {}", e);
            return LdnsExitCode::InvalidEvent;
        }
    };

    match engine.handle(&event).await {
        Ok(result) => {
            println!("{}", reporter::render_result(&result));
            LdnsExitCode::Success
        }
        Err(e) => {
            error!("Invocation failed: {}", e);
            LdnsExitCode::for_error(&e)
        }
    }
}
