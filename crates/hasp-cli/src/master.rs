//! The `hasp master` subcommand.

use anyhow::{Context, Result};
use hasp_hardware::serial::SerialBusLine;
use hasp_hardware::traits::ScanSource;
use hasp_hardware::wedge::LineScanner;
use hasp_link::{BusPort, Courier};
use hasp_master::{AuditSink, FileSink, MasterConfig, MasterOrchestrator, MemorySink, Registry};
use hasp_token::TokenCodec;
use std::path::Path;
use tracing::{info, warn};

/// Load the configuration, bring up the line, and run the orchestrator
/// until Ctrl-C.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = MasterConfig::load(config_path)
        .with_context(|| format!("loading master config {}", config_path.display()))?;

    // A line that cannot be opened is fatal here; transient failures
    // after startup are the transport's problem.
    let line = SerialBusLine::open(&config.serial_port, config.baud_rate)
        .with_context(|| format!("opening serial line {}", config.serial_port))?;
    let port = BusPort::with_config(line, config.port_config());
    let courier = Courier::with_config(port, config.courier_config());

    let codec = TokenCodec::from_key_file(&config.key_file)
        .with_context(|| format!("loading key material {}", config.key_file.display()))?;
    let registry = config.registry();
    info!(
        port = %config.serial_port,
        registered = registry.len(),
        "master starting"
    );

    let mut scanner = LineScanner::stdin();
    match &config.audit_log {
        Some(path) => {
            let sink = FileSink::new(path);
            drive(courier, registry, codec, sink, &mut scanner).await
        }
        None => {
            warn!("no audit_log configured, events stay in memory only");
            drive(courier, registry, codec, MemorySink::new(), &mut scanner).await
        }
    }
}

async fn drive<K: AuditSink>(
    courier: Courier<SerialBusLine>,
    registry: Registry,
    codec: TokenCodec,
    sink: K,
    scanner: &mut impl ScanSource,
) -> Result<()> {
    let mut orchestrator = MasterOrchestrator::new(courier, registry, codec, sink);
    let shutdown = crate::shutdown_on_ctrl_c();
    orchestrator
        .run(scanner, shutdown)
        .await
        .context("master loop failed")
}
