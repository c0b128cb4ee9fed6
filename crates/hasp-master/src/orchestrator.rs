//! The master's scan-to-unlock cycle.
//!
//! One orchestrator owns the whole master side: the courier on the
//! shared line, the registry of lockers it may command, the token
//! codec, and the audit sink. Scans come in from a [`ScanSource`]; for
//! each one the orchestrator decides, commands, and records.
//!
//! # Scan cycle
//!
//! 1. A scan identical to the immediately preceding one is suppressed
//!    before the codec ever sees it. Commodity scanners repeat a code
//!    held in front of them; one presentation is one decision.
//! 2. The token is decoded against the wall clock. A rejected token is
//!    logged by error category only, and the cycle ends with nothing
//!    on the wire. The raw token never appears in any diagnostic.
//! 3. The grant's locker is looked up in the registry; an address this
//!    master was never told about is dropped with a warning.
//! 4. The proxy runs the unlock exchange. A confirmation or an
//!    exhausted retransmission schedule both end up in the audit sink;
//!    only a line failure stops the loop.
//!
//! Between scans the orchestrator drains unsolicited device reports
//! (manual re-locks) off the bus, acknowledges them, and records them
//! in the same audit trail.

use chrono::Utc;
use hasp_hardware::traits::{BusLine, ScanSource};
use hasp_link::{Courier, LinkError};
use hasp_protocol::Command;
use hasp_token::TokenCodec;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::audit::{AuditEvent, AuditSink};
use crate::error::Result;
use crate::registry::Registry;

/// Master-side coordinator: scans in, unlock exchanges out, every
/// settled outcome audited.
pub struct MasterOrchestrator<L, K> {
    courier: Courier<L>,
    registry: Registry,
    codec: TokenCodec,
    sink: K,
    last_scan: Option<String>,
}

impl<L: BusLine, K: AuditSink> MasterOrchestrator<L, K> {
    /// Assemble an orchestrator from its collaborators.
    pub fn new(courier: Courier<L>, registry: Registry, codec: TokenCodec, sink: K) -> Self {
        Self {
            courier,
            registry,
            codec,
            sink,
            last_scan: None,
        }
    }

    /// The registry of commandable lockers.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The audit sink, for inspection.
    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one scan through the decide-command-record cycle.
    ///
    /// Rejected tokens, unknown lockers, and devices that never answer
    /// are absorbed here with a diagnostic; the scan cycle must survive
    /// every bad input the reader can produce.
    ///
    /// # Errors
    ///
    /// Only a fatal line failure propagates.
    pub async fn handle_scan(&mut self, raw: &str) -> Result<()> {
        if self.last_scan.as_deref() == Some(raw) {
            trace!("repeated scan suppressed");
            return Ok(());
        }
        self.last_scan = Some(raw.to_string());

        let grant = match self.codec.decode(raw, Utc::now()) {
            Ok(grant) => grant,
            Err(error) => {
                warn!(category = error.category(), "scan rejected");
                return Ok(());
            }
        };

        let Some(proxy) = self.registry.lookup(grant.locker_id()) else {
            warn!(locker = %grant.locker_id(), "token names an unregistered locker");
            return Ok(());
        };

        info!(locker = %grant.locker_id(), actor = grant.actor(), "dispatching unlock");
        match proxy.unlock(&mut self.courier, grant.actor()).await {
            Ok(confirmation) => {
                info!(confirmation = %confirmation, "unlock confirmed");
                self.record(AuditEvent::confirmed(&confirmation));
            }
            Err(LinkError::TimeoutExceeded { attempts }) => {
                warn!(
                    locker = %grant.locker_id(),
                    attempts,
                    "device never confirmed, recording failed to open"
                );
                self.record(AuditEvent::failed_to_open(
                    grant.locker_id().clone(),
                    grant.actor(),
                ));
            }
            Err(error) => return Err(error.into()),
        }

        Ok(())
    }

    /// Drain unsolicited device reports off the bus.
    ///
    /// Each report from a registered locker is acknowledged and
    /// recorded; frames from unknown addresses are dropped with a
    /// diagnostic. Returns once the receive buffer is empty.
    ///
    /// # Errors
    ///
    /// Only a fatal line failure propagates.
    pub async fn poll_devices(&mut self) -> Result<()> {
        loop {
            match self.courier.try_receive().await {
                Ok(Some(frame)) => self.route_report(frame).await?,
                Ok(None) => return Ok(()),
                Err(LinkError::Frame(error)) => {
                    debug!(error = %error, "discarding unhandleable frame while draining");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Run the orchestrator until shutdown.
    ///
    /// Alternates between waiting for the next scan and draining
    /// device reports at the courier's poll cadence.
    ///
    /// # Errors
    ///
    /// Returns when the scan source dies or the line fails fatally.
    pub async fn run<S: ScanSource>(
        &mut self,
        scanner: &mut S,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let idle = self.courier.config().poll_interval;
        info!(registered = self.registry.len(), "master orchestrator online");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                scan = scanner.next_scan() => {
                    let event = scan?;
                    self.handle_scan(&event.payload).await?;
                }
                () = tokio::time::sleep(idle) => {
                    self.poll_devices().await?;
                }
                changed = shutdown.changed() => {
                    // A dropped sender means nobody is left to stop us
                    // gracefully.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("master orchestrator stopped");
        Ok(())
    }

    async fn route_report(&mut self, frame: Command) -> Result<()> {
        if frame.is_ack() {
            trace!(frame = %frame, "stray acknowledgment drained");
            return Ok(());
        }

        if !self.registry.contains(&frame.assign_to) {
            debug!(frame = %frame, "report from an unregistered device");
            return Ok(());
        }

        self.courier.acknowledge(&frame).await?;
        info!(report = %frame, "device report acknowledged");
        self.record(AuditEvent::reported(&frame));
        Ok(())
    }

    fn record(&mut self, event: AuditEvent) {
        if let Err(error) = self.sink.record(&event) {
            warn!(%error, event = %event, "audit sink failed, event delayed or lost");
        }
    }
}
