// rest_api/src/gateway.rs

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use lib::errors::{SimulationError, SimulationResult};
use lib::registry::PatientRegistry;
use lib::simulator::SnapshotSink;
use models::PatientRecord;

use crate::protocol::ServerEvent;
use crate::GatewayError;

/// Fans simulator snapshots out to every live subscriber and answers
/// snapshot and single-patient queries from the shared registry.
///
/// Snapshots are serialized once per tick and shared as `Arc<str>` frames.
#[derive(Clone)]
pub struct BroadcastGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    registry: Arc<PatientRegistry>,
    updates_tx: broadcast::Sender<Arc<str>>,
}

impl BroadcastGateway {
    pub fn new(registry: Arc<PatientRegistry>, capacity: usize) -> Self {
        let (updates_tx, _) = broadcast::channel(capacity.max(1));
        BroadcastGateway {
            inner: Arc::new(GatewayInner { registry, updates_tx }),
        }
    }

    /// Full current snapshot, in creation order.
    pub fn get_all(&self) -> Vec<PatientRecord> {
        self.inner.registry.all()
    }

    pub fn get_by_id(&self, id: &str) -> Option<PatientRecord> {
        self.inner.registry.by_id(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.inner.updates_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.updates_tx.receiver_count()
    }

    /// Pushes one `vital-update` frame to all subscribers and returns how many
    /// were reached. Having no subscribers is not an error.
    pub fn publish_snapshot(&self, patients: &[PatientRecord]) -> Result<usize, GatewayError> {
        let frame: Arc<str> = serde_json::to_string(&ServerEvent::VitalUpdate(patients))?.into();
        match self.inner.updates_tx.send(frame) {
            Ok(reached) => {
                trace!(reached, patients = patients.len(), "Broadcast vital update");
                Ok(reached)
            }
            Err(_) => {
                debug!("No subscribers for vital update");
                Ok(0)
            }
        }
    }
}

impl SnapshotSink for BroadcastGateway {
    fn on_snapshot(&self, patients: &[PatientRecord]) -> SimulationResult<()> {
        self.publish_snapshot(patients)
            .map(|_| ())
            .map_err(|e| SimulationError::Sink(e.to_string()))
    }
}
