// rest_api/src/protocol.rs

//! JSON frames exchanged over the subscription channel.
//!
//! Every frame is an envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use models::PatientRecord;

use crate::gateway::BroadcastGateway;

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent<'a> {
    /// Sent once right after a subscriber connects.
    InitialData(&'a [PatientRecord]),
    /// Sent on every tick.
    VitalUpdate(&'a [PatientRecord]),
    /// Answer to [`ClientEvent::RequestPatient`].
    PatientData(&'a PatientRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    RequestPatient(String),
}

/// Handles one text frame from a subscriber, returning the reply frame if
/// there is one. Unknown ids and malformed frames get no reply.
pub fn handle_client_frame(gateway: &BroadcastGateway, text: &str) -> Option<String> {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed client frame");
            return None;
        }
    };

    match event {
        ClientEvent::RequestPatient(id) => {
            let Some(patient) = gateway.get_by_id(&id) else {
                debug!(patient_id = %id, "Requested patient does not exist");
                return None;
            };
            match serde_json::to_string(&ServerEvent::PatientData(&patient)) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!(error = %e, patient_id = %id, "Failed to encode patient frame");
                    None
                }
            }
        }
    }
}
