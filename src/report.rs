use serde::Serialize;

use crate::notif::{BusScope, NotificationRequest, Urgency};
use crate::run::NotificationOutcome;

/// The JSON line printed for every completed send attempt: outcome fields
/// first, then every request field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbus_message_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub summary:     String,
    pub body:        String,
    pub urgency:     Urgency,
    pub object_path: String,
    pub bus_name:    String,
    pub interface:   String,
    pub message_bus: BusScope,
    pub icon:        String,
    pub expire:      u64,
}

impl Report {
    pub fn merge(outcome: NotificationOutcome, request: NotificationRequest) -> Report {
        let (success, dbus_message_id, message) = match outcome {
            NotificationOutcome::Success { dbus_message_id } => (true, Some(dbus_message_id), None),
            NotificationOutcome::Failure { message }         => (false, None, Some(message)),
        };

        Report {
            success,
            dbus_message_id,
            message,
            summary:     request.summary,
            body:        request.body,
            urgency:     request.urgency,
            object_path: request.object_path,
            bus_name:    request.bus_name,
            interface:   request.interface,
            message_bus: request.message_bus,
            icon:        request.icon,
            expire:      request.expire,
        }
    }

    pub fn to_json(&self) -> Result<String, failure::Error> {
        Ok(serde_json::to_string(self)?)
    }
}
