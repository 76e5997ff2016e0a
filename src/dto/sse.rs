use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already formatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per tie-extension, for a transient banner.
pub struct ThresholdExtendedEvent {
    pub new_threshold: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a command was refused with a user-facing reason.
pub struct ValidationEvent {
    pub message: String,
}
