use super::*;
use crate::*;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Wire codec between JSON text frames and typed messages.
/// Encoding happens once per message, however many peers receive it.
pub struct Protocol;

impl Protocol {
    /// Serializes an outbound message. Returns None, after logging, if the
    /// message cannot be represented as JSON.
    pub fn encode(msg: &ServerMessage) -> Option<Arc<str>> {
        serde_json::to_string(msg)
            .map(Arc::from)
            .inspect_err(|e| log::error!("[protocol] failed to encode {:?}: {}", msg, e))
            .ok()
    }
    /// Parses an inbound text frame.
    pub fn decode<T>(s: &str) -> Result<T, ProtocolError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(s).map_err(ProtocolError::from)
    }
}
