// JSON codec for the replicated event bus and the model-event fan-out task.

use super::protocol::{MODEL_EVENT_NAMES, ModelMessage, VIEW_EVENT_NAMES, ViewMessage};
use crate::use_cases::{ModelEvent, ReplicaSnapshot, ViewEvent};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum BusError {
    #[error("malformed bus payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("bus payload has no event type")]
    MissingType,
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
}

// Reads the event name and rejects anything outside `known`.
fn checked_name<'a>(value: &'a Value, known: &[&str]) -> Result<&'a str, BusError> {
    let name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(BusError::MissingType)?;
    if known.contains(&name) {
        Ok(name)
    } else {
        Err(BusError::UnknownEvent(name.to_string()))
    }
}

pub fn encode_view_event(event: &ViewEvent) -> Result<String, BusError> {
    Ok(serde_json::to_string(&ViewMessage::from(event))?)
}

pub fn decode_view_event(text: &str) -> Result<ViewEvent, BusError> {
    let value: Value = serde_json::from_str(text)?;
    checked_name(&value, &VIEW_EVENT_NAMES)?;
    let message: ViewMessage = serde_json::from_value(value)?;
    Ok(message.into())
}

pub fn encode_model_event(event: &ModelEvent) -> Result<String, BusError> {
    Ok(serde_json::to_string(&ModelMessage::from(event))?)
}

pub fn decode_model_event(text: &str) -> Result<ModelEvent, BusError> {
    let value: Value = serde_json::from_str(text)?;
    checked_name(&value, &MODEL_EVENT_NAMES)?;
    let message: ModelMessage = serde_json::from_value(value)?;
    Ok(message.into())
}

/// Serializes a replica snapshot for a late joiner.
pub fn encode_snapshot(snapshot: &ReplicaSnapshot) -> Result<String, BusError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn decode_snapshot(text: &str) -> Result<ReplicaSnapshot, BusError> {
    Ok(serde_json::from_str(text)?)
}

pub async fn model_event_serializer(
    mut event_rx: broadcast::Receiver<ModelEvent>,
    event_bytes_tx: broadcast::Sender<Arc<str>>,
    event_latest_tx: watch::Sender<Arc<str>>,
) {
    // Serialize each model event once and broadcast the shared text.
    loop {
        match event_rx.recv().await {
            Ok(event) => {
                let txt = match encode_model_event(&event) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = %e, event = event.name(), "failed to serialize model event");
                        continue;
                    }
                };

                let shared: Arc<str> = Arc::from(txt);
                // Keep the latest text for observers that fall behind.
                let _ = event_latest_tx.send(shared.clone());
                let _ = event_bytes_tx.send(shared);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "model event serializer lagged; skipping to latest event"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("model events channel closed; serializer exiting");
                break;
            }
        }
    }
}
