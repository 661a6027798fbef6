use super::reflector::ReflectorInput;
use crate::domain::RoundState;
use crate::use_cases::ModelEvent;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Views publishing into the reflector.
    pub reflector_tx: mpsc::Sender<ReflectorInput>,
    // Model events from the observed replica (domain values).
    pub observer_tx: broadcast::Sender<ModelEvent>,
    // Serialized model events, shared across all observers.
    pub observer_bytes_tx: broadcast::Sender<Arc<str>>,
    // Latest serialized model event for lag recovery.
    pub observer_latest_tx: watch::Sender<Arc<str>>,
    // Round status of the observed replica.
    pub round_tx: watch::Sender<RoundState>,
}
