// Reflector task: stamps everything views publish and fans it out to every replica.

use super::bus::encode_view_event;
use crate::domain::ViewId;
use crate::use_cases::{LogicalTime, Reflector, Stamped, ViewEvent};
use std::{sync::Arc, time::Duration};
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub enum ReflectorInput {
    Connect(ViewId),
    Disconnect(ViewId),
    // Already-encoded view event; forwarded without inspection.
    Publish(Arc<str>),
}

fn elapsed_ms(started: Instant) -> LogicalTime {
    started.elapsed().as_millis() as LogicalTime
}

fn membership(event: &ViewEvent) -> Option<Arc<str>> {
    match encode_view_event(event) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            error!(error = %e, "failed to encode membership event");
            None
        }
    }
}

/// Runs until shutdown is signalled or every input sender is gone.
/// Dropping `stream_tx` on exit closes the stream for every replica.
pub async fn reflector_task(
    mut input_rx: mpsc::Receiver<ReflectorInput>,
    stream_tx: broadcast::Sender<Stamped<Arc<str>>>,
    heartbeat: Duration,
    shutdown: Arc<Notify>,
) {
    let started = Instant::now();
    let mut reflector = Reflector::new();
    let mut ticker = interval(heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let stamped = tokio::select! {
            _ = shutdown.notified() => {
                info!(last_time = reflector.now(), "reflector shutting down");
                break;
            }
            _ = ticker.tick() => {
                reflector.advance_to(elapsed_ms(started));
                reflector.heartbeat()
            }
            input = input_rx.recv() => {
                let Some(input) = input else {
                    info!("all views disconnected; reflector exiting");
                    break;
                };
                reflector.advance_to(elapsed_ms(started));
                let payload = match input {
                    ReflectorInput::Connect(view_id) => {
                        info!(%view_id, "view connected");
                        membership(&ViewEvent::ViewJoin { view_id })
                    }
                    ReflectorInput::Disconnect(view_id) => {
                        info!(%view_id, "view disconnected");
                        membership(&ViewEvent::ViewExit { view_id })
                    }
                    ReflectorInput::Publish(payload) => Some(payload),
                };
                let Some(payload) = payload else {
                    continue;
                };
                reflector.stamp(payload)
            }
        };

        debug!(seq = stamped.seq, time = stamped.time, "reflecting");
        // No receivers yet is fine; replicas subscribe before connecting.
        let _ = stream_tx.send(stamped);
    }
}
