// One simulated peer: a model replica, a local view, a headless body and a bot.

use crate::domain::tuning::player::CharacterTuning;
use crate::domain::tuning::view::ViewTuning;
use crate::domain::tuning::world::SPAWN_POINT;
use crate::domain::{CharacterBody, ViewId};
use crate::frameworks::bot::Bot;
use crate::interface_adapters::bus::{decode_view_event, encode_view_event};
use crate::interface_adapters::physics::ArcadeBody;
use crate::interface_adapters::reflector::ReflectorInput;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    FrameStatus, LocalView, ModelEvent, Replica, ReplicaSnapshot, SessionError, Stamped,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PeerSetup {
    pub view_id: ViewId,
    pub username: Option<String>,
    pub seed: u64,
    pub bot_seed: u64,
    pub frame_interval: Duration,
    // The observed peer forwards its model events to the host's observers.
    pub observed: bool,
}

#[derive(Debug, Clone)]
pub struct PeerReport {
    pub view_id: ViewId,
    pub snapshot: ReplicaSnapshot,
    pub frames: u64,
    pub exited: bool,
}

/// Decodes one stamped payload and applies it; undecodable payloads still consume their stamp.
pub fn apply_stamped(replica: &mut Replica, stamped: Stamped<Arc<str>>) -> Result<(), SessionError> {
    let (seq, time) = (stamped.seq, stamped.time);
    match stamped.try_map(|text| decode_view_event(&text)) {
        Ok(decoded) => replica.apply(decoded),
        Err(e) => {
            warn!(seq, error = %e, "undecodable bus payload");
            replica.skip(seq, time)
        }
    }
}

struct Peer {
    setup: PeerSetup,
    replica: Replica,
    view: LocalView,
    body: ArcadeBody,
    state: AppState,
}

impl Peer {
    fn deliver(&mut self, now: Duration) {
        for event in self.replica.drain_events() {
            if let ModelEvent::PlatformsUpdated { platforms } = &event {
                self.body.set_moving_platforms(platforms);
            }
            self.view.on_model_event(&event, now);

            if self.setup.observed {
                let round = self.replica.model().round().clone();
                self.state.round_tx.send_if_modified(|current| {
                    if *current == round {
                        false
                    } else {
                        *current = round;
                        true
                    }
                });
                // No observers subscribed is fine.
                let _ = self.state.observer_tx.send(event);
            }
        }
    }

    // Returns false once the reflector stops accepting input.
    async fn publish(&mut self, reflector_tx: &mpsc::Sender<ReflectorInput>) -> bool {
        for event in self.view.drain_outbound() {
            let text = match encode_view_event(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!(view_id = %self.setup.view_id, error = %e, "failed to encode view event");
                    continue;
                }
            };
            if reflector_tx
                .send(ReflectorInput::Publish(Arc::from(text)))
                .await
                .is_err()
            {
                return false;
            }
        }
        true
    }
}

pub async fn peer_task(
    setup: PeerSetup,
    mut stream_rx: broadcast::Receiver<Stamped<Arc<str>>>,
    state: AppState,
) -> PeerReport {
    let started = Instant::now();
    let view_id = setup.view_id.clone();
    let reflector_tx = state.reflector_tx.clone();

    let mut peer = Peer {
        replica: Replica::bootstrap(setup.seed, 0),
        view: LocalView::new(
            view_id.clone(),
            setup.username.clone(),
            CharacterTuning::default(),
            ViewTuning::default(),
            Duration::ZERO,
        ),
        body: ArcadeBody::new(SPAWN_POINT),
        state,
        setup,
    };
    peer.deliver(Duration::ZERO);

    let mut connected = reflector_tx
        .send(ReflectorInput::Connect(view_id.clone()))
        .await
        .is_ok();
    peer.view.start(&mut rand::rng());
    connected = connected && peer.publish(&reflector_tx).await;
    info!(%view_id, connected, "peer started");

    let mut bot = Bot::new(peer.setup.bot_seed);
    let mut frames = interval(peer.setup.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Duration::ZERO;
    let mut frame_count = 0u64;
    let mut exited = false;
    let mut warned = false;

    loop {
        tokio::select! {
            received = stream_rx.recv() => match received {
                Ok(stamped) => {
                    if let Err(e) = apply_stamped(&mut peer.replica, stamped) {
                        error!(%view_id, error = %e, "replica rejected stamp");
                    }
                    peer.deliver(started.elapsed());
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // A replica that missed stamps can no longer be trusted.
                    error!(%view_id, missed = n, "replica fell behind the reflector; leaving");
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(%view_id, "session stream closed");
                    break;
                }
            },
            _ = frames.tick(), if connected => {
                let now = started.elapsed();
                let dt = now.saturating_sub(last_frame);
                last_frame = now;

                let raw = bot.next_input(now, peer.body.position());
                let status = peer.view.frame(raw, now, dt, &mut peer.body);
                peer.body.integrate(dt);
                frame_count += 1;
                connected = peer.publish(&reflector_tx).await;

                match status {
                    FrameStatus::InactivityWarning if !warned => {
                        warned = true;
                        warn!(%view_id, "inactivity warning");
                    }
                    FrameStatus::Running => warned = false,
                    FrameStatus::Exited => {
                        exited = true;
                        connected = false;
                        let _ = reflector_tx.send(ReflectorInput::Disconnect(view_id.clone())).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!(%view_id, frames = frame_count, exited, "peer stopped");
    PeerReport {
        view_id,
        snapshot: peer.replica.snapshot(),
        frames: frame_count,
        exited,
    }
}
