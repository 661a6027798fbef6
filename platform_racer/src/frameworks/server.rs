// Framework bootstrap for the session host runtime.

use crate::domain::RoundState;
use crate::frameworks::config::SessionSettings;
use crate::frameworks::peer::{PeerReport, PeerSetup, peer_task};
use crate::interface_adapters::bus::model_event_serializer;
use crate::interface_adapters::reflector::{ReflectorInput, reflector_task};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_view_id;
use crate::use_cases::{ModelEvent, Stamped};

use futures::future::join_all;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::task::JoinHandle;

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub peers: Vec<PeerReport>,
    // Every replica ended in the same state.
    pub consistent: bool,
    pub event_log: EventLog,
}

/// What the JSON event log saw of the observed replica.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub lines: u64,
    pub last: Option<Arc<str>>,
}

// Writes every serialized model event to the log until the serializer goes away.
// A lagging log resumes from the latest text instead of the missed ones.
fn spawn_event_log(
    mut bytes_rx: broadcast::Receiver<Arc<str>>,
    latest_rx: watch::Receiver<Arc<str>>,
) -> JoinHandle<EventLog> {
    tokio::spawn(async move {
        let mut log = EventLog::default();
        loop {
            let line = match bytes_rx.recv().await {
                Ok(line) => line,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event log lagged; resuming from latest");
                    latest_rx.borrow().clone()
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            tracing::debug!(event = %line, "model event");
            log.lines += 1;
            log.last = Some(line);
        }
        log
    })
}

fn spawn_round_watcher(mut round_rx: watch::Receiver<RoundState>) {
    tokio::spawn(async move {
        while round_rx.changed().await.is_ok() {
            let round = round_rx.borrow_and_update().clone();
            match round {
                RoundState::Over { winner_id } => tracing::info!(%winner_id, "round won"),
                RoundState::Playing => tracing::info!("round restarted"),
            }
        }
    });
}

pub async fn run(settings: SessionSettings) -> Result<SessionReport> {
    let shutdown = Arc::new(Notify::new());

    // reflector_tx/rx: every view publishes into the single reflector task.
    let (reflector_tx, reflector_rx) = mpsc::channel(settings.reflector_input_capacity);
    // stream_tx: reflector-ordered stamps, one receiver per replica.
    let (stream_tx, _) = broadcast::channel::<Stamped<Arc<str>>>(settings.stream_capacity);
    let state = build_state(&settings, reflector_tx);

    let event_log = spawn_event_log(
        state.observer_bytes_tx.subscribe(),
        state.observer_latest_tx.subscribe(),
    );
    tokio::spawn(model_event_serializer(
        state.observer_tx.subscribe(),
        state.observer_bytes_tx.clone(),
        state.observer_latest_tx.clone(),
    ));
    spawn_round_watcher(state.round_tx.subscribe());

    // Replicas subscribe before the reflector starts so none misses a stamp.
    let peers: Vec<_> = (0..settings.peers)
        .map(|index| {
            let setup = PeerSetup {
                view_id: next_view_id(),
                username: Some(format!("cat-{}", index + 1)),
                seed: settings.seed,
                bot_seed: settings.seed.wrapping_add(index as u64 + 1),
                frame_interval: settings.frame_interval,
                observed: index == 0,
            };
            tokio::spawn(peer_task(setup, stream_tx.subscribe(), state.clone()))
        })
        .collect();

    // The reflector owns the only stream sender; dropping it ends every peer.
    let reflector = tokio::spawn(reflector_task(
        reflector_rx,
        stream_tx,
        settings.heartbeat,
        shutdown.clone(),
    ));
    tracing::info!(
        peers = settings.peers,
        seed = settings.seed,
        duration_ms = settings.duration.as_millis(),
        "session started"
    );

    tokio::time::sleep(settings.duration).await;
    shutdown.notify_one();
    reflector.await.map_err(std::io::Error::other)?;

    let peers = join_all(peers)
        .await
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(std::io::Error::other)?;
    // Last sender handles go here; the serializer and then the log wind down.
    drop(state);
    let event_log = event_log.await.map_err(std::io::Error::other)?;

    let consistent = peers
        .windows(2)
        .all(|pair| pair[0].snapshot == pair[1].snapshot);
    if consistent {
        let players = peers.first().map_or(0, |p| p.snapshot.model.players().len());
        tracing::info!(
            players,
            logged_events = event_log.lines,
            "session finished; replicas consistent"
        );
    } else {
        tracing::error!("session finished; replicas diverged");
    }

    Ok(SessionReport {
        peers,
        consistent,
        event_log,
    })
}

pub async fn run_with_config() -> Result<SessionReport> {
    init_runtime();
    let settings = SessionSettings::from_env();
    tracing::debug!(?settings, "session configured");
    run(settings).await
}

fn build_state(
    settings: &SessionSettings,
    reflector_tx: mpsc::Sender<ReflectorInput>,
) -> AppState {
    // observer_tx: model events from the observed replica.
    let (observer_tx, _) = broadcast::channel::<ModelEvent>(settings.observer_capacity);
    // observer_bytes_tx: serialized model events shared across observers.
    let (observer_bytes_tx, _) = broadcast::channel::<Arc<str>>(settings.observer_capacity);
    let (observer_latest_tx, _) = watch::channel::<Arc<str>>(Arc::from(""));
    let (round_tx, _) = watch::channel(RoundState::Playing);

    AppState {
        reflector_tx,
        observer_tx,
        observer_bytes_tx,
        observer_latest_tx,
        round_tx,
    }
}
