// Shared harness: one reflector feeding several replicas through the JSON bus.
#![allow(dead_code)]

use platform_racer::SessionSettings;
use platform_racer::interface_adapters::bus::encode_view_event;
use platform_racer::frameworks::peer::apply_stamped;
use platform_racer::use_cases::{LogicalTime, ModelEvent, Reflector, Replica, ViewEvent};
use std::{
    // `OnceLock` installs the test subscriber only once per binary.
    sync::{Arc, OnceLock},
    time::Duration,
};

static TRACING: OnceLock<()> = OnceLock::new();

// Route library logs through the test writer so failures show them.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub struct Session {
    pub reflector: Reflector,
    pub replicas: Vec<Replica>,
}

impl Session {
    pub fn new(seed: u64, replicas: usize) -> Self {
        init_tracing();
        Self {
            reflector: Reflector::new(),
            replicas: (0..replicas).map(|_| Replica::bootstrap(seed, 0)).collect(),
        }
    }

    pub fn at(&mut self, time: LogicalTime) -> &mut Self {
        self.reflector.advance_to(time);
        self
    }

    /// Encodes the event for the wire, stamps it and delivers it to every replica.
    pub fn send(&mut self, event: ViewEvent) -> &mut Self {
        let text = encode_view_event(&event).expect("encodable view event");
        self.send_raw(&text)
    }

    pub fn send_raw(&mut self, text: &str) -> &mut Self {
        let stamped = self.reflector.stamp(Arc::<str>::from(text));
        for replica in &mut self.replicas {
            apply_stamped(replica, stamped.clone()).expect("in-order stamp");
        }
        self
    }

    pub fn heartbeat(&mut self) -> &mut Self {
        let stamped = self.reflector.heartbeat::<Arc<str>>();
        for replica in &mut self.replicas {
            apply_stamped(replica, stamped.clone()).expect("in-order heartbeat");
        }
        self
    }

    pub fn drain(&mut self, replica: usize) -> Vec<ModelEvent> {
        self.replicas[replica].drain_events()
    }

    pub fn assert_converged(&self) {
        let first = self.replicas[0].snapshot();
        for (index, replica) in self.replicas.iter().enumerate().skip(1) {
            assert_eq!(replica.snapshot(), first, "replica {index} diverged");
        }
    }
}

pub fn quick_settings(peers: usize, duration: Duration) -> SessionSettings {
    SessionSettings {
        seed: 7,
        peers,
        duration,
        frame_interval: Duration::from_millis(16),
        heartbeat: Duration::from_millis(20),
        ..SessionSettings::default()
    }
}
