// Loopback replicated session: a stamping reflector and the replicas it feeds.

use super::model::GameModel;
use super::types::{LogicalTime, ModelCall, ModelContext, ModelEvent, ViewEvent};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope<T> {
    // Heartbeat: advances logical time only.
    Tick,
    Message(T),
}

/// A reflector-ordered item. `seq` is strictly increasing across the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub seq: u64,
    pub time: LogicalTime,
    pub envelope: Envelope<T>,
}

impl<T> Stamped<T> {
    /// Converts the payload, keeping the stamp.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Stamped<U>, E> {
        let envelope = match self.envelope {
            Envelope::Tick => Envelope::Tick,
            Envelope::Message(payload) => Envelope::Message(f(payload)?),
        };
        Ok(Stamped {
            seq: self.seq,
            time: self.time,
            envelope,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("stamp {got} is not after the last applied stamp {last}")]
    OutOfOrder { last: u64, got: u64 },
    #[error("logical time went backwards from {now} to {got}")]
    TimeWentBackwards { now: LogicalTime, got: LogicalTime },
}

/// Serializing relay that imposes one total order on everything it forwards.
#[derive(Debug, Default)]
pub struct Reflector {
    next_seq: u64,
    now: LogicalTime,
}

impl Reflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> LogicalTime {
        self.now
    }

    /// Moves the shared clock forward. Earlier times are ignored.
    pub fn advance_to(&mut self, now: LogicalTime) {
        self.now = self.now.max(now);
    }

    pub fn stamp<T>(&mut self, payload: T) -> Stamped<T> {
        self.next(Envelope::Message(payload))
    }

    pub fn heartbeat<T>(&mut self) -> Stamped<T> {
        self.next(Envelope::Tick)
    }

    fn next<T>(&mut self, envelope: Envelope<T>) -> Stamped<T> {
        self.next_seq += 1;
        Stamped {
            seq: self.next_seq,
            time: self.now,
            envelope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PendingCall {
    pub due: LogicalTime,
    // Tie-breaker: calls due at the same instant fire in scheduling order.
    pub order: u64,
    pub call: ModelCall,
}

/// The replica's side of the session: logical clock, deferred calls, outbox.
#[derive(Debug, Default)]
struct ReplicaContext {
    now: LogicalTime,
    pending: BinaryHeap<Reverse<PendingCall>>,
    next_order: u64,
    outbox: Vec<ModelEvent>,
}

impl ModelContext for ReplicaContext {
    fn now(&self) -> LogicalTime {
        self.now
    }

    fn future(&mut self, delay_ms: u64, call: ModelCall) {
        self.next_order += 1;
        self.pending.push(Reverse(PendingCall {
            due: self.now + delay_ms,
            order: self.next_order,
            call,
        }));
    }

    fn publish(&mut self, event: ModelEvent) {
        self.outbox.push(event);
    }
}

/// Everything a late joiner needs to continue the session from a given stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSnapshot {
    pub model: GameModel,
    pub now: LogicalTime,
    pub last_seq: u64,
    pub next_order: u64,
    pub pending: Vec<PendingCall>,
}

#[derive(Debug)]
pub struct Replica {
    model: GameModel,
    ctx: ReplicaContext,
    last_seq: u64,
}

impl Replica {
    /// Boots a fresh model at logical time `now`.
    pub fn bootstrap(seed: u64, now: LogicalTime) -> Self {
        let mut ctx = ReplicaContext {
            now,
            ..ReplicaContext::default()
        };
        let model = GameModel::init(seed, &mut ctx);
        Self {
            model,
            ctx,
            last_seq: 0,
        }
    }

    /// Resumes from a snapshot. Events published before the snapshot are not replayed.
    pub fn from_snapshot(snapshot: ReplicaSnapshot) -> Self {
        let ctx = ReplicaContext {
            now: snapshot.now,
            pending: snapshot.pending.into_iter().map(Reverse).collect(),
            next_order: snapshot.next_order,
            outbox: Vec::new(),
        };
        Self {
            model: snapshot.model,
            ctx,
            last_seq: snapshot.last_seq,
        }
    }

    pub fn snapshot(&self) -> ReplicaSnapshot {
        let mut pending: Vec<PendingCall> = self.ctx.pending.iter().map(|Reverse(p)| *p).collect();
        pending.sort_unstable();
        ReplicaSnapshot {
            model: self.model.clone(),
            now: self.ctx.now,
            last_seq: self.last_seq,
            next_order: self.ctx.next_order,
            pending,
        }
    }

    pub fn model(&self) -> &GameModel {
        &self.model
    }

    pub fn now(&self) -> LogicalTime {
        self.ctx.now
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Applies one stamped item: first the deferred calls due by its time, then the event.
    pub fn apply(&mut self, stamped: Stamped<ViewEvent>) -> Result<(), SessionError> {
        if stamped.seq <= self.last_seq {
            return Err(SessionError::OutOfOrder {
                last: self.last_seq,
                got: stamped.seq,
            });
        }
        self.advance_to(stamped.time)?;
        self.last_seq = stamped.seq;

        if let Envelope::Message(event) = stamped.envelope {
            trace!(seq = stamped.seq, time = stamped.time, ?event, "applying event");
            self.model.handle_event(event, &mut self.ctx);
        }
        Ok(())
    }

    /// Records a stamp whose payload could not be decoded: time still advances so
    /// this replica stays aligned with the ones that skipped the same bytes.
    pub fn skip(&mut self, seq: u64, time: LogicalTime) -> Result<(), SessionError> {
        if seq <= self.last_seq {
            return Err(SessionError::OutOfOrder {
                last: self.last_seq,
                got: seq,
            });
        }
        self.advance_to(time)?;
        self.last_seq = seq;
        warn!(seq, time, "skipped undecodable message");
        Ok(())
    }

    /// Fires every deferred call due at or before `time`, in (due, order) order.
    pub fn advance_to(&mut self, time: LogicalTime) -> Result<(), SessionError> {
        if time < self.ctx.now {
            return Err(SessionError::TimeWentBackwards {
                now: self.ctx.now,
                got: time,
            });
        }

        while let Some(Reverse(next)) = self.ctx.pending.peek().copied() {
            if next.due > time {
                break;
            }
            self.ctx.pending.pop();
            self.ctx.now = next.due;
            self.model.handle_call(next.call, &mut self.ctx);
        }
        self.ctx.now = time;
        Ok(())
    }

    /// Takes the events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.ctx.outbox)
    }
}
