// Use cases layer: the replicated model, the session it runs in, and the local view.

pub mod input;
pub mod model;
pub mod session;
pub mod types;
pub mod view;

pub use model::GameModel;
pub use session::{Envelope, Reflector, Replica, ReplicaSnapshot, SessionError, Stamped};
pub use types::{
    LogicalTime, ModelCall, ModelContext, ModelEvent, PlayerMap, PlayerMove, ViewEvent,
};
pub use view::{FrameStatus, LocalView, RoundGate};
