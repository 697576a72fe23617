//! Peer transport abstraction
//!
//! The call session never talks to a concrete transport. It places calls
//! through `PeerTransport` and learns about everything else through events
//! pushed into its queue by `EventSink` / `TransportSink`.

pub mod event;
pub mod local;
pub mod peer;

pub use event::{ConnectionEvent, EventSink, LinkId, SessionEvent, TransportSink};
pub use local::{LocalConnection, LocalNetwork, LocalTransport};
pub use peer::{CallPurpose, Connection, PeerId, PeerTransport, TransportError};
