pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod session;
pub mod transport;

pub use chat::{ChatCompletion, ChatMessage, ChatSession, NatsChatCompletion, SafetyRules};
pub use config::{CallConfig, ChatConfig, Config};
pub use error::CallError;
pub use http::{create_router, AppState};
pub use media::{MediaDeviceSource, MediaHandle, SyntheticMediaSource};
pub use session::{
    spawn, CallSession, RoomId, RoomSnapshot, RoomState, ScreenShareState, SessionConfig,
    SessionHandle,
};
pub use transport::{LocalNetwork, LocalTransport, PeerId, PeerTransport};
