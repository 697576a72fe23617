use crate::chat::{ChatCompletion, ChatSession};
use crate::config::CallConfig;
use crate::media::MediaDeviceSource;
use crate::session::SessionHandle;
use crate::transport::{LocalNetwork, PeerId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Running call sessions (peer_id → session)
    pub sessions: Arc<RwLock<HashMap<PeerId, SessionHandle>>>,

    /// Support conversations (conversation_id → chat)
    pub chats: Arc<RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>>,

    /// In-process network every hosted session registers on
    pub network: LocalNetwork,

    /// Device source handed to new sessions
    pub media: Arc<dyn MediaDeviceSource>,

    pub call: Arc<CallConfig>,

    /// Chat backend, `None` when chat is disabled
    pub completion: Option<Arc<dyn ChatCompletion>>,
}

impl AppState {
    pub fn new(call: CallConfig, media: Arc<dyn MediaDeviceSource>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            chats: Arc::new(RwLock::new(HashMap::new())),
            network: LocalNetwork::new(),
            media,
            call: Arc::new(call),
            completion: None,
        }
    }

    pub fn with_chat(mut self, completion: Arc<dyn ChatCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }
}
