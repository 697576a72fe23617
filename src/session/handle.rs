use super::location::Clipboard;
use super::room::{RoomId, ScreenShareState};
use super::session::CallSession;
use super::snapshot::RoomSnapshot;
use crate::error::CallError;
use crate::transport::PeerId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Requests handled by a running session
enum Command {
    CreateRoom {
        room: Option<RoomId>,
        reply: oneshot::Sender<Result<RoomId, CallError>>,
    },
    JoinRoom {
        room: String,
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    LeaveRoom {
        reply: oneshot::Sender<()>,
    },
    ToggleMute {
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleVideo {
        reply: oneshot::Sender<Option<bool>>,
    },
    ToggleScreenShare {
        reply: oneshot::Sender<Result<ScreenShareState, CallError>>,
    },
    CopyLink {
        reply: oneshot::Sender<Result<String, CallError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown,
}

/// Cloneable front end of a session running on its own task
///
/// The task owns the `CallSession` and interleaves commands from handles with
/// queued transport events, one at a time.
#[derive(Clone)]
pub struct SessionHandle {
    identity: Option<PeerId>,
    commands: mpsc::Sender<Command>,
}

/// Move `session` onto a task and return a handle to it
pub fn spawn(session: CallSession, clipboard: Arc<dyn Clipboard>) -> (SessionHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(32);
    let handle = SessionHandle {
        identity: session.identity(),
        commands: commands_tx,
    };
    let task = tokio::spawn(run(session, commands_rx, clipboard));
    (handle, task)
}

async fn run(
    mut session: CallSession,
    mut commands: mpsc::Receiver<Command>,
    clipboard: Arc<dyn Clipboard>,
) {
    info!("Session task started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if !apply(&mut session, command, clipboard.as_ref()).await {
                    break;
                }
            }
            Some(event) = session.next_event() => {
                session.dispatch(event).await;
            }
        }
    }

    session.close();
    info!("Session task stopped");
}

/// Returns false on shutdown
async fn apply(session: &mut CallSession, command: Command, clipboard: &dyn Clipboard) -> bool {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
        Command::CreateRoom { room, reply } => {
            let _ = reply.send(session.create_room(room).await);
        }
        Command::JoinRoom { room, reply } => {
            let _ = reply.send(session.join_room(&room).await);
        }
        Command::LeaveRoom { reply } => {
            session.leave_room();
            let _ = reply.send(());
        }
        Command::ToggleMute { reply } => {
            let _ = reply.send(session.toggle_mute());
        }
        Command::ToggleVideo { reply } => {
            let _ = reply.send(session.toggle_video());
        }
        Command::ToggleScreenShare { reply } => {
            let _ = reply.send(session.toggle_screen_share().await);
        }
        Command::CopyLink { reply } => {
            let _ = reply.send(session.copy_room_link(clipboard));
        }
        Command::Snapshot { reply } => {
            // Let pending callbacks land first so the view is current
            session.process_pending().await;
            let _ = reply.send(session.snapshot());
        }
        Command::Shutdown => {
            debug!("Session shutdown requested");
            return false;
        }
    }
    true
}

impl SessionHandle {
    pub fn identity(&self) -> Option<&PeerId> {
        self.identity.as_ref()
    }

    pub async fn create_room(&self, room: Option<RoomId>) -> Result<RoomId, CallError> {
        self.request(|reply| Command::CreateRoom { room, reply })
            .await?
    }

    pub async fn join_room(&self, room: impl Into<String>) -> Result<(), CallError> {
        let room = room.into();
        self.request(|reply| Command::JoinRoom { room, reply })
            .await?
    }

    pub async fn leave_room(&self) -> Result<(), CallError> {
        self.request(|reply| Command::LeaveRoom { reply }).await
    }

    pub async fn toggle_mute(&self) -> Result<Option<bool>, CallError> {
        self.request(|reply| Command::ToggleMute { reply }).await
    }

    pub async fn toggle_video(&self) -> Result<Option<bool>, CallError> {
        self.request(|reply| Command::ToggleVideo { reply }).await
    }

    pub async fn toggle_screen_share(&self) -> Result<ScreenShareState, CallError> {
        self.request(|reply| Command::ToggleScreenShare { reply })
            .await?
    }

    pub async fn copy_room_link(&self) -> Result<String, CallError> {
        self.request(|reply| Command::CopyLink { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, CallError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Leave the room and stop the session task
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| CallError::SessionClosed)?;
        reply_rx.await.map_err(|_| CallError::SessionClosed)
    }
}
