//! AI support chat
//!
//! The completion itself is an external service; this module keeps the
//! conversation history and replaces generated replies with fixed support
//! resources when the user's message matches a safety keyword.

pub mod message;
pub mod nats;
pub mod rules;
pub mod session;

pub use message::{ChatMessage, ChatReply, ChatRequest, Role};
pub use nats::NatsChatCompletion;
pub use rules::{SafetyRule, SafetyRules};
pub use session::{ChatCompletion, ChatSession, RESET_GREETING, SUPPORT_GREETING};
