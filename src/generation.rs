//! Deceptive response generation core module.
//!
//! Replies shown to the remote party come from a text-generation
//! collaborator behind [`provider::ResponseGenerator`]. Conversation
//! history is bounded per session by a token budget, and every failure
//! degrades to a fixed acknowledgement so an attacker never sees an
//! internal error.

pub mod dispatch;
pub mod history;
pub mod provider;

pub use dispatch::{ResponseDispatch, FALLBACK_REPLY, FALLBACK_WELCOME};
pub use history::{ChatMessage, ConversationStore, Role};
pub use provider::{OpenAiGenerator, ResponseGenerator};
