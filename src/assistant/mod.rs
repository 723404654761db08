//! Quote assistant
//!
//! - prompt: system prompt built from the loaded tables
//! - client: OpenAI-compatible chat completion client
//! - conversation: per-session history with ask/retry/reset
//! - sessions: live conversations keyed by id

pub mod client;
pub mod conversation;
pub mod models;
pub mod prompt;
pub mod sessions;

pub use client::{ChatBackend, ChatClient};
pub use conversation::Conversation;
pub use models::{ChatMessage, Role};
pub use prompt::{build_system_prompt, PromptVariant};
pub use sessions::{SessionStore, SharedConversation};
