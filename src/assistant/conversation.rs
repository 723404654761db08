use serde::Serialize;

use super::client::ChatBackend;
use super::models::{ChatMessage, Role};
use crate::error::AppError;

/// Append-only chat history of one user session.
///
/// The system turn is not stored; it is rebuilt from the current tables on
/// every call so answers always reflect the latest snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True when the last user turn has not been answered yet
    pub fn has_pending_turn(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|message| message.role == Role::User)
    }

    /// Add a user turn and request the answer.
    ///
    /// On failure the user turn stays in the history so it can be retried.
    pub async fn ask(
        &mut self,
        backend: &dyn ChatBackend,
        system_prompt: &str,
        content: &str,
    ) -> Result<String, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        self.messages.push(ChatMessage::user(content));
        self.answer(backend, system_prompt).await
    }

    /// Resend the pending user turn without duplicating it
    pub async fn retry(
        &mut self,
        backend: &dyn ChatBackend,
        system_prompt: &str,
    ) -> Result<String, AppError> {
        if !self.has_pending_turn() {
            return Err(AppError::BadRequest("No unanswered message to retry".to_string()));
        }

        self.answer(backend, system_prompt).await
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    async fn answer(&mut self, backend: &dyn ChatBackend, system_prompt: &str) -> Result<String, AppError> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(self.messages.iter().cloned());

        let reply = backend.complete(messages).await?;
        self.messages.push(ChatMessage::assistant(reply.clone()));

        Ok(reply)
    }
}
